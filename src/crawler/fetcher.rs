//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for page content, including:
//! - Building the shared HTTP client with the crawler's user agent
//! - Per-host throttling before every attempt
//! - Retry with exponential backoff for transient failures
//! - Error classification (network, status, content type, exhausted retries)

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::crawler::throttle::HostThrottle;
use crate::ConfigError;
use reqwest::{Client, StatusCode};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

/// HTTP statuses worth retrying
const RETRYABLE_STATUSES: &[u16] = &[429, 500, 502, 503, 504];

/// Why a fetch did not produce a page
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Non-retryable transport failure (TLS, redirect loop, bad URL, ...)
    #[error("Network error: {0}")]
    Network(String),

    /// Non-retryable HTTP status (404, 403, ...)
    #[error("HTTP status {0}")]
    Status(u16),

    /// The response was not HTML
    #[error("Unexpected content type: {0}")]
    UnexpectedContent(String),

    /// Every attempt hit a retryable failure
    #[error("Gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    /// The run was cancelled while this fetch was waiting or in flight
    #[error("Cancelled")]
    Cancelled,
}

impl FetchError {
    /// Whether the URL should simply be tried again on a later run
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RetriesExhausted { .. } | Self::Cancelled)
    }
}

/// A successfully fetched HTML page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status_code: u16,
    /// Page body content
    pub body: String,
}

/// Something that can retrieve a page's HTML
///
/// [`HttpFetcher`] is the standard implementation. With the `browser` feature,
/// `BrowserFetcher` renders script-heavy sites in headless Chromium instead.
pub trait PageFetcher: Send + Sync + 'static {
    fn fetch(
        &self,
        url: &Url,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<FetchedPage, FetchError>> + Send;
}

/// Which [`PageFetcher`] serves a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchBackend {
    /// Plain HTTP requests through [`HttpFetcher`]
    Http,
    /// Pages rendered in headless Chromium
    #[cfg(feature = "browser")]
    Browser,
}

impl FetchBackend {
    /// Picks the backend for the `browser` setting
    ///
    /// Browser fetching is only available when built with the `browser`
    /// feature; asking for it otherwise is a configuration error.
    pub fn select(use_browser: bool) -> Result<Self, ConfigError> {
        if !use_browser {
            return Ok(Self::Http);
        }

        #[cfg(feature = "browser")]
        {
            Ok(Self::Browser)
        }

        #[cfg(not(feature = "browser"))]
        {
            Err(ConfigError::Validation(
                "browser fetching requires building with the `browser` feature".to_string(),
            ))
        }
    }
}

/// Retry schedule for transient failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Wait after the first failed attempt
    pub base_delay: Duration,
    /// Upper bound for any single wait
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.backoff_base_ms),
            max_delay: Duration::from_millis(config.backoff_max_ms),
        }
    }

    /// Wait before the attempt following `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(20);
        let delay = self.base_delay.saturating_mul(2u32.saturating_pow(exponent));
        delay.min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&CrawlerConfig::default())
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `timeout` - Per-request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use site_insights::config::UserAgentConfig;
/// use site_insights::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Outcome of a single attempt
enum Attempt {
    Done(Result<FetchedPage, FetchError>),
    Retry(String),
}

/// Fetches pages over HTTP with throttling and retries
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Arc<Client>,
    throttle: Arc<HostThrottle>,
    policy: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(client: Arc<Client>, throttle: Arc<HostThrottle>, policy: RetryPolicy) -> Self {
        Self {
            client,
            throttle,
            policy,
        }
    }

    pub fn client(&self) -> &Arc<Client> {
        &self.client
    }

    async fn attempt(&self, url: &Url, cancel: &CancellationToken) -> Attempt {
        let host = url.host_str().unwrap_or_default().to_string();
        if !self.throttle.acquire(&host, cancel).await {
            return Attempt::Done(Err(FetchError::Cancelled));
        }

        let response = tokio::select! {
            _ = cancel.cancelled() => return Attempt::Done(Err(FetchError::Cancelled)),
            response = self.client.get(url.clone()).send() => response,
        };

        let response = match response {
            Ok(response) => response,
            Err(e) => return classify_transport_error(e),
        };

        let status = response.status();
        if RETRYABLE_STATUSES.contains(&status.as_u16()) {
            return Attempt::Retry(format!("HTTP status {}", status.as_u16()));
        }
        if !status.is_success() {
            return Attempt::Done(Err(FetchError::Status(status.as_u16())));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();
        if !is_html_content_type(&content_type) {
            return Attempt::Done(Err(FetchError::UnexpectedContent(content_type)));
        }

        let final_url = response.url().clone();
        let body = tokio::select! {
            _ = cancel.cancelled() => return Attempt::Done(Err(FetchError::Cancelled)),
            body = response.text() => body,
        };

        match body {
            Ok(body) => Attempt::Done(Ok(FetchedPage {
                final_url,
                status_code: status.as_u16(),
                body,
            })),
            Err(e) => classify_transport_error(e),
        }
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, cancel: &CancellationToken) -> Result<FetchedPage, FetchError> {
        let mut attempt = 1;
        loop {
            let last_error = match self.attempt(url, cancel).await {
                Attempt::Done(result) => return result,
                Attempt::Retry(reason) => reason,
            };

            if attempt >= self.policy.max_attempts {
                return Err(FetchError::RetriesExhausted {
                    attempts: attempt,
                    last_error,
                });
            }

            let wait = self.policy.backoff(attempt);
            tracing::debug!(
                "Attempt {}/{} for {} failed ({}), retrying in {:?}",
                attempt,
                self.policy.max_attempts,
                url,
                last_error,
                wait
            );

            tokio::select! {
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                _ = tokio::time::sleep(wait) => {}
            }
            attempt += 1;
        }
    }
}

fn classify_transport_error(e: reqwest::Error) -> Attempt {
    if e.is_timeout() || e.is_connect() {
        Attempt::Retry(e.to_string())
    } else {
        Attempt::Done(Err(FetchError::Network(e.to_string())))
    }
}

/// Accepts HTML and XHTML; a missing header is given the benefit of the doubt
fn is_html_content_type(content_type: &str) -> bool {
    content_type.is_empty()
        || content_type.contains("text/html")
        || content_type.contains("application/xhtml+xml")
}

/// Returns true for statuses the fetcher retries
pub fn is_retryable_status(status: StatusCode) -> bool {
    RETRYABLE_STATUSES.contains(&status.as_u16())
}
