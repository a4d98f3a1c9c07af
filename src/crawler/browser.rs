//! Headless-browser fetcher
//!
//! Renders pages in Chromium so that content produced by JavaScript is part of
//! the extracted HTML. Only built with the `browser` feature.

use crate::crawler::fetcher::{FetchError, FetchedPage, PageFetcher};
use crate::crawler::throttle::HostThrottle;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Fetches pages by loading them in a shared headless Chromium instance
///
/// Each fetch opens its own tab and closes it afterwards. Requests share the
/// same per-host throttle as the HTTP fetcher. A navigation that does not
/// finish within the timeout is reported as transient, so the URL stays
/// pending.
pub struct BrowserFetcher {
    browser: Browser,
    handler: JoinHandle<()>,
    throttle: Arc<HostThrottle>,
    timeout: Duration,
}

impl BrowserFetcher {
    /// Starts Chromium and its CDP event loop
    pub async fn launch(throttle: Arc<HostThrottle>, timeout: Duration) -> Result<Self, FetchError> {
        let config = BrowserConfig::builder()
            .request_timeout(timeout)
            .build()
            .map_err(FetchError::Network)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| FetchError::Network(format!("failed to launch browser: {}", e)))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser event loop stopped: {}", e);
                    break;
                }
            }
        });

        tracing::info!("Launched headless browser");
        Ok(Self {
            browser,
            handler,
            throttle,
            timeout,
        })
    }

    async fn render(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let page = self
            .browser
            .new_page(url.as_str())
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let rendered = async {
            page.wait_for_navigation().await?;
            let body = page.content().await?;
            let final_url = page.url().await?;
            Ok::<_, chromiumoxide::error::CdpError>((body, final_url))
        }
        .await;

        if let Err(e) = page.close().await {
            tracing::debug!("Failed to close tab for {}: {}", url, e);
        }

        let (body, final_url) = rendered.map_err(|e| FetchError::Network(e.to_string()))?;
        let final_url = final_url
            .and_then(|u| Url::parse(&u).ok())
            .unwrap_or_else(|| url.clone());

        Ok(FetchedPage {
            final_url,
            status_code: 200,
            body,
        })
    }
}

impl PageFetcher for BrowserFetcher {
    async fn fetch(&self, url: &Url, cancel: &CancellationToken) -> Result<FetchedPage, FetchError> {
        let host = url.host_str().unwrap_or_default().to_string();
        if !self.throttle.acquire(&host, cancel).await {
            return Err(FetchError::Cancelled);
        }

        tokio::select! {
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            rendered = tokio::time::timeout(self.timeout, self.render(url)) => match rendered {
                Ok(result) => result,
                Err(_) => Err(FetchError::RetriesExhausted {
                    attempts: 1,
                    last_error: format!("navigation timed out after {:?}", self.timeout),
                }),
            },
        }
    }
}

impl Drop for BrowserFetcher {
    fn drop(&mut self) {
        self.handler.abort();
    }
}
