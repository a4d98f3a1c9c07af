//! Robots.txt handling module
//!
//! Robots.txt is consulted for its `Crawl-delay` directive, which becomes the
//! per-host request spacing when no delay is configured explicitly.

mod parser;

pub use parser::ParsedRobots;

use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Longest `Crawl-delay` honored from robots.txt
pub const MAX_CRAWL_DELAY: Duration = Duration::from_secs(60);

/// Fetches robots.txt for the site hosting `base_url`
///
/// Failures (network errors, non-success status) are not fatal: they yield an
/// empty ParsedRobots.
///
/// # Arguments
///
/// * `client` - Shared HTTP client
/// * `base_url` - Any URL on the target site
pub async fn fetch_robots(client: &Client, base_url: &Url) -> ParsedRobots {
    let robots_url = match base_url.join("/robots.txt") {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("Cannot build robots.txt URL from {}: {}", base_url, e);
            return ParsedRobots::empty();
        }
    };

    let response = match client.get(robots_url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Error reading robots.txt crawl-delay: {}", e);
            return ParsedRobots::empty();
        }
    };

    if !response.status().is_success() {
        tracing::debug!("No robots.txt at {} ({})", robots_url, response.status());
        return ParsedRobots::empty();
    }

    match response.text().await {
        Ok(body) => ParsedRobots::from_content(&body),
        Err(e) => {
            tracing::warn!("Failed to read robots.txt body: {}", e);
            ParsedRobots::empty()
        }
    }
}

/// Determines the request spacing for a crawl
///
/// An explicit delay wins; otherwise the robots.txt `Crawl-delay` for
/// `agent`, then for `*`; otherwise zero.
pub async fn resolve_crawl_delay(
    client: &Client,
    base_url: &Url,
    agent: &str,
    configured: Option<Duration>,
) -> Duration {
    if let Some(delay) = configured {
        return delay;
    }

    let robots = fetch_robots(client, base_url).await;
    match robots.crawl_delay(agent) {
        Some(seconds) => {
            let delay = crawl_delay_from_seconds(seconds);
            tracing::info!("Using robots.txt crawl-delay of {:?}", delay);
            delay
        }
        None => Duration::ZERO,
    }
}

/// Converts a robots.txt `Crawl-delay` value, capped at [`MAX_CRAWL_DELAY`]
///
/// Negative or NaN values mean no delay.
pub fn crawl_delay_from_seconds(seconds: f64) -> Duration {
    match Duration::try_from_secs_f64(seconds) {
        Ok(delay) if delay <= MAX_CRAWL_DELAY => delay,
        Err(_) if seconds.is_nan() || seconds < 0.0 => Duration::ZERO,
        _ => {
            tracing::warn!(
                "robots.txt crawl-delay of {}s exceeds {:?}, capping",
                seconds,
                MAX_CRAWL_DELAY
            );
            MAX_CRAWL_DELAY
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_configured_delay_skips_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nCrawl-delay: 9"))
            .expect(0)
            .mount(&server)
            .await;

        let base = Url::parse(&server.uri()).unwrap();
        let delay = resolve_crawl_delay(
            &Client::new(),
            &base,
            "site-insights",
            Some(Duration::from_millis(20)),
        )
        .await;

        assert_eq!(delay, Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_delay_from_robots() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nCrawl-delay: 0.25"))
            .mount(&server)
            .await;

        let base = Url::parse(&server.uri()).unwrap();
        let delay = resolve_crawl_delay(&Client::new(), &base, "site-insights", None).await;

        assert_eq!(delay, Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_huge_robots_delay_is_capped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nCrawl-delay: 1e20"))
            .mount(&server)
            .await;

        let base = Url::parse(&server.uri()).unwrap();
        let delay = resolve_crawl_delay(&Client::new(), &base, "site-insights", None).await;

        assert_eq!(delay, MAX_CRAWL_DELAY);
    }

    #[test]
    fn test_crawl_delay_from_seconds() {
        assert_eq!(crawl_delay_from_seconds(1.5), Duration::from_millis(1500));
        assert_eq!(crawl_delay_from_seconds(60.0), MAX_CRAWL_DELAY);
        assert_eq!(crawl_delay_from_seconds(61.0), MAX_CRAWL_DELAY);
        assert_eq!(crawl_delay_from_seconds(1e19), MAX_CRAWL_DELAY);
        assert_eq!(crawl_delay_from_seconds(f64::INFINITY), MAX_CRAWL_DELAY);
        assert_eq!(crawl_delay_from_seconds(-2.0), Duration::ZERO);
        assert_eq!(crawl_delay_from_seconds(f64::NAN), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_missing_robots_means_no_delay() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let base = Url::parse(&server.uri()).unwrap();
        let delay = resolve_crawl_delay(&Client::new(), &base, "site-insights", None).await;

        assert_eq!(delay, Duration::ZERO);
    }
}
