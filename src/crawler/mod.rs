//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with per-host throttling and retry logic
//! - Sitemap seeding
//! - HTML content extraction and text tokenization
//! - Overall crawl orchestration

#[cfg(feature = "browser")]
mod browser;
mod coordinator;
mod extractor;
mod fetcher;
mod run;
mod sitemap;
mod text;
mod throttle;

#[cfg(feature = "browser")]
pub use browser::BrowserFetcher;
pub use coordinator::{run_crawl, CrawlSettings, Orchestrator, PageError};
pub use extractor::{content_hash, extract_page, Heading, ImageInfo, PageResult, NO_TITLE};
pub use fetcher::{
    build_http_client, is_retryable_status, FetchBackend, FetchError, FetchedPage, HttpFetcher,
    PageFetcher, RetryPolicy,
};
pub use run::{CrawlRun, PageFailure};
pub use sitemap::{
    fetch_sitemap, normalize_sitemap_urls, parse_sitemap, seed_from_sitemap, SitemapError, SITEMAP_NAMESPACE,
};
pub use text::{extract_visible_text, stopwords, tokenize, top_words, word_frequency};
pub use throttle::HostThrottle;
