//! Run summary
//!
//! A [`CrawlRun`] collects everything one orchestrator pass produced: the
//! pages that succeeded, the failures, and the corpus-wide aggregates fed to
//! the exporters.

use crate::crawler::coordinator::{CrawlSettings, PageError};
use crate::crawler::PageResult;
use std::collections::BTreeSet;
use std::time::Duration;

/// A URL that did not produce artifacts in this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFailure {
    pub url: String,
    pub reason: String,
    /// True if the URL was marked Failed; false if it stays Pending
    pub permanent: bool,
}

/// Outcome of one crawl pass
#[derive(Debug, Clone)]
pub struct CrawlRun {
    pub domain: String,
    pub base_url: String,
    pub max_pages: usize,
    pub workers: usize,
    pub crawl_delay: Duration,

    /// Visible text of every successful page, newline separated
    pub corpus: String,

    /// External links across every successful page
    pub external_links: BTreeSet<String>,

    /// Successful pages in completion order
    pub pages: Vec<PageResult>,

    pub failures: Vec<PageFailure>,

    /// Pages fetched, extracted and exported
    pub pages_processed: usize,

    /// Pages that failed, permanently or transiently
    pub pages_failed: usize,

    /// Whether dispatch stopped early because of cancellation
    pub cancelled: bool,
}

impl CrawlRun {
    pub fn new(settings: &CrawlSettings) -> Self {
        Self {
            domain: settings.domain.clone(),
            base_url: settings.base_url.to_string(),
            max_pages: settings.max_pages,
            workers: settings.workers,
            crawl_delay: settings.crawl_delay,
            corpus: String::new(),
            external_links: BTreeSet::new(),
            pages: Vec::new(),
            failures: Vec::new(),
            pages_processed: 0,
            pages_failed: 0,
            cancelled: false,
        }
    }

    pub fn record_success(&mut self, page: PageResult) {
        if !self.corpus.is_empty() {
            self.corpus.push('\n');
        }
        self.corpus.push_str(&page.visible_text);
        self.external_links
            .extend(page.external_links.iter().cloned());
        self.pages_processed += 1;
        self.pages.push(page);
    }

    pub fn record_failure(&mut self, url: &str, error: &PageError) {
        self.pages_failed += 1;
        self.failures.push(PageFailure {
            url: url.to_string(),
            reason: error.to_string(),
            permanent: !error.is_transient(),
        });
    }

    /// URLs of every failure, in completion order
    pub fn failed_urls(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.url.as_str()).collect()
    }

    /// Same-domain links found on successful pages
    pub fn internal_links(&self) -> BTreeSet<&str> {
        self.pages
            .iter()
            .flat_map(|page| page.internal_links.iter().map(String::as_str))
            .collect()
    }

    pub fn log_summary(&self) {
        tracing::info!(
            "Crawl of {} finished: {} processed, {} failed{}",
            self.domain,
            self.pages_processed,
            self.pages_failed,
            if self.cancelled { " (cancelled)" } else { "" }
        );
        for failure in &self.failures {
            tracing::info!(
                "  {} {}: {}",
                if failure.permanent { "failed" } else { "pending" },
                failure.url,
                failure.reason
            );
        }
    }
}
