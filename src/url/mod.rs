//! URL handling module for Site-Insights
//!
//! This module provides domain extraction, link resolution and the slug rules
//! that name per-page artifacts and project folders.

mod domain;
mod normalize;
mod slug;

// Re-export main functions
pub use domain::{extract_domain, host_domain, is_same_domain};
pub use normalize::{parse_base_url, resolve_link};
pub use slug::{slug_for_url, slugify};

/// Which side of the crawl boundary a link falls on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkScope {
    /// Same domain as the crawl target
    Internal,
    /// Any other host
    External,
}

impl LinkScope {
    /// Classifies an absolute URL relative to the crawl domain
    ///
    /// # Examples
    ///
    /// ```
    /// use site_insights::url::LinkScope;
    /// use url::Url;
    ///
    /// let url = Url::parse("https://www.example.com/about").unwrap();
    /// assert_eq!(LinkScope::classify(&url, "example.com"), LinkScope::Internal);
    ///
    /// let url = Url::parse("https://other.org/").unwrap();
    /// assert_eq!(LinkScope::classify(&url, "example.com"), LinkScope::External);
    /// ```
    pub fn classify(url: &::url::Url, domain: &str) -> Self {
        if is_same_domain(url, domain) {
            Self::Internal
        } else {
            Self::External
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, Self::External)
    }
}
