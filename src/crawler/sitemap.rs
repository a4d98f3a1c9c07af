//! Sitemap seeding
//!
//! URLs listed in `<base>/sitemap.xml` are appended to the ledger as pending.
//! Any problem with the sitemap leaves the ledger unchanged.

use crate::ledger::Ledger;
use crate::url::{host_domain, is_same_domain, resolve_link};
use std::collections::HashSet;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use reqwest::Client;
use thiserror::Error;
use url::Url;

/// XML namespace of the sitemap protocol
pub const SITEMAP_NAMESPACE: &[u8] = b"http://www.sitemaps.org/schemas/sitemap/0.9";

/// Why a sitemap could not be used
#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("Failed to fetch sitemap: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Sitemap returned HTTP status {0}")]
    Status(u16),

    #[error("Malformed sitemap XML: {0}")]
    Xml(String),
}

/// Extracts page URLs from sitemap XML
///
/// Only `<loc>` elements of `<url>` entries in the sitemap namespace are read;
/// the namespace may be bound as default or to a prefix. Malformed XML fails as
/// a whole so that a truncated sitemap adds nothing.
///
/// # Examples
///
/// ```
/// use site_insights::crawler::parse_sitemap;
///
/// let xml = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
///   <url><loc>https://example.com/a</loc></url>
/// </urlset>"#;
/// assert_eq!(parse_sitemap(xml).unwrap(), vec!["https://example.com/a"]);
/// ```
pub fn parse_sitemap(xml: &str) -> Result<Vec<String>, SitemapError> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut urls = Vec::new();
    let mut in_url = false;
    let mut in_loc = false;
    let mut current = String::new();

    loop {
        let (ns, event) = reader
            .read_resolved_event()
            .map_err(|e| SitemapError::Xml(e.to_string()))?;

        let in_sitemap_ns = matches!(ns, ResolveResult::Bound(Namespace(n)) if n == SITEMAP_NAMESPACE);

        match event {
            Event::Start(ref e) if in_sitemap_ns => match e.local_name().as_ref() {
                b"url" => in_url = true,
                b"loc" if in_url => {
                    in_loc = true;
                    current.clear();
                }
                _ => {}
            },
            Event::Text(ref e) if in_loc => {
                let text = e.unescape().map_err(|e| SitemapError::Xml(e.to_string()))?;
                current.push_str(&text);
            }
            Event::CData(ref e) if in_loc => {
                current.push_str(&String::from_utf8_lossy(e));
            }
            Event::End(ref e) if in_sitemap_ns => match e.local_name().as_ref() {
                b"loc" if in_loc => {
                    in_loc = false;
                    let loc = current.trim();
                    if !loc.is_empty() {
                        urls.push(loc.to_string());
                    }
                }
                b"url" => in_url = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(urls)
}

/// Downloads and parses `<base>/sitemap.xml`
pub async fn fetch_sitemap(client: &Client, base_url: &Url) -> Result<Vec<String>, SitemapError> {
    let sitemap_url = base_url
        .join("/sitemap.xml")
        .map_err(|e| SitemapError::Xml(e.to_string()))?;

    let response = client.get(sitemap_url).send().await?;
    if response.status().as_u16() != 200 {
        return Err(SitemapError::Status(response.status().as_u16()));
    }

    let body = response.text().await?;
    parse_sitemap(&body)
}

/// Brings sitemap locations into the ledger's URL form
///
/// Each loc is normalized like a discovered link (fragment and tracking
/// parameters removed, `https://site.com` becomes `https://site.com/`).
/// Locs that are not absolute URLs or point outside the crawl domain are
/// dropped, as are repeats.
pub fn normalize_sitemap_urls(locs: &[String], base_url: &Url) -> Vec<String> {
    let Some(domain) = host_domain(base_url) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    locs.iter()
        .filter_map(|loc| {
            let url = Url::parse(loc.trim())
                .ok()
                .and_then(|absolute| resolve_link(absolute.as_str(), base_url));
            match url {
                Some(url) if is_same_domain(&url, &domain) => Some(url),
                _ => {
                    tracing::debug!("Skipping sitemap entry {}", loc);
                    None
                }
            }
        })
        .map(String::from)
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Appends sitemap URLs not already in the ledger as pending rows
///
/// Existing rows keep their status. Failures are logged and add nothing.
///
/// # Returns
///
/// The number of rows added
pub async fn seed_from_sitemap(client: &Client, base_url: &Url, ledger: &mut Ledger) -> usize {
    match fetch_sitemap(client, base_url).await {
        Ok(locs) => {
            let urls = normalize_sitemap_urls(&locs, base_url);
            let added = ledger.merge_discovered(&urls);
            if added > 0 {
                tracing::info!("Added {} new URLs from sitemap", added);
            } else {
                tracing::debug!("Sitemap listed {} URLs, none new", urls.len());
            }
            added
        }
        Err(e) => {
            tracing::warn!("Sitemap unavailable for {}: {}", base_url, e);
            0
        }
    }
}
