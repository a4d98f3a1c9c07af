//! HTML content extraction
//!
//! This module turns raw HTML into a [`PageResult`]:
//! - Title and meta description
//! - Headings (h1-h6, document order)
//! - Images with their ALT text
//! - Internal and external links (absolute URLs)
//! - Visible text, its word frequencies and a SHA-256 fingerprint
//!
//! Extraction is pure: no I/O, no shared state.

use crate::config::Language;
use crate::crawler::text::{extract_visible_text, tokenize, word_frequency};
use crate::url::{resolve_link, slug_for_url, LinkScope};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use url::Url;

/// Title used when a page has no `<title>`
pub const NO_TITLE: &str = "(no title)";

/// A heading element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// 1 for `<h1>` through 6 for `<h6>`
    pub level: u8,
    pub text: String,
}

impl Heading {
    /// Renders as a Markdown heading marker, e.g. `## Pricing`
    pub fn to_markdown(&self) -> String {
        format!("{} {}", "#".repeat(self.level as usize), self.text)
    }
}

/// An `<img>` element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub src: String,
    pub alt: String,
}

/// Structured content of one fetched page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    pub url: String,
    pub slug: String,
    pub title: String,
    #[serde(rename = "meta_description")]
    pub description: String,
    pub headings: Vec<Heading>,
    pub word_count: usize,
    pub word_frequency: BTreeMap<String, u64>,
    pub images: Vec<ImageInfo>,
    pub external_links: BTreeSet<String>,
    pub internal_links: BTreeSet<String>,
    #[serde(rename = "page_hash")]
    pub content_hash: String,
    #[serde(rename = "md_filename")]
    pub markdown_filename: String,
    pub json_filename: String,
    #[serde(skip)]
    pub visible_text: String,
}

/// Extracts structured content from a page
///
/// # Arguments
///
/// * `html` - The raw HTML body
/// * `url` - The page URL, used to resolve relative links and derive the slug
/// * `domain` - The crawl domain; links to other hosts are external
/// * `language` - Stopword language for word frequencies
pub fn extract_page(html: &str, url: &Url, domain: &str, language: Language) -> PageResult {
    let document = Html::parse_document(html);

    let slug = slug_for_url(url.as_str());
    let (internal_links, external_links) = extract_links(&document, url, domain);

    let visible_text = extract_visible_text(&document);
    let tokens = tokenize(&visible_text, language);
    let word_count = tokens.len();

    PageResult {
        url: url.to_string(),
        markdown_filename: format!("{}.md", slug),
        json_filename: format!("{}.json", slug),
        slug,
        title: extract_title(&document).unwrap_or_else(|| NO_TITLE.to_string()),
        description: extract_description(&document),
        headings: extract_headings(&document),
        word_count,
        word_frequency: word_frequency(tokens),
        images: extract_images(&document),
        external_links,
        internal_links,
        content_hash: content_hash(&visible_text),
        visible_text,
    }
}

/// Hex-encoded SHA-256 of the visible text
pub fn content_hash(visible_text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(visible_text.as_bytes());
    hex::encode(hasher.finalize())
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| normalize_whitespace(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

fn extract_description(document: &Html) -> String {
    let Ok(selector) = Selector::parse("meta[name='description']") else {
        return String::new();
    };

    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("content"))
        .map(|content| content.trim().to_string())
        .unwrap_or_default()
}

fn extract_headings(document: &Html) -> Vec<Heading> {
    let Ok(selector) = Selector::parse("h1, h2, h3, h4, h5, h6") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| {
            let level = element.value().name().strip_prefix('h')?.parse::<u8>().ok()?;
            Some(Heading {
                level,
                text: normalize_whitespace(&element.text().collect::<String>()),
            })
        })
        .collect()
}

fn extract_images(document: &Html) -> Vec<ImageInfo> {
    let Ok(selector) = Selector::parse("img") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .map(|element| ImageInfo {
            src: element.value().attr("src").unwrap_or_default().to_string(),
            alt: element.value().attr("alt").unwrap_or_default().trim().to_string(),
        })
        .collect()
}

/// Splits `<a href>` targets into internal and external sets
fn extract_links(document: &Html, base_url: &Url, domain: &str) -> (BTreeSet<String>, BTreeSet<String>) {
    let mut internal = BTreeSet::new();
    let mut external = BTreeSet::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            // Skip if it has the download attribute
            if element.value().attr("download").is_some() {
                continue;
            }

            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let Some(absolute_url) = resolve_link(href, base_url) else {
                continue;
            };

            match LinkScope::classify(&absolute_url, domain) {
                LinkScope::Internal => internal.insert(absolute_url.to_string()),
                LinkScope::External => external.insert(absolute_url.to_string()),
            };
        }
    }

    (internal, external)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>  Acme   Widgets </title>
  <meta name="description" content=" Widgets for everyone ">
  <script>var tracking = "analytics";</script>
</head>
<body>
  <nav><a href="/">Home</a></nav>
  <h1>Widgets</h1>
  <p>Widgets widgets gadgets. Buy widgets today.</p>
  <h2>Pricing <small>plans</small></h2>
  <img src="/logo.png" alt="Acme logo">
  <img src="/spacer.gif">
  <a href="/about#team">About</a>
  <a href="https://www.acme.test/contact">Contact</a>
  <a href="https://partner.example/offer?utm_source=acme">Partner</a>
  <a href="mailto:sales@acme.test">Mail</a>
  <a href="/brochure.pdf" download>Brochure</a>
  <footer>Copyright widgets</footer>
</body>
</html>"#;

    fn page_url() -> Url {
        Url::parse("https://acme.test/products/widgets").unwrap()
    }

    #[test]
    fn test_extract_title_and_description() {
        let page = extract_page(PAGE, &page_url(), "acme.test", Language::English);
        assert_eq!(page.title, "Acme Widgets");
        assert_eq!(page.description, "Widgets for everyone");
    }

    #[test]
    fn test_missing_title() {
        let page = extract_page("<p>x</p>", &page_url(), "acme.test", Language::English);
        assert_eq!(page.title, NO_TITLE);
        assert_eq!(page.description, "");
    }

    #[test]
    fn test_headings_in_order() {
        let page = extract_page(PAGE, &page_url(), "acme.test", Language::English);
        assert_eq!(
            page.headings,
            vec![
                Heading { level: 1, text: "Widgets".to_string() },
                Heading { level: 2, text: "Pricing plans".to_string() },
            ]
        );
        assert_eq!(page.headings[1].to_markdown(), "## Pricing plans");
    }

    #[test]
    fn test_images() {
        let page = extract_page(PAGE, &page_url(), "acme.test", Language::English);
        assert_eq!(page.images.len(), 2);
        assert_eq!(page.images[0].src, "/logo.png");
        assert_eq!(page.images[0].alt, "Acme logo");
        assert_eq!(page.images[1].alt, "");
    }

    #[test]
    fn test_links_split_by_domain() {
        let page = extract_page(PAGE, &page_url(), "acme.test", Language::English);

        let internal: Vec<&str> = page.internal_links.iter().map(String::as_str).collect();
        assert_eq!(
            internal,
            vec![
                "https://acme.test/",
                "https://acme.test/about",
                "https://www.acme.test/contact",
            ]
        );

        let external: Vec<&str> = page.external_links.iter().map(String::as_str).collect();
        assert_eq!(external, vec!["https://partner.example/offer"]);
    }

    #[test]
    fn test_word_frequency_uses_visible_text_only() {
        let page = extract_page(PAGE, &page_url(), "acme.test", Language::English);

        // Title "Acme Widgets", h1, paragraph and h2 are visible; nav, script and footer are not
        assert_eq!(page.word_frequency.get("widgets"), Some(&5));
        assert_eq!(page.word_frequency.get("gadgets"), Some(&1));
        assert!(page.word_frequency.get("analytics").is_none());
        assert!(page.word_frequency.get("copyright").is_none());
        assert_eq!(page.word_count, page.word_frequency.values().sum::<u64>() as usize);
    }

    #[test]
    fn test_slug_and_filenames() {
        let page = extract_page(PAGE, &page_url(), "acme.test", Language::English);
        assert_eq!(page.slug, "products-widgets");
        assert_eq!(page.markdown_filename, "products-widgets.md");
        assert_eq!(page.json_filename, "products-widgets.json");
    }

    #[test]
    fn test_content_hash_is_stable() {
        let a = extract_page(PAGE, &page_url(), "acme.test", Language::English);
        let b = extract_page(PAGE, &page_url(), "acme.test", Language::English);
        assert_eq!(a.content_hash, b.content_hash);
        assert_eq!(a.content_hash.len(), 64);
        assert_eq!(a.content_hash, content_hash(&a.visible_text));
    }

    #[test]
    fn test_serialized_field_names() {
        let page = extract_page(PAGE, &page_url(), "acme.test", Language::English);
        let json = serde_json::to_value(&page).unwrap();
        assert!(json.get("meta_description").is_some());
        assert!(json.get("page_hash").is_some());
        assert!(json.get("md_filename").is_some());
        assert!(json.get("visible_text").is_none());
    }
}
