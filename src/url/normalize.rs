use crate::{UrlError, UrlResult};
use url::Url;

/// List of tracking query parameters removed from discovered links
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_eid",
];

/// Parses and validates the crawl's base URL
///
/// # Returns
///
/// * `Ok(Url)` - An absolute HTTP(S) URL with a host
/// * `Err(UrlError)` - Anything else
pub fn parse_base_url(url_str: &str) -> UrlResult<Url> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    Ok(url)
}

/// Resolves an `href` attribute against the page URL
///
/// Skips empty hrefs, same-page anchors and non-HTTP schemes (`javascript:`,
/// `mailto:`, `tel:`, `data:`). The fragment and tracking query parameters
/// are removed so that equivalent links deduplicate.
///
/// # Examples
///
/// ```
/// use site_insights::url::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/blog/").unwrap();
/// let link = resolve_link("post-1#comments", &base).unwrap();
/// assert_eq!(link.as_str(), "https://example.com/blog/post-1");
/// assert!(resolve_link("mailto:me@example.com", &base).is_none());
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let mut url = base_url.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }

    url.set_fragment(None);
    strip_tracking_params(&mut url);
    Some(url)
}

fn strip_tracking_params(url: &mut Url) {
    if url.query().is_none() {
        return;
    }

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
