use crate::{UrlError, UrlResult};
use url::Url;

/// Extracts the crawl domain from a base URL string
///
/// The domain is the lowercase host with any leading `www.` removed. It names
/// the project folder and the per-domain aggregate files.
///
/// # Arguments
///
/// * `base_url` - An absolute HTTP(S) URL
///
/// # Returns
///
/// * `Ok(String)` - The crawl domain
/// * `Err(UrlError)` - The URL is malformed, not HTTP(S), or has no host
///
/// # Examples
///
/// ```
/// use site_insights::url::extract_domain;
///
/// assert_eq!(extract_domain("https://www.Example.com/path").unwrap(), "example.com");
/// assert_eq!(extract_domain("http://blog.example.com").unwrap(), "blog.example.com");
/// assert!(extract_domain("ftp://example.com").is_err());
/// ```
pub fn extract_domain(base_url: &str) -> UrlResult<String> {
    let url = Url::parse(base_url.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    host_domain(&url).ok_or(UrlError::MissingDomain)
}

/// Returns the lowercase host of `url` without a `www.` prefix
pub fn host_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| {
        let host = h.to_lowercase();
        match host.strip_prefix("www.") {
            Some(rest) => rest.to_string(),
            None => host,
        }
    })
}

/// Returns true if `url` points at the crawl domain
pub fn is_same_domain(url: &Url, domain: &str) -> bool {
    host_domain(url)
        .map(|h| h.eq_ignore_ascii_case(domain))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_domain() {
        assert_eq!(extract_domain("https://example.com/").unwrap(), "example.com");
    }

    #[test]
    fn test_extract_strips_www() {
        assert_eq!(
            extract_domain("https://www.example.com/blog").unwrap(),
            "example.com"
        );
    }

    #[test]
    fn test_extract_keeps_subdomain() {
        assert_eq!(
            extract_domain("https://blog.example.com/post").unwrap(),
            "blog.example.com"
        );
    }

    #[test]
    fn test_extract_ignores_port() {
        assert_eq!(extract_domain("http://127.0.0.1:8080/").unwrap(), "127.0.0.1");
    }

    #[test]
    fn test_extract_uppercase_converted_to_lowercase() {
        assert_eq!(extract_domain("https://EXAMPLE.COM/").unwrap(), "example.com");
    }

    #[test]
    fn test_extract_trims_whitespace() {
        assert_eq!(extract_domain("  https://example.com  ").unwrap(), "example.com");
    }

    #[test]
    fn test_extract_rejects_other_schemes() {
        assert!(matches!(
            extract_domain("mailto:someone@example.com"),
            Err(UrlError::InvalidScheme(_))
        ));
    }

    #[test]
    fn test_extract_rejects_garbage() {
        assert!(matches!(extract_domain("not a url"), Err(UrlError::Parse(_))));
    }

    #[test]
    fn test_is_same_domain() {
        let url = Url::parse("https://www.example.com/a").unwrap();
        assert!(is_same_domain(&url, "example.com"));
        assert!(!is_same_domain(&url, "example.org"));
    }
}
