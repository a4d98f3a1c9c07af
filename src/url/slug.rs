use url::Url;

/// Slug used when a URL path has no alphanumeric content
pub const HOME_SLUG: &str = "home";

/// Converts arbitrary text into a filesystem-safe slug
///
/// Runs of ASCII alphanumerics are lowercased and joined with `-`; every other
/// character acts as a separator.
///
/// # Examples
///
/// ```
/// use site_insights::url::slugify;
///
/// assert_eq!(slugify("/Blog/Hello World/"), "blog-hello-world");
/// assert_eq!(slugify("example.com"), "example-com");
/// assert_eq!(slugify("///"), "");
/// ```
pub fn slugify(text: &str) -> String {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| part.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// Slug for a page URL, derived from its path
///
/// An unparseable URL falls back to slugifying the raw string's path portion.
///
/// # Examples
///
/// ```
/// use site_insights::url::slug_for_url;
///
/// assert_eq!(slug_for_url("https://example.com/"), "home");
/// assert_eq!(slug_for_url("https://example.com/about/team"), "about-team");
/// ```
pub fn slug_for_url(url: &str) -> String {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.to_string(),
    };

    let slug = slugify(&path);
    if slug.is_empty() {
        HOME_SLUG.to_string()
    } else {
        slug
    }
}
