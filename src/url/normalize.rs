use url::Url;

/// Resolves a link href against the page it was found on
///
/// Returns None if the link should not be followed:
/// - empty hrefs and same-page fragments (`#top`)
/// - javascript:, mailto:, tel: and data: links
/// - hrefs that cannot be joined onto the base URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_harvest::url::resolve_link;
///
/// let base = Url::parse("https://a.com/list/p").unwrap();
/// assert_eq!(resolve_link("q", &base).unwrap().as_str(), "https://a.com/list/q");
/// assert!(resolve_link("mailto:me@a.com", &base).is_none());
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    base_url.join(href).ok()
}

/// Strips trailing slashes, the only normalization applied when comparing
/// page URLs
pub fn trim_trailing_slash(url: &str) -> &str {
    url.trim_end_matches('/')
}

/// Checks whether two URLs designate the same page
///
/// ```
/// use sumi_harvest::url::is_same_page;
///
/// assert!(is_same_page("https://a.com/p/", "https://a.com/p"));
/// assert!(!is_same_page("https://a.com/p", "https://a.com/q"));
/// ```
pub fn is_same_page(a: &str, b: &str) -> bool {
    trim_trailing_slash(a) == trim_trailing_slash(b)
}
