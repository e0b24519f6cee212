//! Link extraction for link-following
//!
//! Links are returned as the raw `href` values of the document, in
//! document order. Resolution against the page URL and filtering of
//! special schemes happen when the frontier follows them.

use scraper::{Html, Selector};

/// Extracts the `href` of every followable `<a>` element
///
/// `<a>` elements carrying the `download` attribute point at files rather
/// than pages and are skipped.
///
/// # Example
///
/// ```
/// use scraper::Html;
/// use sumi_harvest::crawler::extract_links;
///
/// let html = Html::parse_document(r#"<a href="/page">Link</a><a href="/f.zip" download>File</a>"#);
/// assert_eq!(extract_links(&html), vec!["/page"]);
/// ```
pub fn extract_links(document: &Html) -> Vec<String> {
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&a_selector)
        .filter(|element| element.value().attr("download").is_none())
        .filter_map(|element| element.value().attr("href"))
        .map(str::to_string)
        .collect()
}
