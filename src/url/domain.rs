use url::Url;

/// Returns the network location of a URL: its lowercase host and, if
/// explicitly given and not the scheme default, its port
///
/// URLs without a host (such as `file:///tmp/page.html`) yield an empty
/// string. This is the key used by the crawl allow-list, so subdomains are
/// distinct locations.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_harvest::url::netloc;
///
/// let url = Url::parse("https://EXAMPLE.com/path").unwrap();
/// assert_eq!(netloc(&url), "example.com");
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(netloc(&url), "127.0.0.1:8080");
/// ```
pub fn netloc(url: &Url) -> String {
    let host = match url.host_str() {
        Some(host) => host.to_lowercase(),
        None => return String::new(),
    };

    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    }
}

/// Network location of a URL string; unparsable input yields `None`
pub fn netloc_of(url: &str) -> Option<String> {
    Url::parse(url).ok().map(|parsed| netloc(&parsed))
}

/// Returns the `scheme://host[:port]` origin of an HTTP(S) URL
///
/// Other schemes have no robots.txt and yield `None`.
pub fn http_origin(url: &Url) -> Option<String> {
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => {
            Some(url.origin().ascii_serialization())
        }
        _ => None,
    }
}
