use glob::Pattern;
use std::fmt;
use std::rc::Rc;

/// Decides which page URLs a rule applies to
#[derive(Clone, Default)]
pub enum UrlMatcher {
    /// Accepts every URL
    #[default]
    Any,
    /// Shell-glob pattern matched against the absolute page URL
    Glob(Pattern),
    /// Arbitrary predicate over the absolute page URL
    Predicate(Rc<dyn Fn(&str) -> bool>),
}

impl UrlMatcher {
    /// Compiles a shell-glob pattern
    ///
    /// `*` matches any run of characters including `/`, `?` matches one
    /// character and `[...]`/`[!...]` are character classes. A bare `*`
    /// compiles to [`UrlMatcher::Any`].
    ///
    /// # Examples
    ///
    /// ```
    /// use sumi_harvest::url::UrlMatcher;
    ///
    /// let matcher = UrlMatcher::glob("https://example.com/*/page-?").unwrap();
    /// assert!(matcher.matches("https://example.com/a/b/page-1"));
    /// assert!(!matcher.matches("https://example.com/page-10"));
    /// ```
    pub fn glob(pattern: &str) -> Result<Self, glob::PatternError> {
        if pattern == "*" {
            return Ok(Self::Any);
        }
        Ok(Self::Glob(Pattern::new(pattern)?))
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&str) -> bool + 'static,
    {
        Self::Predicate(Rc::new(f))
    }

    /// Checks whether `url` is accepted
    pub fn matches(&self, url: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Glob(pattern) => pattern.matches(url),
            Self::Predicate(f) => f(url),
        }
    }
}

impl fmt::Debug for UrlMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("UrlMatcher::Any"),
            Self::Glob(pattern) => write!(f, "UrlMatcher::Glob({})", pattern.as_str()),
            Self::Predicate(_) => f.write_str("UrlMatcher::Predicate"),
        }
    }
}
