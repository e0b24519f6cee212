use crate::rules::{Selector, SelectorParts, DEFAULT_PRIORITY};
use crate::url::UrlMatcher;
use crate::SelectorError;

#[derive(Debug, Clone)]
pub(crate) enum UrlSpec {
    Glob(String),
    Matcher(UrlMatcher),
}

/// Where and when a registered handler applies
///
/// # Example
///
/// ```
/// use sumi_harvest::Select;
///
/// let select = Select::css(".title")
///     .group(".item")
///     .url("https://example.com/*")
///     .priority(10)
///     .name("titles");
/// assert_eq!(select.selector().to_string(), "css=.title");
/// ```
#[derive(Debug, Clone)]
pub struct Select {
    pub(crate) selector: Selector,
    pub(crate) group: Option<Selector>,
    pub(crate) url: UrlSpec,
    pub(crate) priority: i32,
    pub(crate) name: Option<String>,
}

impl Select {
    pub fn new(selector: impl Into<Selector>) -> Self {
        Self {
            selector: selector.into(),
            group: None,
            url: UrlSpec::Glob("*".to_string()),
            priority: DEFAULT_PRIORITY,
            name: None,
        }
    }

    pub fn css(pattern: impl Into<String>) -> Self {
        Self::new(Selector::css(pattern))
    }

    pub fn xpath(pattern: impl Into<String>) -> Self {
        Self::new(Selector::xpath(pattern))
    }

    /// Elements whose own text contains `pattern`, ignoring case
    pub fn text(pattern: impl Into<String>) -> Self {
        Self::new(Selector::text(pattern))
    }

    /// Elements whose own text matches `pattern`, ignoring case
    pub fn regex(pattern: impl Into<String>) -> Self {
        Self::new(Selector::regex(pattern))
    }

    pub fn from_parts(parts: SelectorParts) -> Result<Self, SelectorError> {
        Ok(Self::new(Selector::from_parts(parts)?))
    }

    /// Restricts matches to elements inside each element matching `group`
    pub fn group(mut self, group: impl Into<Selector>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Shell-glob the page URL must match; `*` by default
    pub fn url(mut self, pattern: impl Into<String>) -> Self {
        self.url = UrlSpec::Glob(pattern.into());
        self
    }

    pub fn url_predicate<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> bool + 'static,
    {
        self.url = UrlSpec::Matcher(UrlMatcher::predicate(f));
        self
    }

    /// Lower priorities run first
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Names the handler; rules sharing a name share a registered group
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub(crate) fn url_matcher(&self) -> Result<UrlMatcher, glob::PatternError> {
        match &self.url {
            UrlSpec::Glob(pattern) => UrlMatcher::glob(pattern),
            UrlSpec::Matcher(matcher) => Ok(matcher.clone()),
        }
    }
}

impl From<&str> for Select {
    fn from(selector: &str) -> Self {
        Self::new(selector)
    }
}

impl From<String> for Select {
    fn from(selector: String) -> Self {
        Self::new(selector)
    }
}

impl From<Selector> for Select {
    fn from(selector: Selector) -> Self {
        Self::new(selector)
    }
}
