//! Typed selectors
//!
//! A [`Selector`] holds exactly one pattern together with the kind of
//! matching a backend should apply to it. Selectors compare and order by
//! their canonical typed string, which is what makes rule grouping
//! deterministic.

use crate::SelectorError;
use serde::Deserialize;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Pattern used for the implicit whole-document group
pub const ROOT_SELECTOR: &str = ":root";

/// The matching strategy of a selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectorKind {
    /// Left for the backend to interpret
    Any,
    Css,
    XPath,
    /// Element text contains the pattern
    Text,
    /// Element text matches the pattern, case-insensitive
    Regex,
}

impl SelectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Css => "css",
            Self::XPath => "xpath",
            Self::Text => "text",
            Self::Regex => "regex",
        }
    }
}

impl fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed element selector
#[derive(Debug, Clone)]
pub enum Selector {
    Any(String),
    Css(String),
    XPath(String),
    Text(String),
    Regex(String),
}

/// The multi-field form of a selector, as found in configuration files
///
/// Exactly one field must be set for [`Selector::from_parts`] to succeed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectorParts {
    pub selector: Option<String>,
    pub css: Option<String>,
    pub xpath: Option<String>,
    pub text: Option<String>,
    pub regex: Option<String>,
}

impl SelectorParts {
    /// Returns true if no field is set
    pub fn is_empty(&self) -> bool {
        self.supplied() == 0
    }

    fn supplied(&self) -> usize {
        [
            &self.selector,
            &self.css,
            &self.xpath,
            &self.text,
            &self.regex,
        ]
        .iter()
        .filter(|field| field.is_some())
        .count()
    }
}

impl Selector {
    pub fn any(pattern: impl Into<String>) -> Self {
        Self::Any(pattern.into())
    }

    pub fn css(pattern: impl Into<String>) -> Self {
        Self::Css(pattern.into())
    }

    pub fn xpath(pattern: impl Into<String>) -> Self {
        Self::XPath(pattern.into())
    }

    pub fn text(pattern: impl Into<String>) -> Self {
        Self::Text(pattern.into())
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Self::Regex(pattern.into())
    }

    /// The group every scrape rule falls back to: the whole document
    pub fn root() -> Self {
        Self::Any(ROOT_SELECTOR.to_string())
    }

    /// Builds a selector from its multi-field form
    ///
    /// # Arguments
    ///
    /// * `parts` - The candidate fields, exactly one of which must be set
    ///
    /// # Returns
    ///
    /// * `Ok(Selector)` - The single supplied field, typed accordingly
    /// * `Err(SelectorError)` - Zero or several fields were set, or the
    ///   supplied pattern is empty
    pub fn from_parts(parts: SelectorParts) -> Result<Self, SelectorError> {
        let supplied = parts.supplied();
        if supplied == 0 {
            return Err(SelectorError::Missing);
        }
        if supplied > 1 {
            return Err(SelectorError::Ambiguous(supplied));
        }

        let selector = if let Some(pattern) = parts.selector {
            Self::Any(pattern)
        } else if let Some(pattern) = parts.css {
            Self::Css(pattern)
        } else if let Some(pattern) = parts.xpath {
            Self::XPath(pattern)
        } else if let Some(pattern) = parts.text {
            Self::Text(pattern)
        } else if let Some(pattern) = parts.regex {
            Self::Regex(pattern)
        } else {
            return Err(SelectorError::Missing);
        };

        selector.validate()?;
        Ok(selector)
    }

    /// Rejects selectors with an empty pattern
    pub fn validate(&self) -> Result<(), SelectorError> {
        if self.pattern().is_empty() {
            return Err(SelectorError::Empty);
        }
        Ok(())
    }

    /// The raw pattern string
    pub fn pattern(&self) -> &str {
        match self {
            Self::Any(p) | Self::Css(p) | Self::XPath(p) | Self::Text(p) | Self::Regex(p) => p,
        }
    }

    pub fn kind(&self) -> SelectorKind {
        match self {
            Self::Any(_) => SelectorKind::Any,
            Self::Css(_) => SelectorKind::Css,
            Self::XPath(_) => SelectorKind::XPath,
            Self::Text(_) => SelectorKind::Text,
            Self::Regex(_) => SelectorKind::Regex,
        }
    }

    /// Canonical string form of the selector
    ///
    /// With `with_type`, the pattern is prefixed by its engine
    /// (`css=`, `xpath=`, `text=`), and regexes are written as
    /// `text=/pattern/i`. Without it, the raw pattern is returned.
    pub fn canonical(&self, with_type: bool) -> String {
        if !with_type {
            return self.pattern().to_string();
        }
        match self {
            Self::Any(p) => p.clone(),
            Self::Css(p) => format!("css={}", p),
            Self::XPath(p) => format!("xpath={}", p),
            Self::Text(p) => format!("text={}", p),
            Self::Regex(p) => format!("text=/{}/i", p),
        }
    }
}

impl From<&str> for Selector {
    fn from(pattern: &str) -> Self {
        Self::Any(pattern.to_string())
    }
}

impl From<String> for Selector {
    fn from(pattern: String) -> Self {
        Self::Any(pattern)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical(true))
    }
}

impl PartialEq for Selector {
    fn eq(&self, other: &Self) -> bool {
        self.canonical(true) == other.canonical(true)
    }
}

impl Eq for Selector {}

impl Hash for Selector {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical(true).hash(state);
    }
}

impl PartialOrd for Selector {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Selector {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical(true).cmp(&other.canonical(true))
    }
}
