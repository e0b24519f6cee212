//! Sumi-Harvest: a declarative, polite web scraper
//!
//! Users register selector-bound handlers ("rules") on a [`Harvester`]. The
//! crawler fetches pages through a [`backend::Backend`], resolves which rules
//! apply to each page, runs them over the matched elements and folds the
//! results into flat records that are handed to a save handler. The crawl
//! frontier respects seed-domain allow-lists, robots.txt and crawl delays.

pub mod backend;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod harvester;
pub mod output;
pub mod robots;
pub mod rules;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Selector error: {0}")]
    Selector(#[from] SelectorError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Save error: {0}")]
    Save(#[from] SaveError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Invalid URL pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::VisitState,
        to: state::VisitState,
    },

    #[error("Handler failed: {0}")]
    Handler(#[from] anyhow::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid rule: {0}")]
    InvalidRule(String),
}

/// Errors raised while building or resolving a selector
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("Selector pattern cannot be empty")]
    Empty,

    #[error("No selector given, expected exactly one of selector, css, xpath, text, regex")]
    Missing,

    #[error("{0} selectors given, expected exactly one of selector, css, xpath, text, regex")]
    Ambiguous(usize),
}

/// Errors reported by a page backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Request to {url} was blocked")]
    Blocked { url: String },

    #[error("{kind} selector is not supported by the {backend} backend")]
    UnsupportedSelector {
        backend: &'static str,
        kind: rules::SelectorKind,
    },

    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),
}

/// Errors raised by save dispatch
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("No save handler registered for format '{format}' (per page: {per_page})")]
    NoHandler { format: String, per_page: bool },

    #[error("Failed to save output as '{format}'")]
    Failed { format: String },

    #[error("Save handler for '{format}' raised an error: {source}")]
    Handler {
        format: String,
        source: anyhow::Error,
    },
}

/// Result type alias for Sumi-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

// Re-export commonly used types
pub use backend::{Backend, HtmlBackend, HtmlElement, HtmlPage};
pub use config::Config;
pub use crawler::{CrawlStats, Crawler, Frontier, Request, RequestGate};
pub use extract::{flatten, Data, Record, ScrapedData};
pub use harvester::{CrawlHandle, Harvester, Select};
pub use rules::{Handler, Rule, RuleKind, RuleSet, Selector, SelectorKind};
pub use state::VisitState;
