use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Main configuration structure for Sumi-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub adblock: AdblockConfig,
    #[serde(rename = "rule", default)]
    pub rules: Vec<RuleConfig>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Seed URLs; their network locations form the allow-list
    pub urls: Vec<String>,

    /// Maximum number of pages visited per seed through navigation
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Queue every link of every loaded page; forces per-page saving
    #[serde(rename = "follow-links", default)]
    pub follow_links: bool,

    /// Save after every page instead of once at the end
    #[serde(rename = "save-per-page", default)]
    pub save_per_page: bool,

    /// Skip robots.txt checks and crawl delays
    #[serde(rename = "ignore-robots", default)]
    pub ignore_robots: bool,

    /// Never enqueue the same URL twice
    #[serde(rename = "dedupe-urls", default)]
    pub dedupe_urls: bool,
}

fn default_max_pages() -> u32 {
    1
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            max_pages: default_max_pages(),
            follow_links: false,
            save_per_page: false,
            ignore_robots: false,
            dedupe_urls: false,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler, also the token matched against robots.txt
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email", default)]
    pub contact_email: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: env!("CARGO_PKG_NAME").to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
            contact_email: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Output file; stdout when absent
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Save format, overridden by the output file extension
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "json".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: None,
            format: default_format(),
        }
    }
}

/// Request filtering rules in Adblock Plus syntax
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdblockConfig {
    #[serde(default)]
    pub rules: Vec<String>,
}

/// What a configured rule does with its matches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleConfigKind {
    /// Extract `fields` from every matched element
    #[default]
    Scrape,
    /// Follow the first matched element's link to the next page
    Navigate,
}

/// A scraping or navigation rule declared in the config file
///
/// Exactly one of the selector fields and at most one of the group fields
/// may be set.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleConfig {
    #[serde(default)]
    pub kind: RuleConfigKind,

    #[serde(default)]
    pub selector: Option<String>,
    #[serde(default)]
    pub css: Option<String>,
    #[serde(default)]
    pub xpath: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub regex: Option<String>,

    #[serde(default)]
    pub group: Option<String>,
    #[serde(rename = "group-css", default)]
    pub group_css: Option<String>,
    #[serde(rename = "group-xpath", default)]
    pub group_xpath: Option<String>,
    #[serde(rename = "group-text", default)]
    pub group_text: Option<String>,
    #[serde(rename = "group-regex", default)]
    pub group_regex: Option<String>,

    /// Glob matched against the page URL
    #[serde(default = "default_url_pattern")]
    pub url: String,

    #[serde(default = "default_priority")]
    pub priority: i32,

    /// Handler name, used to share a group between rules
    #[serde(default)]
    pub name: Option<String>,

    /// Output field name to extraction: `text`, `html` or `attr:<name>`
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

fn default_url_pattern() -> String {
    "*".to_string()
}

fn default_priority() -> i32 {
    crate::rules::DEFAULT_PRIORITY
}
