//! HTTP client setup
//!
//! This module builds the HTTP client shared by the bundled backend and the
//! robots.txt cache, identifying the crawler with a descriptive user agent.

use crate::config::UserAgentConfig;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;

/// Maximum number of redirects followed for a single request
const MAX_REDIRECTS: usize = 10;

/// Formats the user agent header value
///
/// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`, with the
/// parenthesized part reduced to whatever contact details are configured.
///
/// # Example
///
/// ```
/// use sumi_harvest::config::UserAgentConfig;
/// use sumi_harvest::crawler::user_agent_string;
///
/// let config = UserAgentConfig {
///     crawler_name: "Harvester".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: Some("https://example.com/about".to_string()),
///     contact_email: None,
/// };
/// assert_eq!(user_agent_string(&config), "Harvester/1.0 (+https://example.com/about)");
/// ```
pub fn user_agent_string(config: &UserAgentConfig) -> String {
    let contact: Vec<String> = [
        config.contact_url.as_ref().map(|url| format!("+{}", url)),
        config.contact_email.clone(),
    ]
    .into_iter()
    .flatten()
    .collect();

    if contact.is_empty() {
        format!("{}/{}", config.crawler_name, config.crawler_version)
    } else {
        format!(
            "{}/{} ({})",
            config.crawler_name,
            config.crawler_version,
            contact.join("; ")
        )
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent_string(config))
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}
