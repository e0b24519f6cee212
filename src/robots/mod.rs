//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching
//! robots.txt files. Files are fetched lazily, once per origin, and
//! refreshed after 24 hours.

mod cache;
mod parser;

pub use cache::{CachedRobots, ROBOTS_MAX_AGE_HOURS};
pub use parser::ParsedRobots;

use crate::url::http_origin;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// What robots.txt says about one URL
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RobotsDecision {
    pub allowed: bool,
    /// Pause to observe before fetching the URL
    pub crawl_delay: Duration,
}

impl RobotsDecision {
    fn allow() -> Self {
        Self {
            allowed: true,
            crawl_delay: Duration::ZERO,
        }
    }
}

/// Longest crawl delay honored; larger values are capped
pub const MAX_CRAWL_DELAY: Duration = Duration::from_secs(300);

/// Converts a declared `Crawl-delay` into a pause
///
/// Negative, non-finite and unrepresentable values are ignored.
fn delay_duration(origin: &str, seconds: f64) -> Duration {
    if seconds <= 0.0 {
        return Duration::ZERO;
    }
    match Duration::try_from_secs_f64(seconds) {
        Ok(delay) if delay > MAX_CRAWL_DELAY => {
            tracing::warn!(
                "Crawl-delay of {}s for {} capped to {:?}",
                seconds,
                origin,
                MAX_CRAWL_DELAY
            );
            MAX_CRAWL_DELAY
        }
        Ok(delay) => delay,
        Err(_) => {
            tracing::warn!("Ignoring unusable Crawl-delay '{}' for {}", seconds, origin);
            Duration::ZERO
        }
    }
}

/// Fetches robots.txt for an origin
///
/// A successful response is parsed. A 401 or 403 means the whole site is
/// off limits. Any other outcome, network errors included, allows
/// everything.
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `origin` - `scheme://host[:port]` of the site
pub async fn fetch_robots(client: &Client, origin: &str) -> ParsedRobots {
    let robots_url = format!("{}/robots.txt", origin);

    let response = match client.get(&robots_url).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!("Failed to fetch {}: {}", robots_url, e);
            return ParsedRobots::allow_all();
        }
    };

    match response.status() {
        status if status.is_success() => match response.text().await {
            Ok(body) => ParsedRobots::from_content(&body),
            Err(e) => {
                tracing::debug!("Failed to read {}: {}", robots_url, e);
                ParsedRobots::allow_all()
            }
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            tracing::debug!("{} refused with {}", robots_url, response.status());
            ParsedRobots::disallow_all()
        }
        status => {
            tracing::debug!("{} returned {}, allowing all", robots_url, status);
            ParsedRobots::allow_all()
        }
    }
}

/// Per-origin robots.txt cache
#[derive(Debug)]
pub struct RobotsCache {
    client: Client,
    user_agent: String,
    entries: HashMap<String, CachedRobots>,
}

impl RobotsCache {
    /// Creates an empty cache
    ///
    /// # Arguments
    ///
    /// * `client` - The HTTP client used to fetch robots.txt files
    /// * `user_agent` - The product token matched against `User-agent` lines
    pub fn new(client: Client, user_agent: impl Into<String>) -> Self {
        Self {
            client,
            user_agent: user_agent.into(),
            entries: HashMap::new(),
        }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Number of cached origins
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks a URL, fetching its origin's robots.txt if not cached
    ///
    /// URLs without an HTTP(S) origin have no robots.txt and are always
    /// allowed.
    pub async fn check(&mut self, url: &str) -> RobotsDecision {
        let Some(origin) = Url::parse(url).ok().as_ref().and_then(http_origin) else {
            return RobotsDecision::allow();
        };

        let user_agent = self.user_agent.clone();
        let robots = self.robots_for(&origin).await;

        RobotsDecision {
            allowed: robots.is_allowed(url, &user_agent),
            crawl_delay: robots
                .crawl_delay(&user_agent)
                .map(|seconds| delay_duration(&origin, seconds))
                .unwrap_or(Duration::ZERO),
        }
    }

    async fn robots_for(&mut self, origin: &str) -> &CachedRobots {
        let fresh = self
            .entries
            .get(origin)
            .map(|cached| !cached.is_stale())
            .unwrap_or(false);

        if !fresh {
            tracing::debug!("Fetching robots.txt for {}", origin);
            let parsed = fetch_robots(&self.client, origin).await;
            self.entries
                .insert(origin.to_string(), CachedRobots::new(parsed));
        }

        &self.entries[origin]
    }
}
