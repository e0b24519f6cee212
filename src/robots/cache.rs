use crate::robots::ParsedRobots;
use chrono::{DateTime, Duration, Utc};

/// How long a fetched robots.txt is trusted
pub const ROBOTS_MAX_AGE_HOURS: i64 = 24;

/// robots.txt rules of one origin, stamped with their fetch time
#[derive(Debug, Clone)]
pub struct CachedRobots {
    pub content: ParsedRobots,
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    pub fn new(content: ParsedRobots) -> Self {
        Self::fetched(content, Utc::now())
    }

    pub fn fetched(content: ParsedRobots, fetched_at: DateTime<Utc>) -> Self {
        Self {
            content,
            fetched_at,
        }
    }

    pub fn is_stale(&self) -> bool {
        self.is_stale_at(Utc::now())
    }

    /// True once the entry is older than [`ROBOTS_MAX_AGE_HOURS`] at `now`
    pub fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        now - self.fetched_at > Duration::hours(ROBOTS_MAX_AGE_HOURS)
    }

    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        self.content.is_allowed(url, user_agent)
    }

    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        self.content.crawl_delay(user_agent)
    }
}
