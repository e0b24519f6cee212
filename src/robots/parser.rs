//! robots.txt rules
//!
//! Allow/disallow matching is delegated to the `robotstxt` crate, which
//! implements Google's matcher. It has no notion of `Crawl-delay`, so delay
//! groups are collected separately when the file is parsed.

use robotstxt::DefaultMatcher;

/// `Crawl-delay` declared for a run of consecutive `User-agent` lines
#[derive(Debug, Clone, PartialEq)]
struct DelayGroup {
    agents: Vec<String>,
    seconds: f64,
}

#[derive(Debug, Clone, PartialEq)]
enum Policy {
    AllowAll,
    DisallowAll,
    Rules {
        content: String,
        delays: Vec<DelayGroup>,
    },
}

/// The rules of one robots.txt file
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRobots {
    policy: Policy,
}

impl ParsedRobots {
    /// Parses raw robots.txt content; blank content allows everything
    pub fn from_content(content: &str) -> Self {
        if content.trim().is_empty() {
            return Self::allow_all();
        }
        Self {
            policy: Policy::Rules {
                content: content.to_string(),
                delays: delay_groups(content),
            },
        }
    }

    /// Used when robots.txt is missing or cannot be fetched
    pub fn allow_all() -> Self {
        Self {
            policy: Policy::AllowAll,
        }
    }

    /// Used when the robots.txt request is refused with 401 or 403
    pub fn disallow_all() -> Self {
        Self {
            policy: Policy::DisallowAll,
        }
    }

    /// Checks a URL (absolute, or a path such as `/page.html`) for a user
    /// agent product token
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        match &self.policy {
            Policy::AllowAll => true,
            Policy::DisallowAll => false,
            Policy::Rules { content, .. } => {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(content, user_agent, url)
            }
        }
    }

    /// Crawl delay in seconds for a user agent
    ///
    /// A group naming the agent (case-insensitive substring match) wins
    /// over the `*` group. Within either, the last declaration wins.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        let Policy::Rules { delays, .. } = &self.policy else {
            return None;
        };

        let agent = user_agent.to_lowercase();
        last_delay(delays, |a| a != "*" && agent.contains(a))
            .or_else(|| last_delay(delays, |a| a == "*"))
    }
}

fn last_delay(delays: &[DelayGroup], matches: impl Fn(&str) -> bool) -> Option<f64> {
    delays
        .iter()
        .rev()
        .find(|group| group.agents.iter().any(|a| matches(a.as_str())))
        .map(|group| group.seconds)
}

/// Collects every `Crawl-delay` with the user agents it applies to
///
/// A `User-agent` line following any other directive starts a new group.
fn delay_groups(content: &str) -> Vec<DelayGroup> {
    let mut groups = Vec::new();
    let mut agents: Vec<String> = Vec::new();
    let mut in_rules = false;

    let directives = content.lines().filter_map(|line| {
        let line = line.split('#').next().unwrap_or_default();
        let (key, value) = line.split_once(':')?;
        Some((key.trim().to_lowercase(), value.trim()))
    });

    for (key, value) in directives {
        match key.as_str() {
            "user-agent" => {
                if in_rules {
                    agents.clear();
                    in_rules = false;
                }
                agents.push(value.to_lowercase());
            }
            "crawl-delay" => {
                in_rules = true;
                match value.parse::<f64>() {
                    Ok(seconds) => groups.push(DelayGroup {
                        agents: agents.clone(),
                        seconds,
                    }),
                    Err(_) => tracing::debug!("Ignoring malformed Crawl-delay '{}'", value),
                }
            }
            _ => in_rules = true,
        }
    }

    groups
}
