//! Request gate
//!
//! Outgoing requests are matched against Adblock Plus style network rules
//! before they reach the network. Matching requests are dropped.

use crate::crawler::Request;
use adblock::lists::ParseOptions;
use adblock::Engine;
use std::fmt;

/// Resource type reported when a request carries no `sec-fetch-dest`
const DEFAULT_RESOURCE_TYPE: &str = "other";

/// Outcome of a gate check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Block,
}

/// Filter consulted by backends before every network request
pub struct RequestGate {
    engine: Option<Engine>,
    rule_count: usize,
}

impl RequestGate {
    /// Builds a gate from Adblock Plus filter lines
    ///
    /// An empty rule list yields a gate that allows everything.
    ///
    /// # Example
    ///
    /// ```
    /// use sumi_harvest::crawler::{GateDecision, Request, RequestGate};
    ///
    /// let gate = RequestGate::new(["||ads.example.com^"]);
    /// let request = Request::get("https://ads.example.com/banner.js")
    ///     .with_header("referer", "https://example.com/");
    /// assert_eq!(gate.check(&request), GateDecision::Block);
    /// ```
    pub fn new<I, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules: Vec<String> = rules
            .into_iter()
            .map(|rule| rule.as_ref().trim().to_string())
            .filter(|rule| !rule.is_empty())
            .collect();

        if rules.is_empty() {
            return Self::default();
        }

        let rule_count = rules.len();
        tracing::debug!("Loading {} request filter rules", rule_count);
        Self {
            engine: Some(Engine::from_rules(&rules, ParseOptions::default())),
            rule_count,
        }
    }

    /// Number of filter lines loaded
    pub fn rule_count(&self) -> usize {
        self.rule_count
    }

    /// The page a request originates from: its `referer`, `origin` or
    /// `host` header, else the request URL itself
    pub fn source_url(request: &Request) -> String {
        ["referer", "origin", "host"]
            .iter()
            .find_map(|name| request.header(name))
            .unwrap_or(request.url.as_str())
            .to_string()
    }

    /// The resource type hint of a request, from `sec-fetch-dest`
    pub fn resource_type(request: &Request) -> String {
        request
            .header("sec-fetch-dest")
            .unwrap_or(DEFAULT_RESOURCE_TYPE)
            .to_string()
    }

    /// Checks a request against the filter rules
    pub fn check(&self, request: &Request) -> GateDecision {
        let Some(engine) = &self.engine else {
            return GateDecision::Allow;
        };

        let source_url = Self::source_url(request);
        let resource_type = Self::resource_type(request);
        let filter_request =
            match adblock::request::Request::new(&request.url, &source_url, &resource_type) {
                Ok(filter_request) => filter_request,
                Err(e) => {
                    tracing::debug!("Cannot filter {}: {:?}", request.url, e);
                    return GateDecision::Allow;
                }
            };

        if engine.check_network_request(&filter_request).matched {
            tracing::info!("URL {} has been blocked.", request.url);
            GateDecision::Block
        } else {
            GateDecision::Allow
        }
    }

    /// Same as [`check`](Self::check), for async call sites
    pub async fn check_async(&self, request: &Request) -> GateDecision {
        tokio::task::yield_now().await;
        self.check(request)
    }
}

impl Default for RequestGate {
    fn default() -> Self {
        Self {
            engine: None,
            rule_count: 0,
        }
    }
}

impl fmt::Debug for RequestGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestGate")
            .field("rule_count", &self.rule_count)
            .finish()
    }
}
