//! Crawler module for page fetching and crawl orchestration
//!
//! This module contains the core crawling logic, including:
//! - Requests and the HTTP client setup
//! - The ad-block request gate
//! - Link extraction for link-following
//! - The crawl frontier and its politeness checks
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod gate;
mod parser;
mod request;

pub use coordinator::{CrawlStats, Crawler};
pub use fetcher::{build_http_client, user_agent_string};
pub use frontier::{Frontier, FrontierEntry};
pub use gate::{GateDecision, RequestGate};
pub use parser::extract_links;
pub use request::Request;
