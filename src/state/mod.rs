//! State module for tracking crawl progress
//!
//! This module provides the per-entry visit state machine the crawler walks
//! through for each frontier entry.

mod visit_state;

pub use visit_state::VisitState;
