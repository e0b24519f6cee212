//! Integration tests for Sumi-Harvest
//!
//! Local pages are served from temporary directories through `file://`
//! URLs; politeness behavior is exercised against wiremock servers.

mod common;
mod config_tests;
mod crawl_tests;
mod output_tests;
mod politeness_tests;
