//! URL handling module for Sumi-Harvest
//!
//! This module provides network-location extraction for the crawl
//! allow-list, glob matching of page URLs for rule selection, and link
//! resolution for link-following.

mod domain;
mod matcher;
mod normalize;

// Re-export main functions
pub use domain::{http_origin, netloc, netloc_of};
pub use matcher::UrlMatcher;
pub use normalize::{is_same_page, resolve_link, trim_trailing_slash};
