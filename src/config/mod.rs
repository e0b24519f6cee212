//! Configuration module for Sumi-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and turning their `[[rule]]` entries into a harvester.
//!
//! # Example
//!
//! ```no_run
//! use sumi_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Crawler will visit up to {} pages per seed", config.crawler.max_pages);
//! ```

mod parser;
mod rules;
mod types;
mod validation;

// Re-export types
pub use types::{
    AdblockConfig, Config, CrawlerConfig, OutputConfig, RuleConfig, RuleConfigKind,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};

pub use rules::{harvester_from_config, FieldSpec};
pub use validation::validate;
