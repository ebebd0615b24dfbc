//! Configuration module for Forum-Harvester
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and layering environment overrides on top of them.
//!
//! # Example
//!
//! ```no_run
//! use forum_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Some(Path::new("harvester.toml"))).unwrap();
//! println!("Crawling from page {}", config.crawler.start_page);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CheckerConfig, CheckpointConfig, Config, CrawlerConfig, ForumConfig, HttpConfig,
    OutputConfig, TitleConfig, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{apply_env_overrides, compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
