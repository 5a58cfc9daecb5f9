//! Configuration module for Webber
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! All settings have defaults, so the configuration file is optional.
//!
//! # Example
//!
//! ```no_run
//! use webber::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("webber.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, DownloadConfig, MediaConfig, OutputConfig, UserAgentConfig,
};

// Re-export parser and validation functions
pub use parser::{load_config, load_config_or_default, parse_config};
pub use validation::{normalize_extensions, validate};
