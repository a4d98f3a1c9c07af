//! Configuration module for Site-Insights
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use site_insights::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("insights.toml")).unwrap();
//! println!("Crawler will process up to {} pages", config.crawler.max_pages);
//! ```

mod language;
mod parser;
mod types;
mod validation;

// Re-export types
pub use language::Language;
pub use types::{Config, CrawlOverrides, CrawlerConfig, OutputConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, resolve_config};
pub use validation::{validate, validate_base_url};
