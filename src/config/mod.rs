//! Configuration module for Registry-Harvester
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file holding retry budgets, settle delays, and paths.
//!
//! # Example
//!
//! ```no_run
//! use registry_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvester.toml")).unwrap();
//! println!("Item attempts: {}", config.retry.item_attempts);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserConfig, Config, OutputConfig, RetryConfig, TimingConfig, DEFAULT_ENTRY_URL,
};

// Re-export parser functions
pub use parser::{config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
