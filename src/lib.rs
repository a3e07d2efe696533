//! Registry-Harvester: a resumable collector for the food-safety product registry
//!
//! This crate drives a paginated registry search listing, visits every item's
//! detail and company pages, and persists the scraped tables as per-record
//! files. Re-running a query resumes where the previous run stopped.

pub mod browser;
pub mod config;
pub mod crawler;
pub mod output;
pub mod query;
pub mod reader;
pub mod record;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Registry-Harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("{0}")]
    Exhausted(#[from] crawler::ExhaustedError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::EngineState,
        to: state::EngineState,
    },
}

/// Failure of a single fallible crawl step
///
/// Every variant is treated as transient by the retry envelope wrapping the
/// step; the variant only matters for diagnostics.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("unexpected page shape: {0}")]
    ExtractionShape(String),

    #[error("persistence failed: {0}")]
    Persistence(#[from] storage::StorageError),
}

impl StepError {
    pub fn navigation(message: impl Into<String>) -> Self {
        Self::Navigation(message.into())
    }

    pub fn shape(message: impl Into<String>) -> Self {
        Self::ExtractionShape(message.into())
    }

    /// Short category name used in logs and the terminal diagnostic
    pub fn category(&self) -> &'static str {
        match self {
            Self::Navigation(_) => "navigation",
            Self::ExtractionShape(_) => "extraction-shape",
            Self::Persistence(_) => "persistence",
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for a single crawl step
pub type StepResult<T> = std::result::Result<T, StepError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlEngine, CrawlReport, RetryPolicy};
pub use query::{Query, QueryKey};
pub use state::{CrawlState, EngineState};
