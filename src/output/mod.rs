//! Output module for run summaries
//!
//! Per-record files and the consolidated artifact are written by `storage`;
//! this module only reports on a finished run.

pub mod stats;

pub use stats::{print_statistics, CrawlStats};
