//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `EngineState`: the named states of the crawl state machine and its legal transitions
//! - `CrawlState`: transient per-run progress (page number, total count, page flag)

mod crawl_state;
mod engine_state;

// Re-export main types
pub use crawl_state::CrawlState;
pub use engine_state::EngineState;
