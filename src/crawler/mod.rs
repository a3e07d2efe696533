//! Crawler module for walking the registry listing
//!
//! This module contains the core crawling logic, including:
//! - The collaborator traits the engine drives
//! - Bounded retry with short/long backoff
//! - Page-link widget rules
//! - The crawl state machine

mod engine;
mod pagination;
mod retry;
pub mod traits;

pub use engine::{CrawlEngine, CrawlReport};
pub use pagination::{is_last_page, next_page_target, NEXT_CONTROL_SLOT};
pub use retry::{no_recovery, ExhaustedError, RetryPolicy};
pub use traits::{
    ItemRef, LinkSlot, ListingPage, ListingRow, Navigator, PageReader, PageSnapshot, PageTarget,
    PageWindow,
};

use crate::browser::BrowserSession;
use crate::config::Config;
use crate::query::Query;
use crate::reader::RegistryPageReader;
use crate::storage::FsRecordStore;
use crate::HarvestError;

/// Runs a complete crawl of one query
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open the record store under the collect path
/// 2. Launch the browser
/// 3. Walk every listing page, capturing items not yet on disk
/// 4. Write the consolidated artifact
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `config_hash` - Hash of the configuration file, recorded in the artifact
/// * `query` - The search term
pub async fn crawl(
    config: &Config,
    config_hash: Option<String>,
    query: &Query,
) -> Result<CrawlReport, HarvestError> {
    let mut store = FsRecordStore::open(&config.output.collect_path)?;
    if let Some(hash) = config_hash {
        store = store.with_config_hash(hash);
    }

    let session = BrowserSession::launch(&config.browser, &config.timing).await?;
    let mut engine = CrawlEngine::new(session, RegistryPageReader::new(), store, config);
    let result = engine.run(query).await;

    let (session, _, _) = engine.into_parts();
    session.close().await;
    result
}
