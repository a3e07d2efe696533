//! Storage module for persisting captured records
//!
//! This module handles everything the crawl writes to disk:
//! - One JSON file per record, partitioned by record kind
//! - The idempotency check the engine uses to resume a query
//! - The consolidated SQLite artifact written when a query finishes

mod fs_store;
mod layout;
mod schema;
mod sqlite;
mod traits;

pub use fs_store::FsRecordStore;
pub use layout::{company_stem, item_stem, Layout, RecordKind};
pub use sqlite::{ArtifactRun, ConsolidatedArtifact};
pub use traits::{ItemKey, RecordStore, StorageError, StorageResult};
