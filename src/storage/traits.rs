//! Storage traits and error types
//!
//! This module defines the trait interface for record stores and
//! associated error types.

use crate::query::QueryKey;
use crate::record::{CompanyRecord, ItemRecord};
use crate::storage::layout::item_stem;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Record not found: {0}")]
    NotFound(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Stable identity of one item within one query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemKey {
    pub query_key: QueryKey,
    pub item_id: String,
}

impl ItemKey {
    pub fn new(query_key: &QueryKey, item_id: &str) -> Self {
        Self {
            query_key: query_key.clone(),
            item_id: item_id.to_string(),
        }
    }

    /// File stem `{queryKey}_{itemID}`
    pub fn stem(&self) -> String {
        item_stem(self.query_key.as_str(), &self.item_id)
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stem())
    }
}

/// Trait for record store implementations
///
/// The presence of an item record is the only completion signal the crawl
/// engine relies on, so `put_item` must be the last write for an item.
pub trait RecordStore {
    /// Returns true if the item has already been fully captured
    ///
    /// Must not have side effects.
    fn exists(&self, key: &ItemKey) -> bool;

    /// Persists a company record and its sub-tables
    fn put_company(&mut self, record: &CompanyRecord) -> StorageResult<()>;

    /// Persists an item record and its sub-tables, item file last
    fn put_item(&mut self, record: &ItemRecord) -> StorageResult<()>;

    /// Reads back a previously captured item
    fn load_item(&self, key: &ItemKey) -> StorageResult<ItemRecord>;

    /// Aggregates every item record of a query into one artifact
    ///
    /// # Returns
    ///
    /// The path of the written artifact
    fn finalize_query(
        &mut self,
        query_key: &QueryKey,
        records: &[ItemRecord],
    ) -> StorageResult<PathBuf>;
}
