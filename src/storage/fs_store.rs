//! File-tree record store
//!
//! Implements `RecordStore` over the directory layout in `layout`. Each file
//! is written to a temporary sibling and renamed into place, so a crash never
//! leaves a half-written record behind.

use crate::query::QueryKey;
use crate::record::{CompanyRecord, ItemRecord, Table};
use crate::storage::layout::{company_stem, item_stem, Layout, RecordKind};
use crate::storage::sqlite::ConsolidatedArtifact;
use crate::storage::traits::{ItemKey, RecordStore, StorageError, StorageResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One sub-table persisted in its own partition
#[derive(Debug, Serialize)]
struct TableFile<'a> {
    query_key: &'a str,
    item_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    company_id: Option<&'a str>,
    columns: &'a [String],
    rows: &'a [Vec<String>],
    captured_at: DateTime<Utc>,
}

/// Record store writing one JSON file per record
pub struct FsRecordStore {
    layout: Layout,
    config_hash: Option<String>,
}

impl FsRecordStore {
    /// Opens the store rooted at `root`, creating every partition directory
    pub fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let layout = Layout::new(root);
        layout.create_dirs()?;
        Ok(Self {
            layout,
            config_hash: None,
        })
    }

    /// Records the configuration hash in finalized artifacts
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    #[allow(clippy::too_many_arguments)]
    fn write_table(
        &self,
        kind: RecordKind,
        stem: &str,
        query_key: &str,
        item_id: &str,
        company_id: Option<&str>,
        table: &Table,
        captured_at: DateTime<Utc>,
    ) -> StorageResult<()> {
        let file = TableFile {
            query_key,
            item_id,
            company_id,
            columns: &table.columns,
            rows: &table.rows,
            captured_at,
        };
        write_json_atomic(&self.layout.record_path(kind, stem), &file)
    }
}

/// Serializes `value` next to `path` and renames it into place
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> StorageResult<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

impl RecordStore for FsRecordStore {
    fn exists(&self, key: &ItemKey) -> bool {
        self.layout
            .record_path(RecordKind::Item, &key.stem())
            .is_file()
    }

    fn put_company(&mut self, record: &CompanyRecord) -> StorageResult<()> {
        let stem = company_stem(
            &record.query_key,
            &record.referring_item_id,
            &record.registration_id,
        );
        let (query_key, item_id) = (&record.query_key, &record.referring_item_id);
        let company_id = Some(record.registration_id.as_str());

        if let Some(haccp) = &record.haccp {
            self.write_table(
                RecordKind::CompanyHaccp,
                &stem,
                query_key,
                item_id,
                company_id,
                haccp,
                record.captured_at,
            )?;
        }
        for (kind, table) in [
            (RecordKind::CompanyAuthorization, &record.authorizations),
            (RecordKind::CompanyEnforcement, &record.enforcements),
            (RecordKind::CompanyProduct, &record.products),
        ] {
            self.write_table(
                kind,
                &stem,
                query_key,
                item_id,
                company_id,
                table,
                record.captured_at,
            )?;
        }

        write_json_atomic(&self.layout.record_path(RecordKind::Company, &stem), record)?;
        tracing::debug!("Stored company record {}", stem);
        Ok(())
    }

    fn put_item(&mut self, record: &ItemRecord) -> StorageResult<()> {
        let stem = item_stem(&record.query_key, &record.item_id);
        let (query_key, item_id) = (&record.query_key, &record.item_id);

        self.write_table(
            RecordKind::Authorization,
            &stem,
            query_key,
            item_id,
            None,
            &record.authorizations,
            record.captured_at,
        )?;
        self.write_table(
            RecordKind::Collection,
            &stem,
            query_key,
            item_id,
            None,
            &record.collections,
            record.captured_at,
        )?;
        if let Some(ingredients) = &record.ingredients {
            self.write_table(
                RecordKind::Ingredient,
                &stem,
                query_key,
                item_id,
                None,
                ingredients,
                record.captured_at,
            )?;
        }

        // The item file marks the item complete, so it goes last
        write_json_atomic(&self.layout.record_path(RecordKind::Item, &stem), record)?;
        tracing::debug!("Stored item record {}", stem);
        Ok(())
    }

    fn load_item(&self, key: &ItemKey) -> StorageResult<ItemRecord> {
        let path = self.layout.record_path(RecordKind::Item, &key.stem());
        if !path.is_file() {
            return Err(StorageError::NotFound(key.stem()));
        }
        let bytes = std::fs::read(&path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn finalize_query(
        &mut self,
        query_key: &QueryKey,
        records: &[ItemRecord],
    ) -> StorageResult<PathBuf> {
        let path = self.layout.consolidated_path(query_key);
        let mut artifact = ConsolidatedArtifact::open(&path)?;
        artifact.replace(query_key.as_str(), self.config_hash.as_deref(), records)?;
        tracing::info!(
            "Consolidated {} item records into {}",
            records.len(),
            path.display()
        );
        Ok(path)
    }
}
