//! SQLite consolidated artifact
//!
//! All item records of a query, gathered into one file at the end of a crawl.
//! Not needed for resuming; the per-record files are the durable state.

use crate::record::ItemRecord;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::StorageResult;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Summary row of a consolidated artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRun {
    pub query_key: String,
    pub config_hash: Option<String>,
    pub item_count: u64,
    pub finalized_at: String,
}

/// Handle on one query's consolidated artifact
pub struct ConsolidatedArtifact {
    conn: Connection,
}

impl ConsolidatedArtifact {
    /// Opens (or creates) the artifact at `path`
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = DELETE;
            PRAGMA synchronous = NORMAL;
        ",
        )?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Creates an in-memory artifact (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Replaces the artifact's contents with `records` in one transaction
    pub fn replace(
        &mut self,
        query_key: &str,
        config_hash: Option<&str>,
        records: &[ItemRecord],
    ) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM items", [])?;
        tx.execute("DELETE FROM run", [])?;

        for record in records {
            let fields = serde_json::to_string(&record.fields)?;
            let full = serde_json::to_string(record)?;
            tx.execute(
                "INSERT OR REPLACE INTO items (item_id, company_id, captured_at, fields, record)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.item_id,
                    record.company_id,
                    record.captured_at.to_rfc3339(),
                    fields,
                    full
                ],
            )?;
        }

        let item_count: i64 = tx.query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
        tx.execute(
            "INSERT INTO run (query_key, config_hash, item_count, finalized_at) VALUES (?1, ?2, ?3, ?4)",
            params![query_key, config_hash, item_count, Utc::now().to_rfc3339()],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// Loads every item record, ordered by item id
    pub fn load_items(&self) -> StorageResult<Vec<ItemRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT record FROM items ORDER BY item_id")?;
        let raw: Vec<String> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<_, _>>()?;

        let mut records = Vec::with_capacity(raw.len());
        for json in raw {
            records.push(serde_json::from_str(&json)?);
        }
        Ok(records)
    }

    /// Gets the run summary, if the artifact has been finalized
    pub fn run(&self) -> StorageResult<Option<ArtifactRun>> {
        let run = self
            .conn
            .query_row(
                "SELECT query_key, config_hash, item_count, finalized_at FROM run LIMIT 1",
                [],
                |row| {
                    Ok(ArtifactRun {
                        query_key: row.get(0)?,
                        config_hash: row.get(1)?,
                        item_count: row.get::<_, i64>(2)? as u64,
                        finalized_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FieldMap, Table};
    use chrono::TimeZone;

    fn record(item_id: &str) -> ItemRecord {
        let mut fields = FieldMap::new();
        fields.insert("제품명".to_string(), format!("과자 {}", item_id));
        ItemRecord {
            query_key: "gwaja".to_string(),
            item_id: item_id.to_string(),
            company_id: "C-1".to_string(),
            listing: FieldMap::new(),
            fields,
            authorizations: Table::default(),
            collections: Table::default(),
            ingredients: None,
            captured_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_replace_and_load() {
        let mut artifact = ConsolidatedArtifact::open_in_memory().unwrap();
        artifact
            .replace("gwaja", Some("abc"), &[record("2"), record("1")])
            .unwrap();

        let items = artifact.load_items().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], record("1"));
        assert_eq!(items[1].item_id, "2");

        let run = artifact.run().unwrap().unwrap();
        assert_eq!(run.query_key, "gwaja");
        assert_eq!(run.config_hash.as_deref(), Some("abc"));
        assert_eq!(run.item_count, 2);
    }

    #[test]
    fn test_replace_discards_previous_contents() {
        let mut artifact = ConsolidatedArtifact::open_in_memory().unwrap();
        artifact
            .replace("gwaja", None, &[record("1"), record("2")])
            .unwrap();
        artifact.replace("gwaja", None, &[record("3")]).unwrap();

        let items = artifact.load_items().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item_id, "3");
        assert_eq!(artifact.run().unwrap().unwrap().item_count, 1);
    }

    #[test]
    fn test_duplicate_item_ids_collapse() {
        let mut artifact = ConsolidatedArtifact::open_in_memory().unwrap();
        artifact
            .replace("gwaja", None, &[record("1"), record("1")])
            .unwrap();
        assert_eq!(artifact.load_items().unwrap().len(), 1);
    }

    #[test]
    fn test_unfinalized_has_no_run() {
        let artifact = ConsolidatedArtifact::open_in_memory().unwrap();
        assert!(artifact.run().unwrap().is_none());
        assert!(artifact.load_items().unwrap().is_empty());
    }
}
