//! Consolidated artifact schema
//!
//! This module contains the SQL schema of the per-query SQLite artifact
//! written when a crawl finishes.

/// SQL schema for the consolidated artifact
pub const SCHEMA_SQL: &str = r#"
-- One row describing the run that produced this artifact
CREATE TABLE IF NOT EXISTS run (
    query_key TEXT PRIMARY KEY,
    config_hash TEXT,
    item_count INTEGER NOT NULL,
    finalized_at TEXT NOT NULL
);

-- Every item record captured under the query
CREATE TABLE IF NOT EXISTS items (
    item_id TEXT PRIMARY KEY,
    company_id TEXT NOT NULL,
    captured_at TEXT NOT NULL,
    fields TEXT NOT NULL,
    record TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_items_company ON items(company_id);
"#;

/// Initializes the artifact schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
