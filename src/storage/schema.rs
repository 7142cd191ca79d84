//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the crawl database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    target_year INTEGER NOT NULL,
    status TEXT NOT NULL,
    requests_dispatched INTEGER NOT NULL DEFAULT 0,
    requests_failed INTEGER NOT NULL DEFAULT 0
);

-- Every emitted catalog record, serialized with its item type
CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    item_type TEXT NOT NULL,
    payload TEXT NOT NULL,
    emitted_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_records_run_type ON records(run_id, item_type);

-- Per-entity error accounting, written once at the end of a run
CREATE TABLE IF NOT EXISTS error_stats (
    run_id INTEGER NOT NULL REFERENCES runs(id),
    entity TEXT NOT NULL,
    error_count INTEGER NOT NULL,
    total_count INTEGER NOT NULL,
    PRIMARY KEY (run_id, entity)
);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
