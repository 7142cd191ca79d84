//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::model::{EntityKind, Record};
use crate::output::ErrorRatio;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus, RunTotals};
use crate::CatalogError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::Path;

const RUN_COLUMNS: &str = "id, started_at, finished_at, config_hash, target_year, status,
     requests_dispatched, requests_failed";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(CatalogError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, CatalogError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, CatalogError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        target_year: row.get(4)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(5)?).unwrap_or(RunStatus::Failed),
        totals: RunTotals {
            requests_dispatched: row.get::<_, i64>(6)? as u64,
            requests_failed: row.get::<_, i64>(7)? as u64,
        },
    })
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str, target_year: u32) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, target_year, status) VALUES (?1, ?2, ?3, ?4)",
            params![
                now,
                config_hash,
                target_year,
                RunStatus::Running.to_db_string()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS),
                [],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        totals: RunTotals,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, requests_dispatched = ?3,
             requests_failed = ?4 WHERE id = ?5",
            params![
                status.to_db_string(),
                now,
                totals.requests_dispatched as i64,
                totals.requests_failed as i64,
                run_id
            ],
        )?;
        Ok(())
    }

    // ===== Records =====

    fn insert_record(&mut self, run_id: i64, record: &Record) -> StorageResult<()> {
        let payload = serde_json::to_string(record)?;
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO records (run_id, item_type, payload, emitted_at) VALUES (?1, ?2, ?3, ?4)",
            params![run_id, record.item_type(), payload, now],
        )?;
        Ok(())
    }

    fn count_records(&self, run_id: i64, item_type: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM records WHERE run_id = ?1 AND item_type = ?2",
            params![run_id, item_type],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_records_by_type(&self, run_id: i64) -> StorageResult<BTreeMap<String, u64>> {
        let mut stmt = self.conn.prepare(
            "SELECT item_type, COUNT(*) FROM records WHERE run_id = ?1 GROUP BY item_type",
        )?;

        let counts = stmt
            .query_map(params![run_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(counts)
    }

    fn get_records(&self, run_id: i64, item_type: &str) -> StorageResult<Vec<Record>> {
        let mut stmt = self.conn.prepare(
            "SELECT payload FROM records WHERE run_id = ?1 AND item_type = ?2 ORDER BY id",
        )?;

        let payloads = stmt
            .query_map(params![run_id, item_type], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        payloads
            .iter()
            .map(|payload| serde_json::from_str(payload).map_err(StorageError::from))
            .collect()
    }

    // ===== Error Statistics =====

    fn save_error_stats(
        &mut self,
        run_id: i64,
        ratios: &BTreeMap<EntityKind, ErrorRatio>,
    ) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        for (kind, ratio) in ratios {
            tx.execute(
                "INSERT OR REPLACE INTO error_stats (run_id, entity, error_count, total_count)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    run_id,
                    kind.to_db_string(),
                    ratio.error_count as i64,
                    ratio.total_count as i64
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn load_error_stats(&self, run_id: i64) -> StorageResult<BTreeMap<EntityKind, ErrorRatio>> {
        let mut stmt = self.conn.prepare(
            "SELECT entity, error_count, total_count FROM error_stats WHERE run_id = ?1",
        )?;

        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)? as u64,
                    row.get::<_, i64>(2)? as u64,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut ratios = BTreeMap::new();
        for (entity, errors, total) in rows {
            match EntityKind::from_db_string(&entity) {
                Some(kind) => {
                    ratios.insert(kind, ErrorRatio::new(errors, total));
                }
                None => tracing::warn!("Ignoring unknown entity '{}' in error_stats", entity),
            }
        }
        Ok(ratios)
    }
}
