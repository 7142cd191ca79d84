//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::model::{EntityKind, Record};
use crate::output::ErrorRatio;
use crate::storage::{RunRecord, RunStatus, RunTotals};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Covers run bookkeeping, the emitted record stream and the end-of-run error
/// statistics.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new crawl run and returns its ID
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    /// * `target_year` - Catalog year the run crawls
    fn create_run(&mut self, config_hash: &str, target_year: u32) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Closes a run with its final status, a finish timestamp and the request
    /// totals it reached
    fn finish_run(&mut self, run_id: i64, status: RunStatus, totals: RunTotals)
        -> StorageResult<()>;

    // ===== Records =====

    /// Appends an emitted record to a run
    fn insert_record(&mut self, run_id: i64, record: &Record) -> StorageResult<()>;

    /// Counts the records of one item type in a run
    fn count_records(&self, run_id: i64, item_type: &str) -> StorageResult<u64>;

    /// Counts records per item type in a run
    fn count_records_by_type(&self, run_id: i64) -> StorageResult<BTreeMap<String, u64>>;

    /// Loads the records of one item type in emission order
    fn get_records(&self, run_id: i64, item_type: &str) -> StorageResult<Vec<Record>>;

    // ===== Error Statistics =====

    /// Stores the final error statistics of a run
    fn save_error_stats(
        &mut self,
        run_id: i64,
        ratios: &BTreeMap<EntityKind, ErrorRatio>,
    ) -> StorageResult<()>;

    /// Loads the error statistics of a run
    fn load_error_stats(&self, run_id: i64) -> StorageResult<BTreeMap<EntityKind, ErrorRatio>>;
}
