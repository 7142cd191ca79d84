//! SQLite-based record sink implementation
//!
//! This module provides a sink that appends emitted records to the SQLite
//! storage backend under the current run.

use crate::model::{EntityKind, Record};
use crate::output::stats::ErrorRatio;
use crate::output::traits::{OutputError, OutputResult, RecordSink};
use crate::storage::{RunStatus, RunTotals, Storage};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared handle to a storage backend
pub type SharedStorage = Arc<Mutex<dyn Storage + Send>>;

/// SQLite-based record sink
///
/// Records are written straight into the `records` table. The storage handle
/// is shared with the caller so the run can be finalized and summarized once
/// the crawl is over.
pub struct SqliteSink {
    storage: SharedStorage,
    run_id: i64,
}

impl SqliteSink {
    /// Creates a new SQLite sink
    ///
    /// # Arguments
    ///
    /// * `storage` - The storage backend to use
    /// * `run_id` - The current run ID
    pub fn new(storage: SharedStorage, run_id: i64) -> Self {
        Self { storage, run_id }
    }

    fn lock(&self) -> MutexGuard<'_, dyn Storage + Send + 'static> {
        self.storage
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Finalizes the run: stores error statistics, the final status and the
    /// request totals reached
    ///
    /// # Arguments
    ///
    /// * `status` - The final status of the crawl run
    /// * `totals` - Request counters of the run
    /// * `ratios` - Final error statistics snapshot
    pub fn finalize(
        &self,
        status: RunStatus,
        totals: RunTotals,
        ratios: &BTreeMap<EntityKind, ErrorRatio>,
    ) -> OutputResult<()> {
        let mut storage = self.lock();

        storage.save_error_stats(self.run_id, ratios)?;
        storage.finish_run(self.run_id, status, totals)?;

        Ok(())
    }
}

impl RecordSink for SqliteSink {
    fn emit(&mut self, record: &Record) -> OutputResult<()> {
        self.lock()
            .insert_record(self.run_id, record)
            .map_err(OutputError::from)
    }
}
