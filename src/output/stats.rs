//! Error statistics collection and display
//!
//! This module provides the concurrent per-entity success/error counters used
//! during a crawl, and functionality for extracting and displaying the stored
//! statistics of a finished run.

use crate::model::EntityKind;
use crate::storage::{RunRecord, Storage};
use crate::CatalogError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
struct Counter {
    successes: AtomicU64,
    errors: AtomicU64,
}

/// Per-entity success and error counters
///
/// Shared between concurrent stage tasks behind an `Arc`. Every key starts at
/// zero, so an entity type that never appeared reports `0 / 0`.
#[derive(Debug, Default)]
pub struct ErrorStats {
    counters: [Counter; EntityKind::ALL.len()],
}

impl ErrorStats {
    /// Creates a collector with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one successfully extracted unit
    pub fn add_success(&self, kind: EntityKind) {
        self.add_successes(kind, 1);
    }

    /// Records `count` successfully extracted units
    pub fn add_successes(&self, kind: EntityKind, count: u64) {
        self.counters[kind.index()]
            .successes
            .fetch_add(count, Ordering::Relaxed);
    }

    /// Records one unit that failed extraction
    pub fn add_error(&self, kind: EntityKind) {
        self.counters[kind.index()]
            .errors
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the ratio for a single entity type
    pub fn ratio(&self, kind: EntityKind) -> ErrorRatio {
        let counter = &self.counters[kind.index()];
        let errors = counter.errors.load(Ordering::Relaxed);
        let successes = counter.successes.load(Ordering::Relaxed);
        ErrorRatio::new(errors, successes + errors)
    }

    /// Returns the error ratio of every entity type
    pub fn ratios(&self) -> BTreeMap<EntityKind, ErrorRatio> {
        EntityKind::ALL
            .iter()
            .map(|&kind| (kind, self.ratio(kind)))
            .collect()
    }

    /// Takes the final snapshot once all tasks have finished
    ///
    /// Identical to [`ErrorStats::ratios`]; the name marks the call site where
    /// the counters are known to be quiescent.
    pub fn snapshot(&self) -> BTreeMap<EntityKind, ErrorRatio> {
        self.ratios()
    }
}

/// Error accounting for one entity type
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ErrorRatio {
    pub error_count: u64,
    pub total_count: u64,
    pub error_ratio: f64,
}

impl ErrorRatio {
    /// Builds a ratio; an empty total gives a ratio of zero
    pub fn new(error_count: u64, total_count: u64) -> Self {
        let error_ratio = if total_count == 0 {
            0.0
        } else {
            error_count as f64 / total_count as f64
        };
        Self {
            error_count,
            total_count,
            error_ratio,
        }
    }
}

/// Statistics of the most recent crawl run
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// The run the statistics belong to
    pub run: RunRecord,

    /// Emitted records per item type
    pub records_by_type: BTreeMap<String, u64>,

    /// Error ratio per entity type
    pub error_ratios: BTreeMap<EntityKind, ErrorRatio>,
}

impl CrawlStatistics {
    /// Total number of emitted records
    pub fn total_records(&self) -> u64 {
        self.records_by_type.values().sum()
    }
}

/// Loads the statistics of the latest run from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(CatalogError)` - No run stored, or the query failed
pub fn load_statistics(storage: &dyn Storage) -> Result<CrawlStatistics, CatalogError> {
    let run = storage
        .get_latest_run()?
        .ok_or_else(|| CatalogError::Storage("No crawl runs found in database".to_string()))?;

    let records_by_type = storage.count_records_by_type(run.id)?;
    let error_ratios = storage.load_error_stats(run.id)?;

    Ok(CrawlStatistics {
        run,
        records_by_type,
        error_ratios,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Run:");
    println!("  ID: {}", stats.run.id);
    println!("  Target year: {}", stats.run.target_year);
    println!("  Status: {}", stats.run.status.to_db_string());
    println!(
        "  Requests: {} dispatched, {} failed",
        stats.run.totals.requests_dispatched, stats.run.totals.requests_failed
    );
    println!();

    println!("Records by Type:");
    for (item_type, count) in &stats.records_by_type {
        println!("  {}: {}", item_type, count);
    }
    println!("  Total: {}", stats.total_records());
    println!();

    if !stats.error_ratios.is_empty() {
        println!("Error Ratios:");
        for (kind, ratio) in &stats.error_ratios {
            println!(
                "  {}: {} / {} ({:.1}%)",
                kind,
                ratio.error_count,
                ratio.total_count,
                ratio.error_ratio * 100.0
            );
        }
    }
}
