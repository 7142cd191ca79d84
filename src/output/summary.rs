//! Crawl summary assembly from storage

use crate::output::traits::CrawlSummary;
use crate::storage::Storage;
use crate::CatalogError;
use chrono::{DateTime, Utc};

/// Generates the summary of the latest crawl run in storage
///
/// # Arguments
///
/// * `storage` - The storage backend containing crawl data
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Successfully generated summary
/// * `Err(CatalogError)` - No run stored, or the query failed
pub fn generate_summary(storage: &dyn Storage) -> Result<CrawlSummary, CatalogError> {
    let run = storage
        .get_latest_run()?
        .ok_or_else(|| CatalogError::Storage("No crawl runs found in database".to_string()))?;
    summarize_run(storage, run.id)
}

/// Generates the summary of a specific run
pub fn summarize_run(storage: &dyn Storage, run_id: i64) -> Result<CrawlSummary, CatalogError> {
    let run = storage.get_run(run_id)?;

    let duration_seconds = run
        .finished_at
        .as_deref()
        .and_then(|finished| duration_between(&run.started_at, finished));

    let mut summary = CrawlSummary::new();
    summary.run_id = run.id;
    summary.started_at = run.started_at;
    summary.finished_at = run.finished_at;
    summary.duration_seconds = duration_seconds;
    summary.status = run.status.to_db_string().to_string();
    summary.config_hash = run.config_hash;
    summary.target_year = run.target_year;
    summary.requests_dispatched = run.totals.requests_dispatched;
    summary.requests_failed = run.totals.requests_failed;
    summary.records_by_type = storage.count_records_by_type(run.id)?;
    summary.error_ratios = storage.load_error_stats(run.id)?;

    Ok(summary)
}

fn duration_between(started: &str, finished: &str) -> Option<u64> {
    let started = started.parse::<DateTime<Utc>>().ok()?;
    let finished = finished.parse::<DateTime<Utc>>().ok()?;
    u64::try_from((finished - started).num_seconds()).ok()
}
