//! Record sink traits and types
//!
//! This module defines the trait interface for record sinks and the data
//! structure behind the crawl summary report.

use crate::model::{EntityKind, Record};
use crate::output::stats::ErrorRatio;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Trait for record sinks
///
/// A sink receives every emitted record, in emission order. It is owned by
/// the crawl coordinator and never shared between tasks.
pub trait RecordSink {
    /// Delivers one record
    fn emit(&mut self, record: &Record) -> OutputResult<()>;

    /// Flushes buffered output at the end of a run
    fn flush(&mut self) -> OutputResult<()> {
        Ok(())
    }
}

impl<S: RecordSink + ?Sized> RecordSink for Box<S> {
    fn emit(&mut self, record: &Record) -> OutputResult<()> {
        (**self).emit(record)
    }

    fn flush(&mut self) -> OutputResult<()> {
        (**self).flush()
    }
}

/// Sink that forwards every record to each of its inner sinks
#[derive(Default)]
pub struct FanOutSink {
    sinks: Vec<Box<dyn RecordSink + Send>>,
}

impl FanOutSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sink to the fan-out
    pub fn push(&mut self, sink: Box<dyn RecordSink + Send>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl RecordSink for FanOutSink {
    fn emit(&mut self, record: &Record) -> OutputResult<()> {
        for sink in &mut self.sinks {
            sink.emit(record)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        for sink in &mut self.sinks {
            sink.flush()?;
        }
        Ok(())
    }
}

/// Sink that keeps every record in memory
#[derive(Debug, Default)]
pub struct VecSink {
    pub records: Vec<Record>,
}

impl RecordSink for VecSink {
    fn emit(&mut self, record: &Record) -> OutputResult<()> {
        self.records.push(record.clone());
        Ok(())
    }
}

/// Summary data for a crawl run
#[derive(Debug, Clone, Default)]
pub struct CrawlSummary {
    // Run metadata
    pub run_id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub duration_seconds: Option<u64>,
    pub status: String,
    pub config_hash: String,
    pub target_year: u32,

    // Request totals
    pub requests_dispatched: u64,
    pub requests_failed: u64,

    // Emitted records (item type -> count)
    pub records_by_type: BTreeMap<String, u64>,

    // Error accounting per entity type
    pub error_ratios: BTreeMap<EntityKind, ErrorRatio>,
}

impl CrawlSummary {
    /// Creates a new empty crawl summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of emitted records
    pub fn total_records(&self) -> u64 {
        self.records_by_type.values().sum()
    }

    /// Returns the total number of units that failed extraction
    pub fn total_extraction_errors(&self) -> u64 {
        self.error_ratios.values().map(|r| r.error_count).sum()
    }

    /// Returns the request success rate as a percentage
    pub fn request_success_rate(&self) -> f64 {
        if self.requests_dispatched == 0 {
            return 0.0;
        }
        let succeeded = self.requests_dispatched.saturating_sub(self.requests_failed);
        (succeeded as f64 / self.requests_dispatched as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Faculty;
    use std::sync::{Arc, Mutex};

    /// Sink whose records stay visible after it is boxed into a fan-out
    struct SharedSink(Arc<Mutex<Vec<Record>>>);

    impl RecordSink for SharedSink {
        fn emit(&mut self, record: &Record) -> OutputResult<()> {
            self.0.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    fn faculty(id: u32) -> Record {
        Record::Faculty(Faculty {
            id,
            name: format!("Faculty {}", id),
        })
    }

    #[test]
    fn test_crawl_summary_new() {
        let summary = CrawlSummary::new();
        assert_eq!(summary.total_records(), 0);
        assert_eq!(summary.total_extraction_errors(), 0);
    }

    #[test]
    fn test_request_success_rate() {
        let mut summary = CrawlSummary::new();
        summary.requests_dispatched = 80;
        summary.requests_failed = 20;

        let rate = summary.request_success_rate();
        assert!((rate - 75.0).abs() < 0.01);
    }

    #[test]
    fn test_request_success_rate_zero_requests() {
        let summary = CrawlSummary::new();
        assert_eq!(summary.request_success_rate(), 0.0);
    }

    #[test]
    fn test_total_extraction_errors() {
        let mut summary = CrawlSummary::new();
        summary
            .error_ratios
            .insert(EntityKind::Course, ErrorRatio::new(3, 10));
        summary
            .error_ratios
            .insert(EntityKind::Exam, ErrorRatio::new(2, 5));
        assert_eq!(summary.total_extraction_errors(), 5);
    }

    #[test]
    fn test_fan_out_reaches_every_sink() {
        let first = Arc::new(Mutex::new(Vec::new()));
        let second = Arc::new(Mutex::new(Vec::new()));

        let mut fan_out = FanOutSink::new();
        fan_out.push(Box::new(SharedSink(Arc::clone(&first))));
        fan_out.push(Box::new(SharedSink(Arc::clone(&second))));
        assert_eq!(fan_out.len(), 2);

        fan_out.emit(&faculty(1)).unwrap();
        fan_out.emit(&faculty(2)).unwrap();
        fan_out.flush().unwrap();

        assert_eq!(*first.lock().unwrap(), vec![faculty(1), faculty(2)]);
        assert_eq!(*second.lock().unwrap(), vec![faculty(1), faculty(2)]);
    }

    #[test]
    fn test_vec_sink_keeps_order() {
        let mut sink = VecSink::default();
        sink.emit(&faculty(2)).unwrap();
        sink.emit(&faculty(1)).unwrap();
        assert_eq!(sink.records, vec![faculty(2), faculty(1)]);
    }
}
