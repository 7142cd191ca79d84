//! Output module for emitted records, statistics and reports
//!
//! This module handles:
//! - Delivering emitted records to sinks (SQLite, JSON lines)
//! - Collecting per-entity error statistics during a crawl
//! - Generating markdown summaries of crawl results

mod jsonl;
mod markdown;
mod sqlite_output;
pub mod stats;
mod summary;
mod traits;

pub use jsonl::JsonLinesSink;
pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use sqlite_output::{SharedStorage, SqliteSink};
pub use stats::{load_statistics, print_statistics, CrawlStatistics, ErrorRatio, ErrorStats};
pub use summary::{generate_summary, summarize_run};
pub use traits::{CrawlSummary, FanOutSink, OutputError, OutputResult, RecordSink, VecSink};
