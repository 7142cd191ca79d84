//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Initializing storage and the record sinks
//! - Dispatching tagged requests as concurrent tasks
//! - Emitting records and spawning child requests as responses arrive
//! - Recording error statistics and generating final output

use crate::config::Config;
use crate::crawler::context::{attach, AncestorChain, TaggedRequest};
use crate::crawler::fetcher::{build_http_client, FetchError, HttpTransport, Transport};
use crate::crawler::request;
use crate::crawler::stage::{Stage, StageOutcome, StageProcessor};
use crate::model::EntityKind;
use crate::output::{
    generate_markdown_summary, summarize_run, ErrorRatio, ErrorStats, FanOutSink, JsonLinesSink,
    RecordSink, SharedStorage, SqliteSink,
};
use crate::storage::{RunStatus, RunTotals, SqliteStorage, Storage};
use crate::CatalogError;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// A request whose branch ended at the transport
#[derive(Debug)]
struct FailedRequest {
    stage: Stage,
    context: AncestorChain,
    error: FetchError,
}

type TaskResult = Result<StageOutcome, FailedRequest>;

/// Totals of a finished crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub records_emitted: u64,
    pub requests_dispatched: u64,
    pub requests_failed: u64,
    pub ratios: BTreeMap<EntityKind, ErrorRatio>,
    pub elapsed: Duration,
}

impl CrawlReport {
    pub fn totals(&self) -> RunTotals {
        RunTotals {
            requests_dispatched: self.requests_dispatched,
            requests_failed: self.requests_failed,
        }
    }
}

/// Main crawler coordinator structure
///
/// Every tagged request runs as its own task: acquire a permit, fetch, release
/// the permit, then parse with the stage processor. Outcomes are drained on
/// the coordinator's task, which alone owns the sink.
pub struct Coordinator<T: Transport, S: RecordSink> {
    transport: Arc<T>,
    sink: S,
    processor: StageProcessor,
    limiter: Arc<Semaphore>,
    totals: RunTotals,
}

impl<T: Transport, S: RecordSink> Coordinator<T, S> {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `transport` - Performs the requests
    /// * `sink` - Receives every emitted record
    /// * `processor` - Parses responses and holds the shared error statistics
    /// * `max_concurrent` - Upper bound on requests in flight
    pub fn new(transport: T, sink: S, processor: StageProcessor, max_concurrent: usize) -> Self {
        Self {
            transport: Arc::new(transport),
            sink,
            processor,
            limiter: Arc::new(Semaphore::new(max_concurrent.max(1))),
            totals: RunTotals::default(),
        }
    }

    /// Request counters of the current or last run, kept when a run aborts
    pub fn totals(&self) -> RunTotals {
        self.totals
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Runs the crawl loop from a root request until no request is pending
    ///
    /// A failed request ends only its own branch. A sink failure aborts the
    /// whole crawl; in-flight tasks are cancelled when the set is dropped.
    pub async fn run(&mut self, root: TaggedRequest) -> Result<CrawlReport, CatalogError> {
        let start_time = Instant::now();
        let mut tasks: JoinSet<TaskResult> = JoinSet::new();

        let mut records_emitted = 0u64;
        self.totals = RunTotals::default();

        self.spawn(&mut tasks, root);
        self.totals.requests_dispatched += 1;

        while let Some(joined) = tasks.join_next().await {
            let result = match joined {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!("Request task did not complete: {}", e);
                    self.totals.requests_failed += 1;
                    continue;
                }
            };

            match result {
                Ok(outcome) => {
                    for record in &outcome.records {
                        self.sink.emit(record)?;
                        records_emitted += 1;
                    }
                    for child in outcome.children {
                        self.spawn(&mut tasks, child);
                        self.totals.requests_dispatched += 1;
                    }
                }
                Err(failed) => {
                    self.totals.requests_failed += 1;
                    tracing::warn!(
                        "{} request failed, dropping branch {:?}: {}",
                        failed.stage,
                        failed.context,
                        failed.error
                    );
                }
            }

            let completed = self.totals.requests_dispatched - tasks.len() as u64;
            if completed % 100 == 0 {
                let rate = completed as f64 / start_time.elapsed().as_secs_f64().max(f64::EPSILON);
                tracing::info!(
                    "Progress: {} requests completed, {} pending, {} records, {:.2} requests/sec",
                    completed,
                    tasks.len(),
                    records_emitted,
                    rate
                );
            }
        }

        self.sink.flush()?;

        let report = CrawlReport {
            records_emitted,
            requests_dispatched: self.totals.requests_dispatched,
            requests_failed: self.totals.requests_failed,
            ratios: self.processor.stats().snapshot(),
            elapsed: start_time.elapsed(),
        };

        tracing::info!(
            "Crawl completed: {} records from {} requests ({} failed) in {:?}",
            report.records_emitted,
            report.requests_dispatched,
            report.requests_failed,
            report.elapsed
        );

        Ok(report)
    }

    fn spawn(&self, tasks: &mut JoinSet<TaskResult>, request: TaggedRequest) {
        let transport = Arc::clone(&self.transport);
        let limiter = Arc::clone(&self.limiter);
        let processor = self.processor.clone();

        tasks.spawn(async move {
            let (stage, spec, context) = request.recover();
            tracing::debug!("Dispatching {} request {:?}", stage, spec.query);

            let fetched = {
                let _permit = limiter.acquire().await.ok();
                transport.fetch(&spec).await
            };

            match fetched {
                Ok(body) => Ok(processor.process(stage, &body, &context)),
                Err(error) => Err(FailedRequest {
                    stage,
                    context,
                    error,
                }),
            }
        });
    }
}

/// The request every crawl starts from
pub fn root_request(year: u32) -> TaggedRequest {
    attach(
        AncestorChain::root(year),
        Stage::FacultyList,
        request::bootstrap(),
    )
}

/// Runs the main crawl operation
///
/// This function orchestrates the entire crawl process:
///
/// 1. Open storage and create a run
/// 2. Build the HTTP transport
/// 3. Assemble the record sinks (SQLite, optional JSON lines)
/// 4. Crawl from the faculty list down to every group
/// 5. Store error statistics and mark the run completed
/// 6. Write the markdown summary
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `config_hash` - Hash of the configuration file, stored with the run
///
/// # Example
///
/// ```no_run
/// use catalog_ripple::config::load_config_with_hash;
/// use catalog_ripple::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("config.toml"))?;
/// run_crawl(config, &hash).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, config_hash: &str) -> Result<CrawlReport, CatalogError> {
    let year = config.filters.year;

    // Initialize storage
    let mut storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let run_id = storage.create_run(config_hash, year)?;
    let storage: SharedStorage = Arc::new(Mutex::new(storage));
    tracing::info!("Starting crawl run {} for year {}", run_id, year);

    // Build transport
    let client = build_http_client(&config.user_agent, config.crawler.timeout())?;
    let endpoint = Url::parse(&config.site.endpoint)?;
    let transport = HttpTransport::new(client, endpoint)
        .with_retries(config.crawler.max_retries, config.crawler.retry_delay());

    // Assemble sinks
    let mut sinks = FanOutSink::new();
    sinks.push(Box::new(SqliteSink::new(Arc::clone(&storage), run_id)));
    if let Some(records_path) = &config.output.records_path {
        tracing::info!("Exporting records to {}", records_path);
        sinks.push(Box::new(JsonLinesSink::create(Path::new(records_path))?));
    }

    let stats = Arc::new(ErrorStats::new());
    let processor = StageProcessor::new(
        config.filters.stage_filters(),
        config.crawler.extract_options(),
        Arc::clone(&stats),
    );
    let mut coordinator = Coordinator::new(
        transport,
        sinks,
        processor,
        config.crawler.max_concurrent_requests,
    );

    let run_handle = SqliteSink::new(Arc::clone(&storage), run_id);
    let report = match coordinator.run(root_request(year)).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl run {} failed: {}", run_id, e);
            let totals = coordinator.totals();
            if let Err(finalize_err) = run_handle.finalize(RunStatus::Failed, totals, &stats.snapshot()) {
                tracing::error!("Failed to record run failure: {}", finalize_err);
            }
            return Err(e);
        }
    };

    run_handle.finalize(RunStatus::Completed, report.totals(), &report.ratios)?;

    // Generate summary
    let summary = {
        let storage = storage
            .lock()
            .map_err(|e| CatalogError::Storage(format!("Failed to lock storage: {}", e)))?;
        summarize_run(&*storage, run_id)?
    };
    generate_markdown_summary(&summary, Path::new(&config.output.summary_path))?;
    tracing::info!("Summary written to {}", config.output.summary_path);

    for (kind, ratio) in &report.ratios {
        if ratio.error_count > 0 {
            tracing::info!(
                "{}: {} of {} units skipped ({:.2}%)",
                kind,
                ratio.error_count,
                ratio.total_count,
                ratio.error_ratio * 100.0
            );
        }
    }

    Ok(report)
}
