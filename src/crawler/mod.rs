//! Crawler module for catalog traversal
//!
//! This module contains the core crawling logic, including:
//! - The ancestor chain carried from each stage to the next
//! - The site's request protocol and request builders
//! - The stage state machine that turns responses into records and requests
//! - HTTP transport
//! - Overall crawl coordination

mod context;
mod coordinator;
mod fetcher;
pub mod protocol;
pub mod request;
mod stage;

pub use context::{attach, AncestorChain, TaggedRequest};
pub use coordinator::{root_request, run_crawl, Coordinator, CrawlReport};
pub use fetcher::{build_http_client, FetchError, HttpTransport, Transport};
pub use request::{HttpMethod, RequestSpec};
pub use stage::{Stage, StageFilters, StageOutcome, StageProcessor};

use crate::config::Config;
use crate::CatalogError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Initialize the storage layer and create a run
/// 2. Build the HTTP transport
/// 3. Walk faculties, tracks, programs, courses and groups
/// 4. Store records and error statistics
/// 5. Generate summary output
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `config_hash` - Hash of the configuration file
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl completed
/// * `Err(CatalogError)` - Crawl failed
pub async fn crawl(config: Config, config_hash: &str) -> Result<CrawlReport, CatalogError> {
    run_crawl(config, config_hash).await
}
