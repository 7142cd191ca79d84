use crate::crawler::StageFilters;
use crate::extract::ExtractOptions;
use serde::Deserialize;
use std::time::Duration;

/// Catalog year crawled when neither the config nor the CLI names one
pub const DEFAULT_YEAR: u32 = 2016;

/// Main configuration structure for Catalog-Ripple
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

impl Config {
    /// Replaces the configured filters with any given on the command line
    pub fn apply_overrides(&mut self, faculty: Option<u32>, track: Option<u32>, year: Option<u32>) {
        if faculty.is_some() {
            self.filters.faculty = faculty;
        }
        if track.is_some() {
            self.filters.track = track;
        }
        if let Some(year) = year {
            self.filters.year = year;
        }
    }
}

/// Registration site configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Full URL of the `fireflyweb.aspx` endpoint every request goes to
    pub endpoint: String,
}

/// Which part of the catalog to crawl
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    /// Only follow this faculty's tracks
    pub faculty: Option<u32>,

    /// Only follow this track's programs
    pub track: Option<u32>,

    /// Catalog year to crawl
    #[serde(default = "default_year")]
    pub year: u32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            faculty: None,
            track: None,
            year: DEFAULT_YEAR,
        }
    }
}

impl FilterConfig {
    pub fn stage_filters(&self) -> StageFilters {
        StageFilters {
            faculty: self.faculty,
            track: self.track,
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of requests in flight at once
    #[serde(rename = "max-concurrent-requests", default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Value stored for points/hours that are not numbers
    #[serde(rename = "numeric-default", default)]
    pub numeric_default: f64,

    /// Retries of a request after a timeout or a 5xx response
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay between retries (milliseconds)
    #[serde(rename = "retry-delay", default = "default_retry_delay")]
    pub retry_delay: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: default_max_concurrent(),
            request_timeout: default_request_timeout(),
            numeric_default: 0.0,
            max_retries: default_max_retries(),
            retry_delay: default_retry_delay(),
        }
    }
}

impl CrawlerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay)
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            numeric_default: self.numeric_default,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the markdown summary file
    #[serde(rename = "summary-path")]
    pub summary_path: String,

    /// Optional JSON-lines export of every emitted record
    #[serde(rename = "records-path", default)]
    pub records_path: Option<String>,
}

fn default_year() -> u32 {
    DEFAULT_YEAR
}

fn default_max_concurrent() -> usize {
    8
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_delay() -> u64 {
    1000
}
