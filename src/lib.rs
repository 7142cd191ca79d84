//! Catalog-Ripple: an academic catalog crawler
//!
//! This crate walks the five-level catalog of a course registration site
//! (faculty, track, program, course, group), carrying each parent's identity
//! into the requests for its children and isolating extraction failures to
//! the row, option or table that produced them.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod model;
pub mod output;
pub mod storage;

use thiserror::Error;

/// Main error type for Catalog-Ripple operations
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Failure to turn one structural unit of a response into an entity
///
/// Never fatal: the unit is skipped and counted against its entity type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractionError {
    #[error("Missing element: {0}")]
    MissingElement(&'static str),

    #[error("Expected {min}..={max} cells, found {found}")]
    ColumnCount {
        min: usize,
        max: usize,
        found: usize,
    },

    #[error("Invalid {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },

    #[error("Unexpected protocol token: {0:?}")]
    ProtocolMismatch(String),

    #[error("Malformed JSON: {0}")]
    Json(String),

    #[error("Missing {0} in parent context")]
    MissingAncestor(&'static str),
}

/// Result type alias for Catalog-Ripple operations
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, AncestorChain, Stage};
pub use model::{EntityKind, Record};
