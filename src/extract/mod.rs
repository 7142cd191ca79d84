//! Field extractors for every crawl stage
//!
//! Each extractor is a pure function over one response body (and the ancestor
//! chain the response inherits). It returns one `Result` per structural unit,
//! so a malformed option, row, JSON element or button costs exactly that unit
//! and never its siblings.

mod cells;
mod course;
mod faculty;
mod group;
mod program;
pub mod tables;
mod track;

pub use course::extract_courses;
pub use faculty::extract_faculties;
pub use group::{extract_group, extract_group_buttons, GroupPage, RejectedUnit};
pub use program::extract_programs;
pub use tables::{classify, TableKind, DEPENDENCIES_HEADING, SCHEDULE_HEADING};
pub use track::extract_tracks;

use crate::ExtractionError;
use scraper::Selector;

/// Result of extracting a single structural unit
pub type UnitResult<T> = Result<T, ExtractionError>;

/// Tunables of the extraction policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractOptions {
    /// Value used for points/hours cells that do not hold a number
    pub numeric_default: f64,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            numeric_default: 0.0,
        }
    }
}

/// Parses a selector known at compile time
fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid static selector")
}
