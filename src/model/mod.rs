//! Catalog entity model
//!
//! The five levels of the catalog hierarchy (Faculty → Track → Program →
//! Course → Group), their sub-records, and the tagged [`Record`] envelope
//! handed to output sinks.

mod entities;
mod record;

pub use entities::{
    ClassSession, Course, Dependency, Exam, Faculty, Group, Program, SiblingCourse, Track,
};
pub use record::{EntityKind, Record};
