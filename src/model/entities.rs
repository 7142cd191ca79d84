//! Typed records for every level of the catalog
//!
//! Inherited parent fields (`faculty_id`, `track_id`, ...) are always copied
//! from the ancestor chain of the request that produced the page, never read
//! back from the page itself.

use serde::{Deserialize, Serialize};

/// A faculty from the top-level selection list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faculty {
    pub id: u32,
    pub name: String,
}

/// A track inside a faculty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub faculty_id: u32,
    pub id: u32,
    pub name: String,
    pub year: u32,
}

/// A program of study inside a track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub faculty_id: u32,
    pub track_id: u32,
    /// Opaque site identifier recovered from the program's course-list link
    pub id: u64,
    pub name: String,
    pub year: u32,
    /// Year token of the course-list link as the site printed it; may differ
    /// from the crawled `year`
    pub link_year: u32,
    pub comment: String,
}

/// A course listed under a program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub faculty_id: u32,
    pub track_id: u32,
    pub program_id: u64,
    pub id: String,
    pub name: String,
    pub year: u32,
    pub comment: String,
}

/// A teaching group of a course, with everything found on its detail page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub faculty_id: u32,
    pub track_id: u32,
    pub program_id: u64,
    pub course_id: String,
    pub id: u32,
    pub year: u32,
    pub points: f64,
    pub hours: f64,
    pub lecturer: String,
    pub exams: Vec<Exam>,
    pub class_sessions: Vec<ClassSession>,
    pub dependencies: Vec<Dependency>,
    pub sibling_courses: Vec<SiblingCourse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exam {
    pub date: String,
    pub time: String,
}

/// One weekly meeting from the schedule table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSession {
    pub semester: String,
    pub day: String,
    pub start_time: String,
    pub end_time: String,
}

/// A prerequisite or co-requisite from the dependency table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub dep_type: String,
    pub affected_students: String,
    pub course: String,
}

/// A related course offered alongside this group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiblingCourse {
    pub course_id: String,
    pub course_name: String,
    pub course_type: String,
    pub schedule: String,
    pub lecturer: String,
    pub link: String,
}
