//! Tagged output records and the keys used for error accounting

use crate::model::{Course, Faculty, Group, Program, Track};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An emitted catalog entity, tagged with its type name
///
/// Serializes flat with an `item_type` field, e.g.
/// `{"item_type":"Faculty","id":11,"name":"CS"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "item_type")]
pub enum Record {
    Faculty(Faculty),
    Track(Track),
    Program(Program),
    Course(Course),
    Group(Group),
}

impl Record {
    /// Returns the entity kind of this record
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Faculty(_) => EntityKind::Faculty,
            Self::Track(_) => EntityKind::Track,
            Self::Program(_) => EntityKind::Program,
            Self::Course(_) => EntityKind::Course,
            Self::Group(_) => EntityKind::Group,
        }
    }

    /// The type name written alongside the record's fields
    pub fn item_type(&self) -> &'static str {
        match self {
            Self::Faculty(_) => "Faculty",
            Self::Track(_) => "Track",
            Self::Program(_) => "Program",
            Self::Course(_) => "Course",
            Self::Group(_) => "Group",
        }
    }
}

/// Keys of the error statistics collector
///
/// The five catalog levels plus the sub-records parsed out of a group page,
/// whose rows fail independently of the group itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKind {
    Faculty,
    Track,
    Program,
    Course,
    Group,
    Exam,
    ClassSession,
    Dependency,
    SiblingCourse,
}

impl EntityKind {
    pub const ALL: [EntityKind; 9] = [
        Self::Faculty,
        Self::Track,
        Self::Program,
        Self::Course,
        Self::Group,
        Self::Exam,
        Self::ClassSession,
        Self::Dependency,
        Self::SiblingCourse,
    ];

    /// Position of this kind in [`EntityKind::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Faculty => "faculty",
            Self::Track => "track",
            Self::Program => "program",
            Self::Course => "course",
            Self::Group => "group",
            Self::Exam => "exam",
            Self::ClassSession => "class_session",
            Self::Dependency => "dependency",
            Self::SiblingCourse => "sibling_course",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.to_db_string() == s)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}
