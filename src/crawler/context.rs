//! Ancestor-chain context carried from each stage to the next
//!
//! A context is a plain immutable value. Every child request gets a fresh
//! chain built from its parent record, and the chain travels inside the task
//! that performs the request, so a response always recovers exactly the chain
//! its request was sent with and no branch can observe another's.

use crate::crawler::request::RequestSpec;
use crate::crawler::stage::Stage;
use crate::model::{Course, Faculty, Program, Track};
use crate::ExtractionError;

/// Identifiers of every ancestor discovered above the current stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncestorChain {
    year: u32,
    faculty_id: Option<u32>,
    track_id: Option<u32>,
    program_id: Option<u64>,
    course_id: Option<String>,
}

impl AncestorChain {
    /// The chain of the bootstrap request: only the target year is known
    pub fn root(year: u32) -> Self {
        Self {
            year,
            faculty_id: None,
            track_id: None,
            program_id: None,
            course_id: None,
        }
    }

    pub fn with_faculty(&self, faculty: &Faculty) -> Self {
        Self {
            year: self.year,
            faculty_id: Some(faculty.id),
            track_id: None,
            program_id: None,
            course_id: None,
        }
    }

    pub fn with_track(&self, track: &Track) -> Self {
        Self {
            year: track.year,
            faculty_id: Some(track.faculty_id),
            track_id: Some(track.id),
            program_id: None,
            course_id: None,
        }
    }

    pub fn with_program(&self, program: &Program) -> Self {
        Self {
            year: program.year,
            faculty_id: Some(program.faculty_id),
            track_id: Some(program.track_id),
            program_id: Some(program.id),
            course_id: None,
        }
    }

    pub fn with_course(&self, course: &Course) -> Self {
        Self {
            year: course.year,
            faculty_id: Some(course.faculty_id),
            track_id: Some(course.track_id),
            program_id: Some(course.program_id),
            course_id: Some(course.id.clone()),
        }
    }

    pub fn year(&self) -> u32 {
        self.year
    }

    pub fn faculty_id(&self) -> Result<u32, ExtractionError> {
        self.faculty_id
            .ok_or(ExtractionError::MissingAncestor("faculty"))
    }

    pub fn track_id(&self) -> Result<u32, ExtractionError> {
        self.track_id.ok_or(ExtractionError::MissingAncestor("track"))
    }

    pub fn program_id(&self) -> Result<u64, ExtractionError> {
        self.program_id
            .ok_or(ExtractionError::MissingAncestor("program"))
    }

    pub fn course_id(&self) -> Result<&str, ExtractionError> {
        self.course_id
            .as_deref()
            .ok_or(ExtractionError::MissingAncestor("course"))
    }
}

/// An outgoing request bundled with the stage that will parse its response
/// and the ancestor chain that response inherits
#[derive(Debug, Clone)]
pub struct TaggedRequest {
    stage: Stage,
    spec: RequestSpec,
    context: AncestorChain,
}

/// Attaches a context to an outgoing request
pub fn attach(context: AncestorChain, stage: Stage, spec: RequestSpec) -> TaggedRequest {
    TaggedRequest {
        stage,
        spec,
        context,
    }
}

impl TaggedRequest {
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn spec(&self) -> &RequestSpec {
        &self.spec
    }

    pub fn context(&self) -> &AncestorChain {
        &self.context
    }

    /// Takes the request apart once its response has arrived
    pub fn recover(self) -> (Stage, RequestSpec, AncestorChain) {
        (self.stage, self.spec, self.context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> Track {
        Track {
            faculty_id: 11,
            id: 3,
            name: "General".to_string(),
            year: 2016,
        }
    }

    #[test]
    fn test_root_has_no_ancestors() {
        let root = AncestorChain::root(2016);
        assert_eq!(root.year(), 2016);
        assert_eq!(
            root.faculty_id(),
            Err(ExtractionError::MissingAncestor("faculty"))
        );
        assert!(root.course_id().is_err());
    }

    #[test]
    fn test_extending_leaves_parent_untouched() {
        let root = AncestorChain::root(2016);
        let faculty = Faculty {
            id: 11,
            name: "CS".to_string(),
        };
        let child = root.with_faculty(&faculty);

        assert_eq!(child.faculty_id(), Ok(11));
        assert!(root.faculty_id().is_err());
    }

    #[test]
    fn test_sibling_branches_are_independent() {
        let parent = AncestorChain::root(2016).with_faculty(&Faculty {
            id: 11,
            name: "CS".to_string(),
        });
        let first = parent.with_track(&track());
        let second = parent.with_track(&Track {
            id: 4,
            ..track()
        });

        assert_eq!(first.track_id(), Ok(3));
        assert_eq!(second.track_id(), Ok(4));
        assert!(parent.track_id().is_err());
    }

    #[test]
    fn test_fields_come_from_parent_record() {
        let program = Program {
            faculty_id: 11,
            track_id: 3,
            id: 115600101,
            name: "Mandatory A".to_string(),
            year: 2015,
            link_year: 2015,
            comment: String::new(),
        };
        let chain = AncestorChain::root(2016).with_program(&program);

        assert_eq!(chain.year(), 2015);
        assert_eq!(chain.faculty_id(), Ok(11));
        assert_eq!(chain.track_id(), Ok(3));
        assert_eq!(chain.program_id(), Ok(115600101));
    }

    #[test]
    fn test_recover_returns_attached_context() {
        let chain = AncestorChain::root(2016).with_track(&track());
        let tagged = attach(chain.clone(), Stage::ProgramList, RequestSpec::get(None));
        let (stage, _, recovered) = tagged.recover();

        assert_eq!(stage, Stage::ProgramList);
        assert_eq!(recovered, chain);
    }
}
