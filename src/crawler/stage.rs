//! Crawl stages and the per-response processing step
//!
//! A response is always parsed by the stage its request was tagged with. The
//! stage runs its extractor, accounts every unit in the error statistics and
//! turns each surviving entity into an emitted record plus, unless the stage
//! is terminal or a filter excludes the entity, one child request.

use crate::crawler::context::{attach, AncestorChain, TaggedRequest};
use crate::crawler::request;
use crate::extract::{
    extract_courses, extract_faculties, extract_group, extract_group_buttons, extract_programs,
    extract_tracks, ExtractOptions, UnitResult,
};
use crate::model::{EntityKind, Record};
use crate::output::ErrorStats;
use std::fmt;
use std::sync::Arc;

/// Position of a response in the catalog hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    FacultyList,
    TrackList,
    ProgramList,
    CourseList,
    GroupIndex,
    GroupDetail,
}

impl Stage {
    /// The stage that parses the responses of this stage's child requests
    pub fn next(self) -> Option<Stage> {
        match self {
            Self::FacultyList => Some(Self::TrackList),
            Self::TrackList => Some(Self::ProgramList),
            Self::ProgramList => Some(Self::CourseList),
            Self::CourseList => Some(Self::GroupIndex),
            Self::GroupIndex => Some(Self::GroupDetail),
            Self::GroupDetail => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }

    /// The entity type whose counters this stage's units land in
    pub fn entity_kind(self) -> EntityKind {
        match self {
            Self::FacultyList => EntityKind::Faculty,
            Self::TrackList => EntityKind::Track,
            Self::ProgramList => EntityKind::Program,
            Self::CourseList => EntityKind::Course,
            Self::GroupIndex | Self::GroupDetail => EntityKind::Group,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FacultyList => "faculty_list",
            Self::TrackList => "track_list",
            Self::ProgramList => "program_list",
            Self::CourseList => "course_list",
            Self::GroupIndex => "group_index",
            Self::GroupDetail => "group_detail",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Branches to follow; `None` follows every branch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageFilters {
    pub faculty: Option<u32>,
    pub track: Option<u32>,
}

impl StageFilters {
    fn follows_faculty(&self, id: u32) -> bool {
        self.faculty.map_or(true, |wanted| wanted == id)
    }

    fn follows_track(&self, id: u32) -> bool {
        self.track.map_or(true, |wanted| wanted == id)
    }
}

/// Records to emit and requests to dispatch after one response
#[derive(Debug, Default)]
pub struct StageOutcome {
    pub records: Vec<Record>,
    pub children: Vec<TaggedRequest>,
}

/// Runs the extractor of a stage and accounts for every unit
#[derive(Debug, Clone)]
pub struct StageProcessor {
    filters: StageFilters,
    options: ExtractOptions,
    stats: Arc<ErrorStats>,
}

impl StageProcessor {
    pub fn new(filters: StageFilters, options: ExtractOptions, stats: Arc<ErrorStats>) -> Self {
        Self {
            filters,
            options,
            stats,
        }
    }

    pub fn stats(&self) -> &Arc<ErrorStats> {
        &self.stats
    }

    /// Processes the body of a response tagged with `stage`
    pub fn process(&self, stage: Stage, body: &str, context: &AncestorChain) -> StageOutcome {
        let outcome = match stage {
            Stage::FacultyList => self.faculties(body, context),
            Stage::TrackList => self.tracks(body, context),
            Stage::ProgramList => self.programs(body, context),
            Stage::CourseList => self.courses(body, context),
            Stage::GroupIndex => self.group_index(body, context),
            Stage::GroupDetail => self.group_detail(body, context),
        };

        tracing::debug!(
            "{}: {} records, {} child requests",
            stage,
            outcome.records.len(),
            outcome.children.len()
        );

        outcome
    }

    /// Counts every unit under the stage's entity type and keeps the ones
    /// that extracted cleanly
    fn accept<T>(&self, stage: Stage, units: Vec<UnitResult<T>>) -> Vec<T> {
        let kind = stage.entity_kind();
        units
            .into_iter()
            .filter_map(|unit| match unit {
                Ok(entity) => {
                    self.stats.add_success(kind);
                    Some(entity)
                }
                Err(e) => {
                    self.stats.add_error(kind);
                    tracing::warn!("Skipping {} unit: {}", kind, e);
                    None
                }
            })
            .collect()
    }

    fn faculties(&self, body: &str, context: &AncestorChain) -> StageOutcome {
        let mut outcome = StageOutcome::default();
        for faculty in self.accept(Stage::FacultyList, extract_faculties(body)) {
            if self.filters.follows_faculty(faculty.id) {
                outcome.children.push(attach(
                    context.with_faculty(&faculty),
                    Stage::TrackList,
                    request::track_list(&faculty),
                ));
            } else {
                tracing::trace!("Faculty {} excluded by filter", faculty.id);
            }
            outcome.records.push(Record::Faculty(faculty));
        }
        outcome
    }

    fn tracks(&self, body: &str, context: &AncestorChain) -> StageOutcome {
        let mut outcome = StageOutcome::default();
        for track in self.accept(Stage::TrackList, extract_tracks(body, context)) {
            if self.filters.follows_track(track.id) {
                outcome.children.push(attach(
                    context.with_track(&track),
                    Stage::ProgramList,
                    request::program_list(&track),
                ));
            } else {
                tracing::trace!("Track {} excluded by filter", track.id);
            }
            outcome.records.push(Record::Track(track));
        }
        outcome
    }

    fn programs(&self, body: &str, context: &AncestorChain) -> StageOutcome {
        let mut outcome = StageOutcome::default();
        for program in self.accept(Stage::ProgramList, extract_programs(body, context)) {
            outcome.children.push(attach(
                context.with_program(&program),
                Stage::CourseList,
                request::course_list(&program),
            ));
            outcome.records.push(Record::Program(program));
        }
        outcome
    }

    fn courses(&self, body: &str, context: &AncestorChain) -> StageOutcome {
        let mut outcome = StageOutcome::default();
        for course in self.accept(Stage::CourseList, extract_courses(body, context)) {
            outcome.children.push(attach(
                context.with_course(&course),
                Stage::GroupIndex,
                request::group_index(&course),
            ));
            outcome.records.push(Record::Course(course));
        }
        outcome
    }

    /// Buttons only lead to groups; a button is counted when it fails, the
    /// group itself is counted once its detail page is parsed.
    fn group_index(&self, body: &str, context: &AncestorChain) -> StageOutcome {
        let mut outcome = StageOutcome::default();
        for button in extract_group_buttons(body) {
            match button {
                Ok(spec) => outcome
                    .children
                    .push(attach(context.clone(), Stage::GroupDetail, spec)),
                Err(e) => {
                    self.stats.add_error(Stage::GroupIndex.entity_kind());
                    tracing::warn!("Skipping group button: {}", e);
                }
            }
        }
        outcome
    }

    fn group_detail(&self, body: &str, context: &AncestorChain) -> StageOutcome {
        let mut outcome = StageOutcome::default();
        match extract_group(body, context, &self.options) {
            Ok(page) => {
                let group = page.group;
                self.stats.add_success(EntityKind::Group);
                self.stats
                    .add_successes(EntityKind::Exam, group.exams.len() as u64);
                self.stats
                    .add_successes(EntityKind::ClassSession, group.class_sessions.len() as u64);
                self.stats
                    .add_successes(EntityKind::Dependency, group.dependencies.len() as u64);
                self.stats.add_successes(
                    EntityKind::SiblingCourse,
                    group.sibling_courses.len() as u64,
                );
                for rejected in page.rejected {
                    self.stats.add_error(rejected.kind);
                    tracing::warn!(
                        "Skipping {} row of group {}: {}",
                        rejected.kind,
                        group.id,
                        rejected.error
                    );
                }
                outcome.records.push(Record::Group(group));
            }
            Err(e) => {
                self.stats.add_error(EntityKind::Group);
                tracing::warn!("Skipping group page: {}", e);
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Course, Faculty, Track};

    fn processor(filters: StageFilters) -> StageProcessor {
        StageProcessor::new(
            filters,
            ExtractOptions::default(),
            Arc::new(ErrorStats::new()),
        )
    }

    const FACULTY_PAGE: &str = r#"
        <select name="R1C9">
            <option value="11">CS</option>
            <option value="12">Math</option>
            <option value="">Choose</option>
        </select>"#;

    #[test]
    fn test_stage_order() {
        let mut stage = Stage::FacultyList;
        let mut seen = vec![stage];
        while let Some(next) = stage.next() {
            seen.push(next);
            stage = next;
        }
        assert_eq!(seen.len(), 6);
        assert!(Stage::GroupDetail.is_terminal());
        assert!(!Stage::GroupIndex.is_terminal());
    }

    #[test]
    fn test_group_stages_share_counters() {
        assert_eq!(Stage::GroupIndex.entity_kind(), EntityKind::Group);
        assert_eq!(Stage::GroupDetail.entity_kind(), EntityKind::Group);
        assert_eq!(Stage::ProgramList.entity_kind(), EntityKind::Program);
    }

    #[test]
    fn test_faculty_stage_without_filter() {
        let processor = processor(StageFilters::default());
        let outcome = processor.process(
            Stage::FacultyList,
            FACULTY_PAGE,
            &AncestorChain::root(2016),
        );

        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.children.len(), 2);
        assert!(outcome
            .children
            .iter()
            .all(|child| child.stage() == Stage::TrackList));

        let ratio = processor.stats().ratio(EntityKind::Faculty);
        assert_eq!(ratio.total_count, 3);
        assert_eq!(ratio.error_count, 1);
    }

    #[test]
    fn test_faculty_filter_emits_but_does_not_follow() {
        let processor = processor(StageFilters {
            faculty: Some(11),
            track: None,
        });
        let outcome = processor.process(
            Stage::FacultyList,
            FACULTY_PAGE,
            &AncestorChain::root(2016),
        );

        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.children.len(), 1);
        let child = &outcome.children[0];
        assert_eq!(child.context().faculty_id(), Ok(11));
        assert_eq!(child.spec().form_value("Faculty"), Some("11"));
    }

    #[test]
    fn test_track_stage_carries_context() {
        let processor = processor(StageFilters {
            faculty: None,
            track: Some(3),
        });
        let context = AncestorChain::root(2016).with_faculty(&Faculty {
            id: 11,
            name: "CS".to_string(),
        });
        let body = r#"{"Answer":[{"Code":3,"Name":"General"},{"Code":"4","Name":"Honors"}]}"#;
        let outcome = processor.process(Stage::TrackList, body, &context);

        assert_eq!(
            outcome.records,
            vec![
                Record::Track(Track {
                    faculty_id: 11,
                    id: 3,
                    name: "General".to_string(),
                    year: 2016,
                }),
                Record::Track(Track {
                    faculty_id: 11,
                    id: 4,
                    name: "Honors".to_string(),
                    year: 2016,
                }),
            ]
        );
        assert_eq!(outcome.children.len(), 1);
        assert_eq!(outcome.children[0].spec().form_value("R1C2"), Some("3"));
        assert_eq!(outcome.children[0].spec().form_value("HUG"), Some("11"));
    }

    #[test]
    fn test_program_stage_requests_the_linked_year() {
        let processor = processor(StageFilters::default());
        let context = AncestorChain::root(2016).with_track(&Track {
            faculty_id: 11,
            id: 3,
            name: "General".to_string(),
            year: 2016,
        });
        let body = r#"<table id="myTable0">
            <tr><td>Name</td><td></td><td>Comment</td></tr>
            <tr><td>Legacy</td><td><a href="fireflyweb.aspx?prgname=S_SHOW_PROGS&amp;arguments=-N2015,-N115600101">Show</a></td><td></td></tr>
        </table>"#;
        let outcome = processor.process(Stage::ProgramList, body, &context);

        assert_eq!(outcome.children.len(), 1);
        assert_eq!(
            outcome.children[0].spec().query.as_deref(),
            Some("prgname=S_SHOW_PROGS&arguments=-N2015,-N115600101")
        );
        match &outcome.records[0] {
            Record::Program(program) => assert_eq!(program.year, 2016),
            other => panic!("unexpected record {:?}", other),
        }
        assert_eq!(processor.stats().ratio(EntityKind::Program).total_count, 1);
    }

    #[test]
    fn test_group_index_counts_broken_buttons() {
        let processor = processor(StageFilters::default());
        let context = AncestorChain::root(2016).with_course(&Course {
            faculty_id: 11,
            track_id: 3,
            program_id: 114100101,
            id: "10111".to_string(),
            name: "Intro".to_string(),
            year: 2016,
            comment: String::new(),
        });
        let body = r#"
            <input name="B2" onclick="Go('-N10111,-N1,-N1,-N1011101,-N')">
            <input name="B2" onclick="Go('nothing here')">"#;
        let outcome = processor.process(Stage::GroupIndex, body, &context);

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.children.len(), 1);
        assert_eq!(outcome.children[0].stage(), Stage::GroupDetail);
        assert_eq!(outcome.children[0].context(), &context);

        let ratio = processor.stats().ratio(EntityKind::Group);
        assert_eq!((ratio.error_count, ratio.total_count), (1, 1));
    }

    #[test]
    fn test_terminal_stage_has_no_children() {
        let processor = processor(StageFilters::default());
        let context = AncestorChain::root(2016).with_course(&Course {
            faculty_id: 11,
            track_id: 3,
            program_id: 114100101,
            id: "10111".to_string(),
            name: "Intro".to_string(),
            year: 2016,
            comment: String::new(),
        });
        let body = r#"<table class="text">
            <tr><td>a</td><td>b</td><td>c</td><td>d</td>
            <td>Points: 3</td><td>Hours: 2</td><td>Lecturer: X</td><td>Group: 7</td></tr>
        </table>"#;
        let outcome = processor.process(Stage::GroupDetail, body, &context);

        assert_eq!(outcome.records.len(), 1);
        assert!(outcome.children.is_empty());
        assert_eq!(processor.stats().ratio(EntityKind::Group).total_count, 1);
    }

    #[test]
    fn test_failed_group_page_is_counted() {
        let processor = processor(StageFilters::default());
        let outcome = processor.process(
            Stage::GroupDetail,
            "<html></html>",
            &AncestorChain::root(2016),
        );
        assert!(outcome.records.is_empty());
        assert_eq!(processor.stats().ratio(EntityKind::Group).error_count, 1);
    }
}
