//! Group index and group detail pages
//!
//! A course page lists its groups as buttons whose `onclick` handlers carry the
//! detail page arguments. The detail page holds a label/value table, an
//! optional exam list and the auxiliary tables.

use crate::crawler::protocol::GROUP_BUTTON_NAME;
use crate::crawler::request::{self, RequestSpec};
use crate::crawler::AncestorChain;
use crate::extract::cells::{direct_text, labelled_value, number_or_default, parse_id};
use crate::extract::tables::{parse_table, ParsedTable};
use crate::extract::{selector, ExtractOptions, UnitResult};
use crate::model::{EntityKind, Exam, Group};
use crate::ExtractionError;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static BUTTON_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| selector(&format!(r#"input[name="{}"]"#, GROUP_BUTTON_NAME)));
static CELL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| selector("table.text > tbody > tr > td"));
static TABLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| selector("table[id]"));
static AUX_TABLE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^myTable\d+$").expect("valid table id regex"));

const POINTS_CELL: usize = 4;
const HOURS_CELL: usize = 5;
const LECTURER_CELL: usize = 6;
const ID_CELL: usize = 7;
const EXAMS_CELL: usize = 8;

/// Leading text nodes of the exam cell that are not exam lines
const EXAM_PREAMBLE_LINES: usize = 2;

/// A sub-record row that could not be read; the group itself still stands
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedUnit {
    pub kind: EntityKind,
    pub error: ExtractionError,
}

/// A group together with the sub-record rows that were skipped
#[derive(Debug, Clone, PartialEq)]
pub struct GroupPage {
    pub group: Group,
    pub rejected: Vec<RejectedUnit>,
}

/// Builds one detail-page request per group button of a course page
pub fn extract_group_buttons(html: &str) -> Vec<UnitResult<RequestSpec>> {
    let document = Html::parse_document(html);
    document
        .select(&BUTTON_SELECTOR)
        .map(|button| {
            let onclick = button
                .value()
                .attr("onclick")
                .ok_or(ExtractionError::MissingElement("group button onclick"))?;
            request::group_detail(onclick)
        })
        .collect()
}

/// Extracts the group described by a detail page
///
/// Points and hours that are not numbers take `options.numeric_default`;
/// a missing field cell or a non-numeric group id fails the page.
pub fn extract_group(
    html: &str,
    context: &AncestorChain,
    options: &ExtractOptions,
) -> UnitResult<GroupPage> {
    let document = Html::parse_document(html);
    let cells: Vec<ElementRef<'_>> = document.select(&CELL_SELECTOR).collect();

    let field_text = |index: usize, field: &'static str| -> UnitResult<String> {
        cells
            .get(index)
            .map(|cell| direct_text(*cell).join(" "))
            .ok_or(ExtractionError::MissingElement(field))
    };

    let points = field_text(POINTS_CELL, "points cell")?;
    let hours = field_text(HOURS_CELL, "hours cell")?;
    let lecturer = field_text(LECTURER_CELL, "lecturer cell")?;
    let id = field_text(ID_CELL, "group id cell")?;

    let mut rejected = Vec::new();
    let exams = match cells.get(EXAMS_CELL) {
        Some(cell) if has_exam_marker(*cell) => parse_exams(*cell, &mut rejected),
        _ => Vec::new(),
    };

    let mut group = Group {
        faculty_id: context.faculty_id()?,
        track_id: context.track_id()?,
        program_id: context.program_id()?,
        course_id: context.course_id()?.to_string(),
        id: parse_id(labelled_value(&id, "group id")?, "group id")?,
        year: context.year(),
        points: number_or_default(
            labelled_value(&points, "points")?,
            "points",
            options.numeric_default,
        ),
        hours: number_or_default(
            labelled_value(&hours, "hours")?,
            "hours",
            options.numeric_default,
        ),
        lecturer: labelled_value(&lecturer, "lecturer")?.to_string(),
        exams,
        class_sessions: Vec::new(),
        dependencies: Vec::new(),
        sibling_courses: Vec::new(),
    };

    let aux_tables = document.select(&TABLE_SELECTOR).filter(|table| {
        table
            .value()
            .attr("id")
            .is_some_and(|id| AUX_TABLE_ID_RE.is_match(id))
    });

    for table in aux_tables {
        match parse_table(table) {
            ParsedTable::Schedule(rows) => {
                collect(rows, EntityKind::ClassSession, &mut group.class_sessions, &mut rejected)
            }
            ParsedTable::Dependencies(rows) => {
                collect(rows, EntityKind::Dependency, &mut group.dependencies, &mut rejected)
            }
            ParsedTable::SiblingCourses(rows) => collect(
                rows,
                EntityKind::SiblingCourse,
                &mut group.sibling_courses,
                &mut rejected,
            ),
        }
    }

    Ok(GroupPage { group, rejected })
}

fn collect<T>(
    rows: Vec<UnitResult<T>>,
    kind: EntityKind,
    into: &mut Vec<T>,
    rejected: &mut Vec<RejectedUnit>,
) {
    for row in rows {
        match row {
            Ok(record) => into.push(record),
            Err(error) => rejected.push(RejectedUnit { kind, error }),
        }
    }
}

fn has_exam_marker(cell: ElementRef<'_>) -> bool {
    cell.children()
        .filter_map(ElementRef::wrap)
        .any(|child| child.value().name() == "b")
}

/// Exam lines read `<label> <label> <label> <label> <date> <time> ...`
fn parse_exams(cell: ElementRef<'_>, rejected: &mut Vec<RejectedUnit>) -> Vec<Exam> {
    let mut exams = Vec::new();
    for line in direct_text(cell).into_iter().skip(EXAM_PREAMBLE_LINES) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match (tokens.get(4), tokens.get(5)) {
            (Some(date), Some(time)) => exams.push(Exam {
                date: date.to_string(),
                time: time.to_string(),
            }),
            _ => rejected.push(RejectedUnit {
                kind: EntityKind::Exam,
                error: ExtractionError::InvalidValue {
                    field: "exam line",
                    value: line.clone(),
                },
            }),
        }
    }
    exams
}
