//! Auxiliary tables of a group detail page
//!
//! A group page carries up to three extra tables: the weekly schedule, the
//! course dependencies, and the sibling courses offered alongside the group.
//! They are told apart only by their caption.

use crate::extract::cells::{cell_text, expect_columns, row_cells};
use crate::extract::{selector, UnitResult};
use crate::model::{ClassSession, Dependency, SiblingCourse};
use crate::ExtractionError;
use scraper::{ElementRef, Selector};
use std::sync::LazyLock;

/// Caption of the weekly schedule table
pub const SCHEDULE_HEADING: &str = "מערכת שעות";

/// Caption of the dependency table
pub const DEPENDENCIES_HEADING: &str = "דרישות קדם";

static CAPTION_SELECTOR: LazyLock<Selector> = LazyLock::new(|| selector("caption"));
static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Schedule,
    Dependencies,
    SiblingCourses,
}

/// Picks the sub-parser for a table from its heading
///
/// Only the two known headings are matched; every other heading, including an
/// empty one, is read as the sibling-courses table. A table type the site adds
/// later will therefore be parsed as sibling courses.
pub fn classify(heading: &str) -> TableKind {
    match heading {
        SCHEDULE_HEADING => TableKind::Schedule,
        DEPENDENCIES_HEADING => TableKind::Dependencies,
        _ => TableKind::SiblingCourses,
    }
}

/// Rows of one auxiliary table, header row already stripped
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedTable {
    Schedule(Vec<UnitResult<ClassSession>>),
    Dependencies(Vec<UnitResult<Dependency>>),
    SiblingCourses(Vec<UnitResult<SiblingCourse>>),
}

/// Classifies a table by its caption and parses its body rows
pub fn parse_table(table: ElementRef<'_>) -> ParsedTable {
    let heading = table_heading(table);
    let rows: Vec<_> = table_rows(table).into_iter().skip(1).collect();

    let kind = classify(&heading);
    tracing::trace!("Table {:?} classified as {:?}", heading, kind);

    match kind {
        TableKind::Schedule => ParsedTable::Schedule(rows.into_iter().map(parse_session).collect()),
        TableKind::Dependencies => {
            ParsedTable::Dependencies(rows.into_iter().map(parse_dependency).collect())
        }
        TableKind::SiblingCourses => {
            ParsedTable::SiblingCourses(rows.into_iter().map(parse_sibling).collect())
        }
    }
}

/// Caption text of a table, empty when it has none
pub fn table_heading(table: ElementRef<'_>) -> String {
    table
        .select(&CAPTION_SELECTOR)
        .next()
        .map(cell_text)
        .unwrap_or_default()
}

/// The table's own rows, without descending into nested tables
fn table_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut rows = Vec::new();
    for child in table.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => rows.extend(
                child
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|row| row.value().name() == "tr"),
            ),
            _ => {}
        }
    }
    rows
}

fn texts<const N: usize>(row: ElementRef<'_>) -> UnitResult<[String; N]> {
    let cells = row_cells(row);
    expect_columns(&cells, N, N)?;
    Ok(std::array::from_fn(|i| cell_text(cells[i])))
}

fn parse_session(row: ElementRef<'_>) -> UnitResult<ClassSession> {
    let [semester, day, start_time, end_time] = texts::<4>(row)?;
    Ok(ClassSession {
        semester,
        day,
        start_time,
        end_time,
    })
}

fn parse_dependency(row: ElementRef<'_>) -> UnitResult<Dependency> {
    let [dep_type, affected_students, course] = texts::<3>(row)?;
    Ok(Dependency {
        dep_type,
        affected_students,
        course,
    })
}

fn parse_sibling(row: ElementRef<'_>) -> UnitResult<SiblingCourse> {
    let cells = row_cells(row);
    expect_columns(&cells, 6, 6)?;

    let link = cells[5]
        .select(&LINK_SELECTOR)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string)
        .unwrap_or_else(|| cell_text(cells[5]));

    let course_id = cell_text(cells[0]);
    if course_id.is_empty() {
        return Err(ExtractionError::MissingElement("sibling course id"));
    }

    Ok(SiblingCourse {
        course_id,
        course_name: cell_text(cells[1]),
        course_type: cell_text(cells[2]),
        schedule: cell_text(cells[3]),
        lecturer: cell_text(cells[4]),
        link,
    })
}
