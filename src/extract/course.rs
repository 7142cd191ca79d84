use crate::crawler::AncestorChain;
use crate::extract::cells::{cell_text, expect_columns, is_header_row, optional_text, row_cells};
use crate::extract::{selector, UnitResult};
use crate::model::Course;
use crate::ExtractionError;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| selector("table#myTable0 > tbody > tr"));

/// Extracts the courses of the program in `context`
///
/// Body rows are `id | name | (unused) | button | comment`.
pub fn extract_courses(html: &str, context: &AncestorChain) -> Vec<UnitResult<Course>> {
    let ancestors = (
        context.faculty_id(),
        context.track_id(),
        context.program_id(),
    );
    let (faculty_id, track_id, program_id) = match ancestors {
        (Ok(f), Ok(t), Ok(p)) => (f, t, p),
        (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => return vec![Err(e)],
    };

    let document = Html::parse_document(html);
    document
        .select(&ROW_SELECTOR)
        .filter(|row| !is_header_row(*row))
        .map(|row| {
            let (id, name, comment) = parse_row(row)?;
            Ok(Course {
                faculty_id,
                track_id,
                program_id,
                id,
                name,
                year: context.year(),
                comment,
            })
        })
        .collect()
}

fn parse_row(row: ElementRef<'_>) -> UnitResult<(String, String, String)> {
    let cells = row_cells(row);
    expect_columns(&cells, 4, 5)?;

    let id = cell_text(cells[0]);
    if id.is_empty() {
        return Err(ExtractionError::MissingElement("course id"));
    }

    Ok((id, cell_text(cells[1]), optional_text(cells.get(4))))
}
