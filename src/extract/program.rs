use crate::crawler::protocol::PROGRAM_LINK_RE;
use crate::crawler::AncestorChain;
use crate::extract::cells::{cell_text, expect_columns, optional_text, parse_id, row_cells};
use crate::extract::{selector, UnitResult};
use crate::model::Program;
use crate::ExtractionError;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static ROW_SELECTOR: LazyLock<Selector> = LazyLock::new(|| selector("table#myTable0 tr"));
static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));

/// Extracts the programs of the track in `context`
///
/// Rows are `name | link | comment`; the first row is the table header.
pub fn extract_programs(html: &str, context: &AncestorChain) -> Vec<UnitResult<Program>> {
    let (faculty_id, track_id) = match (context.faculty_id(), context.track_id()) {
        (Ok(faculty_id), Ok(track_id)) => (faculty_id, track_id),
        (Err(e), _) | (_, Err(e)) => return vec![Err(e)],
    };

    let document = Html::parse_document(html);
    document
        .select(&ROW_SELECTOR)
        .skip(1)
        .map(|row| {
            let row = parse_row(row)?;
            Ok(Program {
                faculty_id,
                track_id,
                id: row.id,
                name: row.name,
                year: context.year(),
                link_year: row.link_year,
                comment: row.comment,
            })
        })
        .collect()
}

struct ProgramRow {
    id: u64,
    link_year: u32,
    name: String,
    comment: String,
}

fn parse_row(row: ElementRef<'_>) -> UnitResult<ProgramRow> {
    let cells = row_cells(row);
    expect_columns(&cells, 2, 3)?;

    let href = cells[1]
        .select(&LINK_SELECTOR)
        .next()
        .and_then(|link| link.value().attr("href"))
        .ok_or(ExtractionError::MissingElement("program link"))?;

    let caps = PROGRAM_LINK_RE
        .captures(href)
        .ok_or_else(|| ExtractionError::ProtocolMismatch(href.to_string()))?;

    Ok(ProgramRow {
        id: parse_id(&caps["prog"], "program id")?,
        link_year: parse_id(&caps["year"], "program link year")?,
        name: cell_text(cells[0]),
        comment: optional_text(cells.get(2)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Track;

    fn context() -> AncestorChain {
        AncestorChain::root(2016).with_track(&Track {
            faculty_id: 11,
            id: 3,
            name: "General".to_string(),
            year: 2016,
        })
    }

    fn row(name: &str, prog: &str, comment: Option<&str>) -> String {
        let comment = comment
            .map(|c| format!("<td>{}</td>", c))
            .unwrap_or_default();
        format!(
            r#"<tr><td>{}</td><td><a href="fireflyweb.aspx?prgname=S_SHOW_PROGS&amp;arguments=-N2016,-N{}">Show courses</a></td>{}</tr>"#,
            name, prog, comment
        )
    }

    fn table(rows: &[String]) -> String {
        format!(
            r#"<table id="myTable0"><tr><td>Name</td><td></td><td>Comment</td></tr>{}</table>"#,
            rows.concat()
        )
    }

    #[test]
    fn test_extract_programs() {
        let html = table(&[
            row(" Mandatory A ", "115600101", Some(" first year ")),
            row("Mandatory B", "115600102", Some("")),
        ]);
        let programs: Vec<_> = extract_programs(&html, &context())
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(programs.len(), 2);
        assert_eq!(
            programs[0],
            Program {
                faculty_id: 11,
                track_id: 3,
                id: 115600101,
                name: "Mandatory A".to_string(),
                year: 2016,
                link_year: 2016,
                comment: "first year".to_string(),
            }
        );
        assert_eq!(programs[1].comment, "");
    }

    #[test]
    fn test_link_year_is_kept_apart_from_crawled_year() {
        let html = table(&[
            r#"<tr><td>Legacy</td><td><a href="fireflyweb.aspx?prgname=S_SHOW_PROGS&amp;arguments=-N2015,-N115600101">Show courses</a></td><td></td></tr>"#
                .to_string(),
        ]);
        let results = extract_programs(&html, &context());
        let program = results[0].as_ref().unwrap();

        assert_eq!(program.year, 2016);
        assert_eq!(program.link_year, 2015);
        assert_eq!(program.id, 115600101);
    }

    #[test]
    fn test_missing_comment_cell_is_empty_comment() {
        let html = table(&[row("Electives", "115600103", None)]);
        let results = extract_programs(&html, &context());
        assert_eq!(results[0].as_ref().unwrap().comment, "");
    }

    #[test]
    fn test_malformed_row_is_isolated() {
        let html = table(&[
            row("Good A", "1", Some("")),
            r#"<tr><td>Broken</td><td><a href="fireflyweb.aspx?prgname=OTHER">x</a></td><td></td></tr>"#
                .to_string(),
            r#"<tr><td>Only one cell</td></tr>"#.to_string(),
            row("Good B", "2", Some("")),
        ]);
        let results = extract_programs(&html, &context());

        assert_eq!(results.len(), 4);
        assert_eq!(results[0].as_ref().unwrap().id, 1);
        assert!(matches!(
            results[1],
            Err(ExtractionError::ProtocolMismatch(_))
        ));
        assert!(matches!(
            results[2],
            Err(ExtractionError::ColumnCount { found: 1, .. })
        ));
        assert_eq!(results[3].as_ref().unwrap().id, 2);
    }

    #[test]
    fn test_row_without_link() {
        let html = table(&[r#"<tr><td>No link</td><td>-</td><td></td></tr>"#.to_string()]);
        assert_eq!(
            extract_programs(&html, &context()),
            vec![Err(ExtractionError::MissingElement("program link"))]
        );
    }

    #[test]
    fn test_header_only_table() {
        assert!(extract_programs(&table(&[]), &context()).is_empty());
    }
}
