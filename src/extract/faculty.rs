use crate::crawler::protocol::FACULTY_LIST_ARG;
use crate::extract::cells::{cell_text, parse_id};
use crate::extract::{selector, UnitResult};
use crate::model::Faculty;
use crate::ExtractionError;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static OPTION_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| selector(&format!(r#"select[name="{}"] option"#, FACULTY_LIST_ARG)));

/// Extracts one faculty per option of the search page's faculty list
pub fn extract_faculties(html: &str) -> Vec<UnitResult<Faculty>> {
    let document = Html::parse_document(html);
    document.select(&OPTION_SELECTOR).map(parse_option).collect()
}

fn parse_option(option: ElementRef<'_>) -> UnitResult<Faculty> {
    let value = option
        .value()
        .attr("value")
        .ok_or(ExtractionError::MissingElement("option value"))?;

    Ok(Faculty {
        id: parse_id(value, "faculty id")?,
        name: cell_text(option),
    })
}
