//! Shared helpers for reading positional table cells and labelled values

use crate::ExtractionError;
use scraper::{ElementRef, Node};

/// Returns the `td`/`th` children of a table row, in document order
///
/// Each row gets its own vector so a short or malformed row can never shift
/// the columns of the next one.
pub fn row_cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| matches!(cell.value().name(), "td" | "th"))
        .collect()
}

/// Returns true when every cell of the row is a `th` header cell
pub fn is_header_row(row: ElementRef<'_>) -> bool {
    let cells = row_cells(row);
    !cells.is_empty() && cells.iter().all(|cell| cell.value().name() == "th")
}

/// Validates the number of cells before any positional access
pub fn expect_columns<T>(cells: &[T], min: usize, max: usize) -> Result<(), ExtractionError> {
    if cells.len() < min || cells.len() > max {
        return Err(ExtractionError::ColumnCount {
            min,
            max,
            found: cells.len(),
        });
    }
    Ok(())
}

/// All text below an element, with whitespace runs collapsed
pub fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// The text nodes that are direct children of an element, trimmed, empty ones dropped
pub fn direct_text(element: ElementRef<'_>) -> Vec<String> {
    element
        .children()
        .filter_map(|child| match child.value() {
            Node::Text(text) => Some(text.trim().to_string()),
            _ => None,
        })
        .filter(|text| !text.is_empty())
        .collect()
}

/// Text of an optional trailing cell; a missing cell reads as empty
pub fn optional_text(cell: Option<&ElementRef<'_>>) -> String {
    cell.map(|cell| cell_text(*cell)).unwrap_or_default()
}

/// Splits `label: value` text on the first `:` and returns the trimmed value
pub fn labelled_value<'a>(text: &'a str, field: &'static str) -> Result<&'a str, ExtractionError> {
    text.split_once(':')
        .map(|(_, value)| value.trim())
        .ok_or_else(|| ExtractionError::InvalidValue {
            field,
            value: text.to_string(),
        })
}

/// Parses a decimal value, falling back to `default` when it is not a number
pub fn number_or_default(value: &str, field: &'static str, default: f64) -> f64 {
    match value.trim().parse::<f64>() {
        Ok(number) if number.is_finite() => number,
        _ => {
            tracing::debug!(
                "Non-numeric {} value {:?}, using default {}",
                field,
                value,
                default
            );
            default
        }
    }
}

/// Parses a required integer identifier
pub fn parse_id<T: std::str::FromStr>(value: &str, field: &'static str) -> Result<T, ExtractionError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ExtractionError::InvalidValue {
            field,
            value: value.to_string(),
        })
}
