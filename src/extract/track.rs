use crate::crawler::AncestorChain;
use crate::extract::cells::parse_id;
use crate::extract::UnitResult;
use crate::model::Track;
use crate::ExtractionError;
use serde::Deserialize;
use serde_json::Value;

/// One element of the JSON track listing
#[derive(Debug, Deserialize)]
struct TrackEntry {
    #[serde(rename = "Code")]
    code: TrackCode,
    #[serde(rename = "Name")]
    name: String,
}

/// The site sends codes as numbers or as numeric strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TrackCode {
    Number(u64),
    Text(String),
}

impl TrackCode {
    fn to_id(&self) -> UnitResult<u32> {
        match self {
            Self::Number(n) => u32::try_from(*n).map_err(|_| ExtractionError::InvalidValue {
                field: "track code",
                value: n.to_string(),
            }),
            Self::Text(s) => parse_id(s, "track code"),
        }
    }
}

/// Extracts the tracks of the faculty in `context` from the JSON listing
///
/// The body is normally `{"Answer": [...]}`; a bare array is accepted too.
/// A body that cannot be read at all counts as a single failed unit.
pub fn extract_tracks(body: &str, context: &AncestorChain) -> Vec<UnitResult<Track>> {
    let faculty_id = match context.faculty_id() {
        Ok(id) => id,
        Err(e) => return vec![Err(e)],
    };

    let entries = match track_entries(body) {
        Ok(entries) => entries,
        Err(e) => return vec![Err(e)],
    };

    entries
        .into_iter()
        .map(|entry| {
            let entry: TrackEntry =
                serde_json::from_value(entry).map_err(|e| ExtractionError::Json(e.to_string()))?;
            Ok(Track {
                faculty_id,
                id: entry.code.to_id()?,
                name: entry.name.trim().to_string(),
                year: context.year(),
            })
        })
        .collect()
}

fn track_entries(body: &str) -> UnitResult<Vec<Value>> {
    let document: Value =
        serde_json::from_str(body).map_err(|e| ExtractionError::Json(e.to_string()))?;

    match document {
        Value::Array(entries) => Ok(entries),
        Value::Object(mut map) => match map.remove("Answer") {
            Some(Value::Array(entries)) => Ok(entries),
            _ => Err(ExtractionError::MissingElement("Answer array")),
        },
        _ => Err(ExtractionError::Json(
            "expected an object or an array".to_string(),
        )),
    }
}
