//! Request builder: the parameters of each stage's child request
//!
//! Every builder takes the freshly extracted parent entity and produces the
//! request whose response the next stage parses.

use crate::crawler::protocol::{
    numeric_token, ARGUMENTS, FACULTY_ARG, GROUP_ARGS_RE, JSON_ACTION_ARG, JSON_FACULTY_ARG,
    PRGNAME, PRG_COURSES, PRG_GROUPS, PRG_GROUP_DETAIL, PRG_JSON, PRG_PROGRAMS, PRG_SEARCH,
    TRACK_ARG, TRACK_LIST_ACTION, YEAR_ARG,
};
use crate::model::{Course, Faculty, Program, Track};
use crate::ExtractionError;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Method, query string and form fields of one request to the site endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub method: HttpMethod,
    /// Raw query string appended to the endpoint
    pub query: Option<String>,
    /// Form fields of a POST, in insertion order
    pub form: Vec<(String, String)>,
}

impl RequestSpec {
    pub fn get(query: Option<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            query,
            form: Vec::new(),
        }
    }

    pub fn post(form: Vec<(String, String)>) -> Self {
        Self {
            method: HttpMethod::Post,
            query: None,
            form,
        }
    }

    /// Looks up a form field by key
    pub fn form_value(&self, key: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The endpoint URL with this request's query string
    pub fn url(&self, endpoint: &Url) -> Url {
        let mut url = endpoint.clone();
        if let Some(query) = &self.query {
            url.set_query(Some(query));
        }
        url
    }
}

fn field(key: &str, value: impl Into<String>) -> (String, String) {
    (key.to_string(), value.into())
}

/// The search page holding the faculty selection list
pub fn bootstrap() -> RequestSpec {
    RequestSpec::get(Some(format!("prgname={}", PRG_SEARCH)))
}

/// JSON listing of a faculty's tracks
pub fn track_list(faculty: &Faculty) -> RequestSpec {
    RequestSpec::post(vec![
        field(PRGNAME, PRG_JSON),
        field(JSON_FACULTY_ARG, faculty.id.to_string()),
        field(JSON_ACTION_ARG, TRACK_LIST_ACTION),
    ])
}

/// Program table of a track for the track's year
pub fn program_list(track: &Track) -> RequestSpec {
    RequestSpec::post(vec![
        field(PRGNAME, PRG_PROGRAMS),
        field(ARGUMENTS, [FACULTY_ARG, YEAR_ARG, TRACK_ARG].join(",")),
        field(TRACK_ARG, track.id.to_string()),
        field(YEAR_ARG, track.year.to_string()),
        field(FACULTY_ARG, track.faculty_id.to_string()),
    ])
}

/// Course table of a program, addressed the way the program's link addresses it
pub fn course_list(program: &Program) -> RequestSpec {
    RequestSpec::get(Some(format!(
        "prgname={}&arguments={},{}",
        PRG_COURSES,
        numeric_token(program.link_year),
        numeric_token(program.id)
    )))
}

/// Page listing the groups of a course, one button per group
pub fn group_index(course: &Course) -> RequestSpec {
    RequestSpec::post(vec![
        field(PRGNAME, PRG_GROUPS),
        field(ARGUMENTS, numeric_token(&course.id)),
    ])
}

/// Detail page of one group, from the `onclick` handler of its button
///
/// The handler must carry four `-N` tokens; anything else is a protocol
/// mismatch for that button only.
pub fn group_detail(onclick: &str) -> Result<RequestSpec, ExtractionError> {
    let caps = GROUP_ARGS_RE
        .captures(onclick)
        .ok_or_else(|| ExtractionError::ProtocolMismatch(onclick.to_string()))?;

    let arguments = (1..=4)
        .map(|i| numeric_token(&caps[i]))
        .collect::<Vec<_>>()
        .join(",");

    Ok(RequestSpec::post(vec![
        field(PRGNAME, PRG_GROUP_DETAIL),
        field(ARGUMENTS, arguments),
    ]))
}
