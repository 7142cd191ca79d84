//! Fixed query protocol of the registration site
//!
//! Key names and program names are dictated by the remote `fireflyweb.aspx`
//! endpoint. Identifiers embedded in `ARGUMENTS` carry the `-N` numeric token
//! prefix.

use regex::Regex;
use std::sync::LazyLock;

pub const PRGNAME: &str = "PRGNAME";
pub const ARGUMENTS: &str = "ARGUMENTS";

/// Year form key
pub const YEAR_ARG: &str = "R1C1";
/// Track ("maslul") form key
pub const TRACK_ARG: &str = "R1C2";
/// Name of the faculty selection list on the search page
pub const FACULTY_LIST_ARG: &str = "R1C9";
/// Faculty ("hug") form key of the program search
pub const FACULTY_ARG: &str = "HUG";

pub const JSON_FACULTY_ARG: &str = "Faculty";
pub const JSON_ACTION_ARG: &str = "Action";
/// Action code of the JSON track listing
pub const TRACK_LIST_ACTION: &str = "700";

pub const PRG_SEARCH: &str = "Enter_Search";
pub const PRG_JSON: &str = "JSON";
pub const PRG_PROGRAMS: &str = "S_PROG";
pub const PRG_COURSES: &str = "S_SHOW_PROGS";
pub const PRG_GROUPS: &str = "S_LOOK_FOR_NOSE";
pub const PRG_GROUP_DETAIL: &str = "S_YPratem";

/// Prefix of every numeric token inside `ARGUMENTS`
pub const NUMERIC_TOKEN_PREFIX: &str = "-N";

/// Name of the per-group buttons on a course page
pub const GROUP_BUTTON_NAME: &str = "B2";

/// Course-list link of a program row: `prgname=S_SHOW_PROGS&arguments=-N<year>,-N<id>`
pub static PROGRAM_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"prgname=S_SHOW_PROGS&arguments=-N(?P<year>\d+),-N(?P<prog>\d+)")
        .expect("valid program link regex")
});

/// Four numeric tokens inside a group button's `onclick` handler; the site pads
/// them with spaces or `+`
pub static GROUP_ARGS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-N[\s+]*(\d+),\s*-N[\s+]*(\d+),\s*-N[\s+]*(\d+),\s*-N[\s+]*(\d+)")
        .expect("valid group arguments regex")
});

/// Formats a value as a `-N` numeric token
pub fn numeric_token(value: impl std::fmt::Display) -> String {
    format!("{}{}", NUMERIC_TOKEN_PREFIX, value)
}
