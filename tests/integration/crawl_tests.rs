//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the registration site and run the
//! full five-level crawl end-to-end.

use catalog_ripple::config::{
    Config, CrawlerConfig, FilterConfig, OutputConfig, SiteConfig, UserAgentConfig,
};
use catalog_ripple::crawler::run_crawl;
use catalog_ripple::model::{Course, EntityKind, Group, Program, Record, Track};
use catalog_ripple::storage::{RunStatus, SqliteStorage, Storage};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENDPOINT_PATH: &str = "/fireflyweb.aspx";

/// Creates a test configuration pointing at the mock server
fn create_test_config(server: &MockServer, dir: &TempDir, faculty: Option<u32>) -> Config {
    Config {
        site: SiteConfig {
            endpoint: format!("{}{}", server.uri(), ENDPOINT_PATH),
        },
        filters: FilterConfig {
            faculty,
            track: None,
            year: 2016,
        },
        crawler: CrawlerConfig {
            max_concurrent_requests: 4,
            request_timeout: 5,
            numeric_default: 0.0,
            max_retries: 0,
            retry_delay: 0,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            database_path: path_in(dir, "catalog.db"),
            summary_path: path_in(dir, "summary.md"),
            records_path: Some(path_in(dir, "records.jsonl")),
        },
    }
}

fn path_in(dir: &TempDir, name: &str) -> String {
    dir.path().join(name).to_string_lossy().into_owned()
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html; charset=utf-8")
}

fn json(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "application/json")
}

async fn mount_get(server: &MockServer, query: (&str, &str), extra: Option<(&str, &str)>, response: ResponseTemplate) {
    let mut mock = Mock::given(method("GET"))
        .and(path(ENDPOINT_PATH))
        .and(query_param(query.0, query.1));
    if let Some((key, value)) = extra {
        mock = mock.and(query_param(key, value));
    }
    mock.respond_with(response).mount(server).await;
}

async fn mount_post(server: &MockServer, fragments: &[&str], response: ResponseTemplate) {
    let mut mock = Mock::given(method("POST")).and(path(ENDPOINT_PATH));
    for fragment in fragments {
        mock = mock.and(body_string_contains(*fragment));
    }
    mock.respond_with(response).mount(server).await;
}

fn program_table(rows: &[(&str, u64)]) -> String {
    let rows: String = rows
        .iter()
        .map(|(name, id)| {
            format!(
                r#"<tr><td>{}</td><td><a href="fireflyweb.aspx?prgname=S_SHOW_PROGS&amp;arguments=-N2016,-N{}">Courses</a></td><td></td></tr>"#,
                name, id
            )
        })
        .collect();
    format!(
        r#"<table id="myTable0"><tr><td>Program</td><td></td><td>Comment</td></tr>{}</table>"#,
        rows
    )
}

fn group_button(course: &str, group: &str) -> String {
    format!(
        r#"<input type="button" name="B2" value="Group" onclick="GoTo('fireflyweb.aspx','post','S_YPratem','-N+{},-N1,-N+1,-N+{},-N')">"#,
        course, group
    )
}

fn group_page(group: &str, points: &str) -> String {
    format!(
        r#"<table class="text">
            <tr><td>Course</td><td>Name</td></tr>
            <tr><td>Type</td><td>Semester</td></tr>
            <tr><td>Points: {}</td><td>Hours: 4</td></tr>
            <tr><td>Lecturer: Dr. Levi</td><td>Group: {}</td></tr>
            <tr><td><b>Exams</b>Dates<br>Term date time<br>Moed A on day 12/02/2017 09:00</td></tr>
        </table>
        <table id="myTable0"><caption>Schedule</caption>
            <tr><td>Id</td><td>Name</td><td>Type</td><td>When</td><td>Who</td><td>Link</td></tr>
            <tr><td>{}9</td><td>Lab</td><td>Lab</td><td>Mon</td><td>Dr. Levi</td><td>none</td></tr>
        </table>"#,
        points, group, group
    )
}

/// Two faculties; faculty 11 has a full branch down to groups, faculty 12
/// has one track with no programs.
async fn mount_catalog(server: &MockServer, failing_course: Option<&str>) {
    mount_get(
        server,
        ("prgname", "Enter_Search"),
        None,
        html(
            r#"<form><select name="R1C9">
                <option value="11">Computer Science</option>
                <option value="12">Mathematics</option>
            </select></form>"#,
        ),
    )
    .await;

    mount_post(
        server,
        &["PRGNAME=JSON", "Faculty=11", "Action=700"],
        json(r#"{"Answer":[{"Code":3,"Name":"General"}]}"#),
    )
    .await;
    mount_post(
        server,
        &["PRGNAME=JSON", "Faculty=12", "Action=700"],
        json(r#"{"Answer":[{"Code":"5","Name":"Applied"}]}"#),
    )
    .await;

    mount_post(
        server,
        &["PRGNAME=S_PROG", "R1C2=3", "HUG=11"],
        html(&program_table(&[("Mandatory", 114100101)])),
    )
    .await;
    mount_post(
        server,
        &["PRGNAME=S_PROG", "R1C2=5", "HUG=12"],
        html(&program_table(&[])),
    )
    .await;

    mount_get(
        server,
        ("prgname", "S_SHOW_PROGS"),
        Some(("arguments", "-N2016,-N114100101")),
        html(
            r#"<table id="myTable0">
                <thead><tr><th>Id</th><th>Name</th><th></th><th></th><th>Comment</th></tr></thead>
                <tbody>
                    <tr><td>10111</td><td>Intro</td><td></td><td>btn</td><td>Core</td></tr>
                    <tr><td>10222</td><td>Algorithms</td><td></td><td>btn</td></tr>
                    <tr><td>broken</td></tr>
                </tbody>
            </table>"#,
        ),
    )
    .await;

    for (course, group, points) in [("10111", "1011101", "3.5"), ("10222", "1022201", "TBD")] {
        if failing_course == Some(course) {
            mount_post(
                server,
                &["PRGNAME=S_LOOK_FOR_NOSE", &format!("-N{}", course)],
                ResponseTemplate::new(500),
            )
            .await;
        } else {
            mount_post(
                server,
                &["PRGNAME=S_LOOK_FOR_NOSE", &format!("-N{}", course)],
                html(&group_button(course, group)),
            )
            .await;
        }
        mount_post(
            server,
            &["PRGNAME=S_YPratem", &format!("-N{}", group)],
            html(&group_page(group, points)),
        )
        .await;
    }
}

fn load_records(db_path: &str, item_type: &str) -> Vec<Record> {
    let storage = SqliteStorage::new(Path::new(db_path)).expect("Failed to open database");
    let run = storage
        .get_latest_run()
        .expect("Failed to query runs")
        .expect("No run stored");
    storage
        .get_records(run.id, item_type)
        .expect("Failed to load records")
}

fn tracks(records: Vec<Record>) -> Vec<Track> {
    records
        .into_iter()
        .filter_map(|r| match r {
            Record::Track(t) => Some(t),
            _ => None,
        })
        .collect()
}

fn programs(records: Vec<Record>) -> Vec<Program> {
    records
        .into_iter()
        .filter_map(|r| match r {
            Record::Program(p) => Some(p),
            _ => None,
        })
        .collect()
}

fn courses(records: Vec<Record>) -> Vec<Course> {
    records
        .into_iter()
        .filter_map(|r| match r {
            Record::Course(c) => Some(c),
            _ => None,
        })
        .collect()
}

fn groups(records: Vec<Record>) -> Vec<Group> {
    records
        .into_iter()
        .filter_map(|r| match r {
            Record::Group(g) => Some(g),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_full_crawl_five_levels() {
    let server = MockServer::start().await;
    mount_catalog(&server, None).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir, None);
    let db_path = config.output.database_path.clone();
    let summary_path = config.output.summary_path.clone();
    let records_path = config.output.records_path.clone().unwrap();

    let report = run_crawl(config, "test-hash").await.expect("Crawl failed");

    // bootstrap, 2 track lists, 2 program lists, 1 course list,
    // 2 group indexes, 2 group details
    assert_eq!(report.requests_dispatched, 10);
    assert_eq!(report.requests_failed, 0);
    // 2 faculties, 2 tracks, 1 program, 2 courses, 2 groups
    assert_eq!(report.records_emitted, 9);

    let faculty_ratio = report.ratios[&EntityKind::Faculty];
    assert_eq!((faculty_ratio.error_count, faculty_ratio.total_count), (0, 2));
    let course_ratio = report.ratios[&EntityKind::Course];
    assert_eq!((course_ratio.error_count, course_ratio.total_count), (1, 3));
    assert!((course_ratio.error_ratio - 1.0 / 3.0).abs() < 1e-9);
    assert_eq!(report.ratios[&EntityKind::Exam].total_count, 2);
    assert_eq!(report.ratios[&EntityKind::SiblingCourse].total_count, 2);
    assert_eq!(report.ratios[&EntityKind::Dependency].total_count, 0);

    // Groups carry their full ancestry
    let groups = groups(load_records(&db_path, "Group"));
    assert_eq!(groups.len(), 2);
    let intro = groups.iter().find(|g| g.course_id == "10111").unwrap();
    assert_eq!(intro.id, 1011101);
    assert_eq!(intro.faculty_id, 11);
    assert_eq!(intro.track_id, 3);
    assert_eq!(intro.program_id, 114100101);
    assert_eq!(intro.year, 2016);
    assert_eq!(intro.points, 3.5);
    assert_eq!(intro.lecturer, "Dr. Levi");
    assert_eq!(intro.exams.len(), 1);
    assert_eq!(intro.exams[0].date, "12/02/2017");
    assert_eq!(intro.sibling_courses.len(), 1);

    let algorithms = groups.iter().find(|g| g.course_id == "10222").unwrap();
    assert_eq!(algorithms.points, 0.0);

    let courses = courses(load_records(&db_path, "Course"));
    assert_eq!(courses.len(), 2);
    let algorithms_course = courses.iter().find(|c| c.id == "10222").unwrap();
    assert_eq!(algorithms_course.comment, "");

    // Run bookkeeping and outputs
    let storage = SqliteStorage::new(Path::new(&db_path)).unwrap();
    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "test-hash");
    assert_eq!(run.totals.requests_dispatched, 10);
    assert_eq!(
        storage.load_error_stats(run.id).unwrap()[&EntityKind::Course].error_count,
        1
    );

    let summary = std::fs::read_to_string(&summary_path).unwrap();
    assert!(summary.contains("| Group | 2 |"));

    let exported = std::fs::read_to_string(&records_path).unwrap();
    assert_eq!(exported.lines().count(), 9);
}

#[tokio::test]
async fn test_referential_integrity() {
    let server = MockServer::start().await;
    mount_catalog(&server, None).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir, None);
    let db_path = config.output.database_path.clone();
    run_crawl(config, "hash").await.expect("Crawl failed");

    let tracks = tracks(load_records(&db_path, "Track"));
    let programs = programs(load_records(&db_path, "Program"));
    let courses = courses(load_records(&db_path, "Course"));
    let groups = groups(load_records(&db_path, "Group"));

    for program in &programs {
        assert!(tracks
            .iter()
            .any(|t| t.id == program.track_id && t.faculty_id == program.faculty_id));
    }
    for course in &courses {
        assert!(programs.iter().any(|p| p.id == course.program_id
            && p.track_id == course.track_id
            && p.faculty_id == course.faculty_id));
    }
    for group in &groups {
        assert!(courses.iter().any(|c| c.id == group.course_id
            && c.program_id == group.program_id
            && c.track_id == group.track_id
            && c.faculty_id == group.faculty_id));
    }
}

#[tokio::test]
async fn test_faculty_filter_limits_traversal() {
    let server = MockServer::start().await;

    // Must never be requested when the filter selects faculty 11
    Mock::given(method("POST"))
        .and(path(ENDPOINT_PATH))
        .and(body_string_contains("Faculty=12"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(0)
        .mount(&server)
        .await;
    mount_catalog(&server, None).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir, Some(11));
    let db_path = config.output.database_path.clone();

    let report = run_crawl(config, "hash").await.expect("Crawl failed");
    assert_eq!(report.requests_failed, 0);

    // Both faculties are emitted, only one is followed
    assert_eq!(load_records(&db_path, "Faculty").len(), 2);
    let tracks = tracks(load_records(&db_path, "Track"));
    assert_eq!(tracks.len(), 1);
    assert!(tracks.iter().all(|t| t.faculty_id == 11));
}

#[tokio::test]
async fn test_failed_request_drops_only_its_branch() {
    let server = MockServer::start().await;
    mount_catalog(&server, Some("10222")).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir, None);
    let db_path = config.output.database_path.clone();

    let report = run_crawl(config, "hash").await.expect("Crawl failed");
    assert_eq!(report.requests_failed, 1);
    assert_eq!(report.requests_dispatched, 9);

    // The failure is a transport failure, not an extraction error
    assert_eq!(report.ratios[&EntityKind::Group].error_count, 0);

    let groups = groups(load_records(&db_path, "Group"));
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].course_id, "10111");
    assert_eq!(courses(load_records(&db_path, "Course")).len(), 2);
}

#[tokio::test]
async fn test_unreachable_site_completes_empty_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir, None);
    let db_path = config.output.database_path.clone();

    let report = run_crawl(config, "hash").await.expect("Crawl failed");
    assert_eq!(report.requests_dispatched, 1);
    assert_eq!(report.requests_failed, 1);
    assert_eq!(report.records_emitted, 0);

    let storage = SqliteStorage::new(Path::new(&db_path)).unwrap();
    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert!(storage.count_records_by_type(run.id).unwrap().is_empty());
}
