//! Integration tests for upload and validation via CLI.
//!
//! These tests verify:
//! - `sbd upload` stores the sheet, analyzes it and reports a summary
//! - unsupported, oversized and empty sheets are rejected before storing
//! - `sbd validate` reports row errors or a sample

mod common;

use common::{NOW, SAMPLE_CSV, TestEnv, parse_json};
use predicates::prelude::*;

fn upload_count(env: &TestEnv) -> usize {
    std::fs::read_dir(env.data_path().join("uploads"))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

#[test]
fn test_upload_and_analyze() {
    let env = TestEnv::new();
    let path = env.write_file("Sprint 12.CSV", SAMPLE_CSV);

    let output = env
        .sbd()
        .args(["upload", "--now", NOW])
        .arg(&path)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json = parse_json(&output);

    assert_eq!(json["fileName"], "stories-2026-03-02T09-00-00-000Z.csv");
    assert_eq!(json["storiesCount"], 4);
    assert_eq!(json["checksum"].as_str().unwrap().len(), 64);
    assert_eq!(json["analysis"]["overdueCount"], 1);
    assert_eq!(upload_count(&env), 1);

    env.sbd()
        .arg("report")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "\"sourceFile\":\"stories-2026-03-02T09-00-00-000Z.csv\"",
        ));
}

#[test]
fn test_upload_no_analyze() {
    let env = TestEnv::new();
    let path = env.write_file("sprint.csv", SAMPLE_CSV);

    env.sbd()
        .args(["upload", "--no-analyze", "--now", NOW])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"storiesCount\":4"))
        .stdout(predicate::str::contains("\"analysis\"").not());

    env.sbd().arg("report").assert().failure();
}

#[test]
fn test_upload_human() {
    let env = TestEnv::new();
    let path = env.write_file("sprint.csv", SAMPLE_CSV);

    env.sbd()
        .args(["upload", "-H", "--now", NOW])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Uploaded stories-"))
        .stdout(predicate::str::contains("(4 stories)"))
        .stdout(predicate::str::contains("1 overdue, 1 at risk"));
}

#[test]
fn test_upload_rejects_unsupported_extension() {
    let env = TestEnv::new();
    let path = env.write_file("notes.txt", "id,description\nS-1,x\n");

    env.sbd()
        .arg("upload")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file format: txt"));
    assert_eq!(upload_count(&env), 0);
}

#[test]
fn test_upload_rejects_empty_sheet() {
    let env = TestEnv::new();
    let path = env.write_file("empty.csv", "id,description,dueDate\n");

    env.sbd()
        .arg("upload")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("File contains no valid stories"));
    assert_eq!(upload_count(&env), 0);
}

#[test]
fn test_upload_respects_size_limit() {
    let env = TestEnv::new();
    env.write_config("[server]\nmax_upload_bytes = 64\n");
    let path = env.write_file("sprint.csv", SAMPLE_CSV);

    env.sbd()
        .arg("upload")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("File too large"));
    assert_eq!(upload_count(&env), 0);
}

#[test]
fn test_upload_missing_file() {
    let env = TestEnv::new();

    env.sbd()
        .args(["upload", "missing.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("IO error"));
}

#[test]
fn test_validate_ok() {
    let env = TestEnv::new();
    let path = env.write_file("sprint.csv", SAMPLE_CSV);

    let output = env
        .sbd()
        .arg("validate")
        .arg(&path)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json = parse_json(&output);
    assert_eq!(json["storiesCount"], 4);
    assert_eq!(json["sample"].as_array().unwrap().len(), 3);
    assert_eq!(json["sample"][0]["id"], "S-1");
    assert_eq!(upload_count(&env), 0);
}

#[test]
fn test_validate_reports_errors() {
    let env = TestEnv::new();
    let path = env.write_file(
        "bad.csv",
        "id,description,dueDate,duration\n,Missing id,2026-03-01,4\nS-2,,someday,4\n",
    );

    let output = env
        .sbd()
        .arg("validate")
        .arg(&path)
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    let json = parse_json(&output);
    assert_eq!(json["errors"][0], "Row 1: Missing ID");
    assert_eq!(json["errors"][1], "Row 2: Missing description");
    assert_eq!(json["errors"][2], "Row 2: Missing or invalid due date");
    assert!(json["error"].as_str().unwrap().starts_with("Validation failed"));
}

#[test]
fn test_upload_workbook() {
    let env = TestEnv::new();
    let path = env.work_dir.path().join("sprint.xlsx");
    std::fs::copy(
        concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/sprint.xlsx"),
        &path,
    )
    .unwrap();

    let output = env
        .sbd()
        .args(["upload", "--now", NOW])
        .arg(&path)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json = parse_json(&output);

    assert_eq!(json["fileName"], "stories-2026-03-02T09-00-00-000Z.xlsx");
    assert_eq!(json["storiesCount"], 2);
    assert_eq!(json["analysis"]["totalActive"], 2);
    assert_eq!(json["analysis"]["overdueCount"], 0);

    env.sbd()
        .args(["stories", "show", "S-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"dueDate\":\"2026-03-10T00:00:00Z\""));
}
