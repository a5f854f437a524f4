//! Smoke tests for the storyboard CLI.
//!
//! These tests verify basic CLI functionality:
//! - `sbd --version` and `sbd version` output version info
//! - `sbd --help` outputs help text
//! - `sbd config show` reports resolved settings

mod common;

use common::{TestEnv, parse_json};
use predicates::prelude::*;

#[test]
fn test_version_flag() {
    TestEnv::new()
        .sbd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sbd"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_version_command_json() {
    let env = TestEnv::new();
    let output = env.sbd().arg("version").assert().success().get_output().stdout.clone();
    let json = parse_json(&output);
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert!(json["commit"].is_string());
    assert!(json["build_timestamp"].is_string());
}

#[test]
fn test_version_command_human() {
    TestEnv::new()
        .sbd()
        .args(["version", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("sbd "));
}

#[test]
fn test_help_flag() {
    TestEnv::new()
        .sbd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("upload"));
}

#[test]
fn test_config_show_sources() {
    let env = TestEnv::new();
    env.write_config("[server]\nport = 9100\n");

    let output = env
        .sbd()
        .args(["config", "show"])
        .env("SBD_HOST", "0.0.0.0")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json = parse_json(&output);

    assert_eq!(json["port"]["value"], 9100);
    assert_eq!(json["port"]["source"], "config");
    assert_eq!(json["host"]["value"], "0.0.0.0");
    assert_eq!(json["host"]["source"], "env:SBD_HOST");
    assert_eq!(json["data_dir"]["source"], "env:SBD_DATA_DIR");
    assert_eq!(json["allowed_origin"]["source"], "default");
}

#[test]
fn test_config_output_format_human() {
    let env = TestEnv::new();
    env.write_config("output_format = \"human\"\n");

    env.sbd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("sbd "));
}

#[test]
fn test_invalid_config_fails() {
    let env = TestEnv::new();
    env.write_config("[schedule]\ntime = \"noon\"\n");

    env.sbd()
        .arg("version")
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"error\""))
        .stderr(predicate::str::contains("config.toml"));
}
