//! End-to-end tests for the `deptrust` binary: argument parsing, exit codes,
//! and output-format gating. Tests that would need live registry/advisory
//! HTTP calls (the `scan` happy path against a real manifest) are covered at
//! the HTTP layer by the wiremock tests under `src/`, not here.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn deptrust() -> Command {
    Command::cargo_bin("deptrust").unwrap()
}

fn saved_report(path: &str, managers: &[&str], highest_severity: &str) -> serde_json::Value {
    serde_json::json!({
        "summary": {
            "path": path,
            "dependency_count": 0,
            "highest_severity": highest_severity,
            "managers": managers,
        },
        "findings": [],
        "stats": {},
        "signal_summary": {"category_counts": {}, "category_severity": {}, "severity_totals": {}},
    })
}

#[test]
fn list_managers_prints_known_manager_names() {
    deptrust()
        .arg("list-managers")
        .assert()
        .success()
        .stdout(predicate::str::contains("cargo"))
        .stdout(predicate::str::contains("npm"));
}

#[test]
fn list_managers_json_emits_a_json_array() {
    let output = deptrust().args(["list-managers", "--json"]).output().unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(parsed.is_array());
    assert!(parsed.as_array().unwrap().iter().any(|v| v == "cargo"));
}

#[test]
fn scan_of_an_empty_directory_exits_with_no_manifests_code() {
    let dir = tempdir().unwrap();
    deptrust()
        .args(["--directory", dir.path().to_str().unwrap(), "scan"])
        .assert()
        .code(3);
}

#[test]
fn report_json_format_without_output_path_is_a_usage_error() {
    let dir = tempdir().unwrap();
    let report_path = dir.path().join("report.json");
    fs::write(&report_path, saved_report("/tmp/project", &["cargo"], "none").to_string()).unwrap();

    deptrust()
        .args(["report", "--input", report_path.to_str().unwrap(), "--format", "json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--output"));
}

#[test]
fn report_command_on_a_missing_file_exits_with_read_error_code() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("does-not-exist.json");
    deptrust()
        .args(["report", "--input", missing.to_str().unwrap()])
        .assert()
        .code(4);
}

#[test]
fn report_command_on_malformed_json_exits_with_read_error_code() {
    let dir = tempdir().unwrap();
    let bad = dir.path().join("bad.json");
    fs::write(&bad, "{ not json").unwrap();
    deptrust()
        .args(["report", "--input", bad.to_str().unwrap()])
        .assert()
        .code(4);
}

#[test]
fn report_command_renders_a_saved_clean_report_to_the_table_format() {
    let dir = tempdir().unwrap();
    let report_path = dir.path().join("report.json");
    fs::write(&report_path, saved_report("/tmp/project", &["cargo"], "none").to_string()).unwrap();

    deptrust()
        .args(["report", "--input", report_path.to_str().unwrap()])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("deptrust"));
}

#[test]
fn report_command_exits_high_for_a_saved_critical_report() {
    let dir = tempdir().unwrap();
    let report_path = dir.path().join("report.json");
    fs::write(&report_path, saved_report("/tmp/project", &["npm"], "critical").to_string()).unwrap();

    deptrust()
        .args(["report", "--input", report_path.to_str().unwrap()])
        .assert()
        .code(2);
}

#[test]
fn pre_upgrade_with_an_unknown_ecosystem_is_a_usage_error() {
    deptrust()
        .args(["pre-upgrade", "not-a-real-ecosystem", "left-pad", "1.0.0"])
        .assert()
        .code(2);
}

#[test]
fn diagnostics_prints_resolved_configuration() {
    deptrust()
        .arg("diagnostics")
        .assert()
        .success()
        .stdout(predicate::str::contains("cache directory"));
}

#[test]
fn help_lists_every_subcommand() {
    deptrust()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("scan"))
        .stdout(predicate::str::contains("pre-upgrade"))
        .stdout(predicate::str::contains("report"))
        .stdout(predicate::str::contains("diagnostics"))
        .stdout(predicate::str::contains("list-managers"));
}
