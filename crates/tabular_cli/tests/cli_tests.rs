use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to get the path to test fixtures
fn fixture_path(name: &str) -> String {
    format!("tests/fixtures/{}", name)
}

#[allow(deprecated)]
fn tabular() -> Command {
    Command::cargo_bin("tabular").expect("Failed to find tabular binary")
}

// ============================================================================
// validate command tests
// ============================================================================

#[test]
fn test_validate_valid_table() {
    tabular()
        .arg("validate")
        .arg(fixture_path("table.csv"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Validation PASSED"))
        .stdout(predicate::str::contains("rows: 2"));
}

#[test]
fn test_validate_invalid_table() {
    tabular()
        .arg("validate")
        .arg(fixture_path("invalid.csv"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Validation FAILED"))
        .stdout(predicate::str::contains("blank-label"))
        .stdout(predicate::str::contains("extra-cell"));
}

#[test]
fn test_validate_json_output() {
    let output = tabular()
        .args(["validate", "--output", "json"])
        .arg(fixture_path("invalid.csv"))
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();
    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["valid"], false);
    assert_eq!(report["stats"]["errors"], 8);
    assert_eq!(report["tasks"][0]["errors"][6]["type"], "blank-row");
}

#[test]
fn test_validate_pick_errors() {
    let output = tabular()
        .args(["validate", "--output", "json", "--pick-errors", "blank-row,extra-cell"])
        .arg(fixture_path("invalid.csv"))
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();
    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["stats"]["errors"], 2);
}

#[test]
fn test_validate_skip_everything_passes() {
    tabular()
        .args(["validate", "--skip-errors", "#table"])
        .arg(fixture_path("invalid.csv"))
        .assert()
        .success();
}

#[test]
fn test_validate_limit_rows() {
    tabular()
        .args(["validate", "--limit-rows", "1"])
        .arg(fixture_path("table.csv"))
        .assert()
        .success()
        .stdout(predicate::str::contains("reached row limit: 1"));
}

#[test]
fn test_validate_with_schema() {
    tabular()
        .arg("validate")
        .arg(fixture_path("table.csv"))
        .arg("--schema")
        .arg(fixture_path("schema.json"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("constraint-error"));
}

#[test]
fn test_validate_resource_descriptor() {
    tabular()
        .arg("validate")
        .arg(fixture_path("resource.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("languages"));
}

#[test]
fn test_validate_json_table_is_data() {
    tabular()
        .arg("validate")
        .arg(fixture_path("table.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("rows: 2"));
}

#[test]
fn test_validate_package() {
    tabular()
        .args(["validate", "--parallel"])
        .arg(fixture_path("package.json"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("foreign-key-error"))
        .stdout(predicate::str::contains("Task 2:"));
}

#[test]
fn test_validate_checklist() {
    tabular()
        .arg("validate")
        .arg(fixture_path("table.csv"))
        .arg("--checklist")
        .arg(fixture_path("checklist.yaml"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("table-dimensions"));
}

#[test]
fn test_validate_unknown_error_code() {
    tabular()
        .args(["validate", "--pick-errors", "no-such-error"])
        .arg(fixture_path("table.csv"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("check-error"));
}

#[test]
fn test_validate_missing_file() {
    tabular()
        .arg("validate")
        .arg("nonexistent.csv")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("scheme-error"));
}

#[test]
fn test_validate_header_rows() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("multi.csv");
    fs::write(&path, "id,name\nkey,label\n1,english\n").unwrap();

    let output = tabular()
        .args(["validate", "--output", "json", "--header-rows", "1,2"])
        .arg(&path)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["tasks"][0]["labels"], serde_json::json!(["id key", "name label"]));
    assert_eq!(report["tasks"][0]["stats"]["rows"], 1);
}

#[test]
fn test_validate_encoding_override() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("latin.csv");
    fs::write(&path, b"id,name\n1,caf\xe9\n").unwrap();

    tabular()
        .args(["validate", "--encoding", "latin1"])
        .arg(&path)
        .assert()
        .success();
    tabular()
        .args(["validate", "--encoding", "utf-8"])
        .arg(&path)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("encoding-error"));
}

// ============================================================================
// describe command tests
// ============================================================================

#[test]
fn test_describe_table() {
    let output = tabular()
        .args(["describe", "--stats"])
        .arg(fixture_path("table.csv"))
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let descriptor: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(descriptor["name"], "table");
    assert_eq!(descriptor["format"], "csv");
    assert_eq!(descriptor["encoding"], "utf-8");
    assert_eq!(descriptor["bytes"], 30);
    assert_eq!(descriptor["stats"]["rows"], 2);
    assert_eq!(descriptor["schema"]["fields"][0]["type"], "integer");
}

#[test]
fn test_describe_yaml_output() {
    tabular()
        .args(["describe", "--output", "yaml"])
        .arg(fixture_path("table.csv"))
        .assert()
        .success()
        .stdout(predicate::str::contains("name: table"))
        .stdout(predicate::str::contains("type: integer"));
}

#[test]
fn test_describe_package() {
    tabular()
        .arg("describe")
        .arg(fixture_path("package.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("people"))
        .stdout(predicate::str::contains("orders"));
}

#[test]
fn test_describe_unknown_output() {
    tabular()
        .args(["describe", "--output", "xml"])
        .arg(fixture_path("table.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported output format"));
}

// ============================================================================
// check command tests
// ============================================================================

#[test]
fn test_check_package() {
    tabular()
        .arg("check")
        .arg(fixture_path("package.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("valid package"))
        .stdout(predicate::str::contains("Foreign Key: person -> people(id)"));
}

#[test]
fn test_check_resource() {
    tabular()
        .arg("check")
        .arg(fixture_path("resource.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("languages"))
        .stdout(predicate::str::contains("Primary Key: id"));
}

#[test]
fn test_check_broken_schema() {
    tabular()
        .args(["check", "--output", "json"])
        .arg(fixture_path("broken_schema.json"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"kind\": \"schema\""))
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_check_invalid_yaml() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("bad.yaml");
    fs::write(&path, "resources: [").unwrap();

    tabular()
        .arg("check")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_check_missing_file() {
    tabular()
        .arg("check")
        .arg("nonexistent.yml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}
