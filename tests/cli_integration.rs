//! CLI Integration Tests
//!
//! Tests the command-line interface end-to-end.

use assert_cmd::Command;
use assert_fs::prelude::*;
use predicates::prelude::*;

/// Get the binary to test.
fn specgate() -> Command {
    let mut cmd = Command::cargo_bin("specgate").unwrap();
    cmd.env_remove("SPECGATE_ROOT");
    cmd
}

/// A command running inside `dir` with `dir` as the workspace root.
fn specgate_in(dir: &assert_fs::TempDir) -> Command {
    let mut cmd = specgate();
    cmd.current_dir(dir.path()).arg("--root").arg(dir.path());
    cmd
}

const SPEC: &str = "# Checkout\n\n## Overview\n\nA one-page checkout for returning customers.\n\n\
## Users\n\n- Returning customers with a saved card\n\n## Requirements\n\n- Pay with a saved card\n";

// ============================================================================
// Help & Version Tests
// ============================================================================

#[test]
fn test_help_flag() {
    specgate()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Quality gates"));
}

#[test]
fn test_version_flag() {
    specgate()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_missing_subcommand_fails() {
    specgate().assert().failure().stderr(predicate::str::contains("Usage:"));
}

// ============================================================================
// Analyze Command Tests
// ============================================================================

#[test]
fn test_analyze_markdown_report() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("spec.md").write_str(SPEC).unwrap();

    specgate_in(&temp)
        .args(["analyze", "spec.md", "--phase", "spec"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# Specification Quality Assessment"))
        .stdout(predicate::str::contains("| Clarity |"));
}

#[test]
fn test_analyze_json() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("plan.md").write_str("# Plan\n\nUse Rust.").unwrap();

    specgate_in(&temp)
        .args(["analyze", "plan.md", "--phase", "plan", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"overall_score\""))
        .stdout(predicate::str::contains("\"degraded\": null"));
}

#[test]
fn test_analyze_stdin() {
    specgate()
        .args(["analyze", "-", "--phase", "tasks"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("**Overall score:** 0/100"))
        .stdout(predicate::str::contains("critical"));
}

#[test]
fn test_analyze_unknown_phase() {
    specgate()
        .args(["analyze", "-", "--phase", "deploy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown workflow phase 'deploy'"));
}

#[test]
fn test_analyze_missing_file() {
    let temp = assert_fs::TempDir::new().unwrap();
    specgate_in(&temp)
        .args(["analyze", "nope.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

// ============================================================================
// Check & Record Tests
// ============================================================================

#[test]
fn test_check_missing_document() {
    let temp = assert_fs::TempDir::new().unwrap();

    specgate_in(&temp)
        .args(["check", "demo", "plan"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Plan document is missing"))
        .stdout(predicate::str::contains("**Quality:** 0/80"));
}

#[test]
fn test_check_unknown_phase() {
    let temp = assert_fs::TempDir::new().unwrap();

    specgate_in(&temp)
        .args(["check", "demo", "deploy", "--format", "json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Unknown workflow phase 'deploy'"))
        .stdout(predicate::str::contains("\"current_phase\": null"));
}

#[test]
fn test_check_with_params() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("params.json")
        .write_str(r#"{"title": "Checkout", "users": ["Returning customers"]}"#)
        .unwrap();

    specgate_in(&temp)
        .args(["check", "demo", "spec", "--params", "params.json", "--format", "json"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("\"synthetic\": true"))
        .stdout(predicate::str::contains("\"document_exists\": false"))
        .stdout(predicate::str::contains("\"can_proceed\": false"))
        .stdout(predicate::str::contains("Specification document is missing"));
}

#[test]
fn test_check_with_empty_params_stays_blocked() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("params.json").write_str("{}").unwrap();
    temp.child(".specgate.toml")
        .write_str("[gates.tasks]\nrequired_quality = 0\nrequired_iterations = 0\n")
        .unwrap();

    specgate_in(&temp)
        .args(["check", "demo", "tasks", "--params", "params.json"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Tasks document is missing"))
        .stdout(predicate::str::contains("[synthetic]"));
}

#[test]
fn test_record_and_history() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("demo/spec.md").write_str(SPEC).unwrap();

    specgate_in(&temp)
        .args(["record", "demo", "spec"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Iteration 1: quality 0 ->"));

    specgate_in(&temp)
        .args(["record", "demo", "spec"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not meaningful"));

    temp.child("demo/.specgate/iterations/spec.json").assert(predicate::path::exists());

    specgate_in(&temp)
        .args(["history", "demo", "spec"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total: 2 iterations"));

    specgate_in(&temp)
        .args(["check", "demo", "spec", "--format", "json"])
        .assert()
        .stdout(predicate::str::contains("\"iteration_count\": 2"));
}

#[test]
fn test_record_without_document() {
    let temp = assert_fs::TempDir::new().unwrap();

    specgate_in(&temp)
        .args(["record", "demo", "plan"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No plan document found"));
}

#[test]
fn test_history_empty() {
    let temp = assert_fs::TempDir::new().unwrap();

    specgate_in(&temp)
        .args(["history", "demo", "tasks"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No iterations recorded"));
}

#[test]
fn test_invalid_project_id() {
    let temp = assert_fs::TempDir::new().unwrap();

    specgate_in(&temp)
        .args(["check", "../escape", "spec"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid project id"));
}

// ============================================================================
// Advance Tests
// ============================================================================

#[test]
fn test_advance_tasks_to_implement() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("demo/tasks/01-api.md").write_str("- [ ] Build the payment API\n").unwrap();

    specgate_in(&temp)
        .args(["advance", "demo", "tasks"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("blocked at tasks"));

    specgate_in(&temp)
        .args(["record", "demo", "tasks", "--file", "demo/tasks/01-api.md"])
        .assert()
        .success();

    specgate_in(&temp)
        .args(["advance", "demo", "tasks"])
        .assert()
        .success()
        .stdout(predicate::str::contains("demo: tasks -> implement"));
}

// ============================================================================
// Gates, Config & Completions
// ============================================================================

#[test]
fn test_gates_table() {
    let temp = assert_fs::TempDir::new().unwrap();

    specgate_in(&temp)
        .arg("gates")
        .assert()
        .success()
        .stdout(predicate::str::contains("quality >=  75"))
        .stdout(predicate::str::contains("implement"));
}

#[test]
fn test_gates_respect_local_config() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child(".specgate.toml").write_str("[gates.plan]\nrequired_quality = 65\n").unwrap();

    specgate_in(&temp)
        .args(["gates", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"required_quality\": 65"));
}

#[test]
fn test_invalid_local_config() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child(".specgate.toml").write_str("[analysis]\nsynthetic_confidence = 2.0\n").unwrap();

    specgate_in(&temp)
        .arg("gates")
        .assert()
        .failure()
        .stderr(predicate::str::contains("synthetic_confidence"));
}

#[test]
fn test_config_shows_toml() {
    let temp = assert_fs::TempDir::new().unwrap();

    specgate_in(&temp)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("[tracker]"));
}

#[test]
fn test_completions_bash() {
    specgate()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("specgate"));
}
