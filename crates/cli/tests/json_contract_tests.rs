// Integration tests enforcing the --json stdout contract and exit codes.
//
// These tests guarantee that stdout from `bursar run --json` is:
//   1. Valid JSON
//   2. Exactly one JSON value (logs and summaries go to stderr)
//   3. The report envelope shape
//
// Run with: cargo test -p bursar-cli --test json_contract_tests -- --nocapture

use std::path::PathBuf;
use std::process::{Command, Output};

fn bursar() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_bursar"));
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"));
    cmd.env_remove("RUST_LOG");
    cmd.env_remove("BURSAR_CONFIG");
    cmd
}

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../recon/tests/fixtures")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

fn run(args: &[&str]) -> Output {
    let snapshot = fixture("school.snapshot.json");
    let config = fixture("school.recon.toml");
    bursar()
        .args(["run", "--snapshot", &snapshot, "--config", &config, "--as-of", "2026-03-20T10:00:00Z"])
        .args(args)
        .output()
        .expect("bursar run")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Assert stdout is a single, parseable JSON value with no extra lines.
fn assert_single_json(stdout: &[u8]) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(stdout);
    let trimmed = stdout.trim();
    assert!(!trimmed.is_empty(), "stdout should not be empty");

    serde_json::from_str(trimmed).unwrap_or_else(|e| {
        panic!("stdout must be valid JSON.\nParse error: {}\nstdout:\n{}", e, trimmed)
    })
}

// ===========================================================================
// bursar run --json
// ===========================================================================

#[test]
fn run_json_produces_report_envelope() {
    let output = run(&["--json"]);
    assert!(output.status.success(), "exit code: {:?}\nstderr: {}", output.status, stderr(&output));

    let val = assert_single_json(&output.stdout);
    let obj = val.as_object().expect("should be JSON object");
    for key in [
        "meta",
        "summary",
        "irregularities",
        "overdue_payments",
        "demand_analysis",
        "payment_methods",
        "monthly",
        "cashiers",
        "data_quality",
    ] {
        assert!(obj.contains_key(key), "must have '{key}' key");
    }

    assert_eq!(val["meta"]["as_of"], "2026-03-20T10:00:00Z");
    assert_eq!(val["summary"]["total_revenue"], 65_000);
    assert_eq!(val["irregularities"].as_array().unwrap().len(), 2);
    assert_eq!(val["irregularities"][0]["kind"], "session_gap");
}

#[test]
fn run_json_is_deterministic_for_fixed_as_of() {
    let first = run(&["--json"]);
    let second = run(&["--json"]);
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn verbose_logs_stay_on_stderr() {
    let output = run(&["--json", "--verbose"]);
    assert!(output.status.success());
    assert_single_json(&output.stdout);
    assert!(stderr(&output).contains("derived reports"), "stderr: {}", stderr(&output));
}

#[test]
fn run_without_json_prints_only_summary() {
    let output = run(&[]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty(), "stdout should be empty without --json");
    let err = stderr(&output);
    assert!(err.contains("2 irregularities (1 high)"), "stderr: {err}");
    assert!(err.contains("data quality: 2 record(s)"), "stderr: {err}");
}

#[test]
fn output_file_receives_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reports.json");
    let output = run(&["--output", path.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let written = std::fs::read_to_string(&path).unwrap();
    let val: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(val["meta"]["config_name"], "Main campus");
}

#[test]
fn filters_reach_the_engine() {
    let output = run(&["--json", "--cashier", "2", "--from", "2026-03-04", "--to", "2026-03-04"]);
    assert!(output.status.success());
    let val = assert_single_json(&output.stdout);
    assert_eq!(val["summary"]["total_revenue"], 5000);
    assert_eq!(val["cashiers"].as_array().unwrap().len(), 1);
    assert_eq!(val["irregularities"][0]["session_id"], "s3");
}

// ===========================================================================
// Exit codes
// ===========================================================================

#[test]
fn fail_on_high_exits_62_but_still_prints_json() {
    let output = run(&["--json", "--fail-on", "high"]);
    assert_eq!(output.status.code(), Some(62));
    assert_single_json(&output.stdout);
    assert!(stderr(&output).contains("error: irregularities at or above high"));
}

#[test]
fn fail_on_respects_severity_filter() {
    let output = run(&["--severity", "low", "--fail-on", "medium"]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
}

#[test]
fn invalid_config_exits_60() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.recon.toml");
    std::fs::write(&path, "[severity]\nmedium_above = 9000\nhigh_above = 100\n").unwrap();

    let output = bursar()
        .args(["validate", path.to_str().unwrap()])
        .output()
        .expect("bursar validate");
    assert_eq!(output.status.code(), Some(60));
    assert!(stderr(&output).starts_with("error: config validation error"));
}

#[test]
fn validate_prints_effective_settings() {
    let output = bursar()
        .args(["validate", &fixture("school.recon.toml")])
        .output()
        .expect("bursar validate");
    assert!(output.status.success());
    assert!(stderr(&output).contains("valid: 'Main campus' in XAF"));
}

#[test]
fn missing_snapshot_exits_61() {
    let output = bursar()
        .args(["run", "--snapshot", "does-not-exist.json"])
        .output()
        .expect("bursar run");
    assert_eq!(output.status.code(), Some(61));
    assert!(output.stdout.is_empty());
}

#[test]
fn malformed_snapshot_exits_61_with_hint() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{\"payments\": [").unwrap();

    let output = bursar()
        .args(["run", "--snapshot", path.to_str().unwrap(), "--json"])
        .output()
        .expect("bursar run");
    assert_eq!(output.status.code(), Some(61));
    assert!(output.stdout.is_empty());
    assert!(stderr(&output).contains("hint:"));
}

#[test]
fn null_collections_and_integer_flags_still_derive() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("loose.json");
    std::fs::write(
        &path,
        r#"{"payments": null, "academic_years": [{"id": 1, "is_current": 1}],
            "pricings": [{"id": 1, "installments": null}]}"#,
    )
    .unwrap();

    let output = bursar()
        .args(["run", "--snapshot", path.to_str().unwrap(), "--json", "--as-of", "2026-03-20"])
        .output()
        .expect("bursar run");
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let val = assert_single_json(&output.stdout);
    assert_eq!(val["summary"]["payment_count"], 0);
}

#[test]
fn inverted_window_is_usage_error() {
    let output = run(&["--from", "2026-03-10", "--to", "2026-03-01"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn unknown_severity_is_usage_error() {
    let output = run(&["--severity", "critical"]);
    assert_eq!(output.status.code(), Some(2));
}
