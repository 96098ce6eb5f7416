//! CLI tests for the tp binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const ROUND_TRIP_SCRIPT: &str = r#"
- type: USER_MESSAGE
  text: Paris
- type: INTENT_RECEIVED
  intent:
    entities:
      destination: Paris
- type: DATE_RANGE_SELECTED
  departure: 2025-06-01
  returnDate: 2025-06-08
- type: TRAVELERS_SELECTED
  adults: 2
- type: TRIP_TYPE_CONFIRMED
  tripType: roundtrip
- type: SEARCH_SUCCEEDED
"#;

fn tp(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tp").expect("tp binary should build");
    // Keep log files and config lookups inside the temp dir
    cmd.current_dir(dir.path())
        .env("XDG_DATA_HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path())
        .env("HOME", dir.path())
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_replay_text_output() {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("events.yml");
    std::fs::write(&script, ROUND_TRIP_SCRIPT).unwrap();

    tp(&dir)
        .args(["replay", "events.yml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tripTypeConfirm"))
        .stdout(predicate::str::contains("SEARCH_SUCCEEDED ignored"))
        .stdout(predicate::str::contains("ReadyToSearch"));
}

#[test]
fn test_replay_json_output() {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("events.yml");
    std::fs::write(&script, ROUND_TRIP_SCRIPT).unwrap();

    let output = tp(&dir)
        .args(["replay", "events.yml", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["final"]["currentState"], "ReadyToSearch");
    assert_eq!(report["final"]["isReadyToSearch"], true);
    assert_eq!(report["steps"].as_array().unwrap().len(), 6);
    assert_eq!(report["steps"][5]["status"]["status"], "ignored");
}

#[test]
fn test_resolve_facts_file() {
    let dir = TempDir::new().unwrap();
    let facts = dir.path().join("facts.json");
    std::fs::write(&facts, r#"{"destination":"Paris","departureDate":"2025-06-01"}"#).unwrap();

    tp(&dir)
        .args(["resolve", "facts.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("returnDatePicker"))
        .stdout(predicate::str::contains("progress: 40%"));
}

#[test]
fn test_config_switches_to_range_picker() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(".tripplanner.yml"),
        "resolver:\n  range-picker-for-roundtrip: true\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("facts.yml"), "destination: Paris\n").unwrap();

    tp(&dir)
        .args(["resolve", "facts.yml", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dateRangePicker"));
}

#[test]
fn test_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    tp(&dir)
        .args(["replay", "nope.yml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}
