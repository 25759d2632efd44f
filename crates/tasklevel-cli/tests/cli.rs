//! CLI integration tests
//!
//! Runs the `tasklevel` binary against project files in a temp directory and
//! checks output and exit codes.
//!
//! | Exit Code | Meaning |
//! |-----------|---------|
//! | 0 | Success |
//! | 1 | Issues found, conflicts present, or leveling did not converge |

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const CLASHING: &str = r#"{
  "name": "clash",
  "resources": [{"id": "R", "name": "Resource R", "max_hours_per_day": 8.0}],
  "tasks": [
    {"id": "A", "name": "Task A", "start": "2025-01-01", "end": "2025-01-05",
     "effort_hours": 40.0, "assigned": ["R"], "total_float": 5},
    {"id": "B", "name": "Task B", "start": "2025-01-01", "end": "2025-01-05",
     "effort_hours": 40.0, "assigned": ["R"], "total_float": 5}
  ]
}"#;

const PINNED: &str = r#"{
  "name": "pinned",
  "resources": [{"id": "R", "max_hours_per_day": 8.0}],
  "tasks": [
    {"id": "A", "start": "2025-01-01", "end": "2025-01-02",
     "effort_hours": 16.0, "assigned": ["R"], "is_critical": true},
    {"id": "B", "start": "2025-01-01", "end": "2025-01-02",
     "effort_hours": 16.0, "assigned": ["R"], "total_float": 5,
     "constraint": {"type": "must_start_on", "date": "2025-01-01"}}
  ]
}"#;

const BROKEN: &str = r#"{
  "name": "broken",
  "resources": [{"id": "R", "max_hours_per_day": 8.0}],
  "tasks": [
    {"id": "A", "start": "2025-01-01", "end": "2025-01-02", "assigned": ["ghost"]},
    {"id": "B", "start": "2025-01-01", "end": "2025-01-02",
     "predecessors": [{"predecessor": "missing"}]}
  ]
}"#;

fn tasklevel() -> Command {
    Command::new(env!("CARGO_BIN_EXE_tasklevel"))
}

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn run(args: &[&str], file: &Path) -> Output {
    tasklevel()
        .args(args)
        .arg(file)
        .output()
        .expect("failed to execute tasklevel")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// =============================================================================
// check
// =============================================================================

#[test]
fn check_clean_project_exits_0() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "clash.json", CLASHING);

    let output = run(&["check"], &file);

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("clash: ok (2 tasks, 1 resources)"));
}

#[test]
fn check_reports_dangling_references() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "broken.json", BROKEN);

    let output = run(&["check"], &file);
    let text = stdout(&output);

    assert_eq!(output.status.code(), Some(1));
    assert!(text.contains("unknown resource 'ghost'"));
    assert!(text.contains("'missing' which doesn't exist"));
    assert!(text.contains("broken: 2 error(s)"));
}

#[test]
fn check_validates_config() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "clash.json", CLASHING);
    let config = write(&dir, "level.toml", "max_undo_steps = 0\n");

    let output = tasklevel()
        .arg("check")
        .arg(&file)
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("max_undo_steps must be at least 1"));
}

#[test]
fn unparseable_project_fails_with_context() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "bad.json", "{ not json");

    let output = run(&["check"], &file);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to parse project file"));
}

// =============================================================================
// conflicts
// =============================================================================

#[test]
fn conflicts_text_lists_periods() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "clash.json", CLASHING);

    let output = run(&["conflicts"], &file);
    let text = stdout(&output);

    assert_eq!(output.status.code(), Some(1));
    assert!(text.contains("R 2025-01-01..2025-01-05 (5 day(s), peak 16.0h): A, B"));
    assert!(text.contains("Utilization"));
}

#[test]
fn conflicts_json_is_parseable() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "clash.json", CLASHING);

    let output = run(&["conflicts", "--format", "json"], &file);
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();

    assert_eq!(value["conflicts"].as_array().unwrap().len(), 5);
    assert_eq!(value["conflicts"][0]["severity"], 1.0);
    assert_eq!(value["periods"].as_array().unwrap().len(), 1);
}

// =============================================================================
// level
// =============================================================================

#[test]
fn level_converges_and_writes_output() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "clash.json", CLASHING);
    let out = dir.path().join("leveled.json");

    let output = tasklevel()
        .arg("level")
        .arg(&file)
        .args(["--max-shift-days", "10", "-o"])
        .arg(&out)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    let text = stdout(&output);
    assert!(text.contains("Leveling converged"));
    assert!(text.contains("A (Task A): 2025-01-01..2025-01-05 -> 2025-01-06..2025-01-10 (+5 days)"));

    let leveled: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(leveled["tasks"][0]["start"], "2025-01-06");
    assert_eq!(leveled["tasks"][1]["start"], "2025-01-01");

    // the leveled file has nothing left to do
    let again = run(&["conflicts"], &out);
    assert_eq!(again.status.code(), Some(0));
    assert!(stdout(&again).contains("No overallocations"));
}

#[test]
fn level_stalls_on_pinned_tasks() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "pinned.json", PINNED);

    let output = run(&["level", "--format", "json"], &file);
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(value["outcome"], "stalled");
    assert_eq!(value["success"], false);
    assert!(value["history"].as_array().unwrap().is_empty());
    assert_eq!(value["summary"]["conflicts_remaining"], 2);
}

#[test]
fn level_backward_from_flag() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "clash.json", CLASHING.replace("2025-01-0", "2025-01-1").as_str());

    let output = run(&["level", "--strategy", "backward", "--format", "json"], &file);
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(value["history"][0]["shift_days"], -5);
    assert_eq!(value["history"][0]["new_start"], "2025-01-06");
}

#[test]
fn level_rejects_unknown_strategy() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "clash.json", CLASHING);

    let output = run(&["level", "--strategy", "sideways"], &file);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown leveling strategy"));
}

#[test]
fn level_refuses_invalid_config() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "clash.json", CLASHING);
    let out = dir.path().join("leveled.json");

    let output = tasklevel()
        .arg("level")
        .arg(&file)
        .args(["--max-iterations", "0", "-o"])
        .arg(&out)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("max_iterations must be at least 1"));
    assert!(!out.exists());
}
