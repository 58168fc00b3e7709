use std::fs;
use std::path::PathBuf;
use std::process::Command;

use serde_json::Value;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_pitch_cli"))
}

fn readings_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("pitch_cli_{}_{}.txt", name, std::process::id()));
    fs::write(&path, contents).expect("write readings");
    path
}

fn json_lines(stdout: &[u8]) -> Vec<Value> {
    String::from_utf8(stdout.to_vec())
        .expect("stdout utf8")
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect()
}

#[test]
fn convert_prints_percent_grade() {
    let output = cli()
        .args(["convert", "--angle", "45", "--unit", "percent"])
        .output()
        .expect("convert command");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "100%");
}

#[test]
fn convert_json_saturates_near_vertical() {
    let output = cli()
        .args(["convert", "--angle", "90", "--unit", "grade", "--json"])
        .output()
        .expect("convert command");

    assert!(output.status.success());
    let reading: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(reading["value"], 9999);
}

#[test]
fn measure_locks_and_reports_snapshot() {
    let path = readings_file("lock", "# steady\n20.0 1.0\n");
    let output = cli()
        .args(["measure", "--readings"])
        .arg(&path)
        .args([
            "--end",
            "repeat",
            "--interval-ms",
            "10",
            "--threshold-ms",
            "200",
            "--poll-ms",
            "50",
            "--timeout-secs",
            "10",
        ])
        .output()
        .expect("measure command");
    fs::remove_file(&path).ok();

    assert!(
        output.status.success(),
        "measure exited with {:?}: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );
    let lines = json_lines(&output.stdout);
    assert!(lines.iter().any(|line| line["type"] == "confirm_prompt"));

    let snapshot = lines.last().expect("snapshot line");
    assert_eq!(snapshot["state"], "locked");
    assert_eq!(snapshot["final_pitch"], 200);
}

#[test]
fn measure_with_submit_ends_submitted() {
    let path = readings_file("submit", "33.3\n");
    let output = cli()
        .args(["measure", "--submit", "--readings"])
        .arg(&path)
        .args([
            "--end",
            "repeat",
            "--interval-ms",
            "10",
            "--threshold-ms",
            "100",
            "--poll-ms",
            "20",
        ])
        .output()
        .expect("measure command");
    fs::remove_file(&path).ok();

    assert!(output.status.success());
    let lines = json_lines(&output.stdout);
    assert!(lines.iter().any(|line| line["type"] == "submitting"));
    assert_eq!(lines.last().unwrap()["state"], "submitted");
}

#[test]
fn measure_rejects_bad_script_line() {
    let path = readings_file("bad", "10\nabc\n");
    let output = cli()
        .args(["measure", "--readings"])
        .arg(&path)
        .output()
        .expect("measure command");
    fs::remove_file(&path).ok();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains(":2:"));
}

#[test]
fn level_emits_readouts() {
    let path = readings_file("level", "4 1\n0.2 0.1\n4 1\n4 1\n");
    let output = cli()
        .args(["level", "--zero-at", "3", "--readings"])
        .arg(&path)
        .output()
        .expect("level command");
    fs::remove_file(&path).ok();

    assert!(output.status.success());
    let lines = json_lines(&output.stdout);
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[1]["edge"], "entered");
    assert_eq!(lines[2]["edge"], "left");
    assert_eq!(lines[3]["kind"], "applied");
    assert_eq!(lines[4]["pitch"]["value"], 0);
    assert_eq!(lines[4]["edge"], "entered");
}
