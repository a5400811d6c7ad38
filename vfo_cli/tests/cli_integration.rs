use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[band]
f_min_hz = 7000000.0
f_max_hz = 7200000.0
start_hz = 7074000.0
label = "40 Meter"

[encoder]
detent_divisor = 1
debounce_ms = 50
"#;
    let path = dir.path().join("vfo.toml");
    fs::write(&path, toml).unwrap();
    path
}

#[rstest]
#[case(&["--help"], "Usage:", "stdout")]
#[case(&["check-config"], "40 Meter", "stdout")]
#[case(&["sim", "--detents", "10", "--interval-ms", "100"], "final:", "stdout")]
fn cli_table_cases(#[case] args: &[&str], #[case] needle: &str, #[case] stream: &str) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("vfo").unwrap();
    cmd.arg("--config").arg(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().success();
    match stream {
        "stdout" => assert.stdout(predicate::str::contains(needle)),
        _ => assert.stderr(predicate::str::contains(needle)),
    };
}

#[test]
fn missing_config_falls_back_to_defaults() {
    let mut cmd = Command::cargo_bin("vfo").unwrap();
    cmd.arg("--config")
        .arg("does/not/exist.toml")
        .arg("check-config");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("7074000"));
}

#[test]
fn invalid_config_is_rejected_with_a_hint() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(
        &path,
        "[band]\nf_min_hz = 7200000.0\nf_max_hz = 7000000.0\n",
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("vfo").unwrap();
    cmd.arg("--config").arg(&path).arg("check-config");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("How to fix"));
}

#[test]
fn sim_reverse_tunes_down() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("vfo").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("--json")
        .args(["sim", "--detents", "5", "--interval-ms", "200", "--reverse"]);
    let output = cmd.assert().success().get_output().stdout.clone();

    let line = String::from_utf8(output).unwrap();
    let v: serde_json::Value = serde_json::from_str(line.lines().last().unwrap()).unwrap();
    assert_eq!(v["event"], "sim");
    assert!(v["delta_hz"].as_f64().unwrap() < 0.0, "{v}");
}

#[test]
fn sim_presses_advance_the_cursor() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("vfo").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("--json")
        .args(["sim", "--detents", "0", "--presses", "2"]);
    let output = cmd.assert().success().get_output().stdout.clone();

    let line = String::from_utf8(output).unwrap();
    let v: serde_json::Value = serde_json::from_str(line.lines().last().unwrap()).unwrap();
    // Cursor starts at digit 6 and wraps to 1, then 2.
    assert_eq!(v["cursor_digit"], 2);
}
