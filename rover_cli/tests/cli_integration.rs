use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[control]
deadzone = 10
min_speed = 50
max_speed = 255

[safety]
watchdog_timeout_ms = 2000

[runner]
# fast loop keeps the tests short
tick_hz = 500

[gamepad]
max_gamepads = 2
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["self-check"], 0, "OK", "stdout")]
#[case(&["drive", "--ticks", "5"], 0, "after 5 ticks (disconnected)", "stdout")]
#[case(
    &["drive", "--ticks", "5", "--sim-connect"],
    0,
    "(connected_disarmed)",
    "stdout"
)]
#[case(&["drive", "--ticks", "3", "--stats"], 0, "Rover Stats", "stderr")]
#[case(&["drive", "--tick-hz", "0", "--ticks", "1"], 5, "tick_hz must be > 0", "stderr")]
#[case(&["fly"], 2, "unrecognized subcommand", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("rover").unwrap();
    cmd.arg("--config").arg(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[test]
fn runs_with_builtin_defaults_when_no_config_given() {
    Command::cargo_bin("rover")
        .unwrap()
        .arg("self-check")
        .assert()
        .success()
        .stdout(predicate::str::contains("OK (sim backend, disconnected)"));
}

#[test]
fn invalid_config_is_explained() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("bad.toml");
    fs::write(&cfg, "[control]\nmin_speed = 200\nmax_speed = 100\n").unwrap();

    Command::cargo_bin("rover")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("self-check")
        .assert()
        .code(5)
        .stderr(predicate::str::contains("What happened: Configuration is invalid"))
        .stderr(predicate::str::contains("min_speed must be <= control.max_speed"));
}

#[test]
fn health_prints_json_status() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let out = Command::cargo_bin("rover")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("health")
        .output()
        .unwrap();
    assert!(out.status.success());
    let line = String::from_utf8(out.stdout).unwrap();
    let v: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
    assert_eq!(v["status"], "ok");
    assert_eq!(v["state"], "disconnected");
    assert_eq!(v["tick_hz"], 500);
    assert_eq!(v["max_speed"], 255);
}

#[test]
fn actuator_fault_is_logged_and_drive_continues() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    Command::cargo_bin("rover")
        .unwrap()
        .env("ROVER_TEST_SIM_DRIVE", "1")
        .env("ROVER_TEST_SIM_FAULT", "1")
        .arg("--config")
        .arg(&cfg)
        .arg("drive")
        .arg("--ticks")
        .arg("10")
        .arg("--sim-connect")
        .assert()
        .success()
        .stdout(predicate::str::contains("after 10 ticks (connected_armed)"))
        .stderr(predicate::str::contains("injected fault"));
}

#[test]
fn json_summary_counts_actuator_faults() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let out = Command::cargo_bin("rover")
        .unwrap()
        .env("ROVER_TEST_SIM_DRIVE", "1")
        .env("ROVER_TEST_SIM_FAULT", "1")
        .arg("--config")
        .arg(&cfg)
        .arg("--json")
        .arg("drive")
        .arg("--ticks")
        .arg("10")
        .arg("--sim-connect")
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    let line = stdout.lines().last().unwrap();
    let v: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(v["ticks"], 10);
    assert_eq!(v["actuator_faults"], 1);
    assert_eq!(v["state"], "connected_armed");
}
