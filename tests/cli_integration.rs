//! Integration tests for netmeter CLI functionality

#![allow(clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_output() {
    let mut cmd = Command::cargo_bin("netmeter").expect("Failed to find netmeter binary");
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Batch network latency survey"))
        .stdout(predicate::str::contains("--skip-ping"))
        .stdout(predicate::str::contains("--skip-traceroute"))
        .stdout(predicate::str::contains("--json"))
        .stdout(predicate::str::contains("--trace-sample"));
}

#[test]
fn test_version_output() {
    let mut cmd = Command::cargo_bin("netmeter").expect("Failed to find netmeter binary");
    cmd.arg("--version");

    let output = cmd.output().expect("Failed to execute command");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("netmeter "));
}

#[test]
fn test_missing_input_is_an_argument_error() {
    let mut cmd = Command::cargo_bin("netmeter").expect("Failed to find netmeter binary");
    cmd.assert().failure();
}

#[test]
fn test_nonexistent_host_file() {
    let mut cmd = Command::cargo_bin("netmeter").expect("Failed to find netmeter binary");
    cmd.arg("/nonexistent/hosts.txt");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("failed to load host list"));
}

#[test]
fn test_latitude_requires_longitude() {
    let mut cmd = Command::cargo_bin("netmeter").expect("Failed to find netmeter binary");
    cmd.args(["--latitude", "40.0", "/nonexistent/hosts.txt"]);

    cmd.assert().failure();
}

#[test]
fn test_both_phases_skipped_is_rejected() {
    // An empty-but-present host file plus both skip flags: the config layer
    // rejects the run before any measurement.
    let dir = std::env::temp_dir().join("netmeter-cli-test");
    std::fs::create_dir_all(&dir).unwrap();
    let file = dir.join("hosts.txt");
    std::fs::write(&file, "192.0.2.1\n").unwrap();

    let mut cmd = Command::cargo_bin("netmeter").expect("Failed to find netmeter binary");
    cmd.arg("--skip-ping").arg("--skip-traceroute").arg(&file);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("nothing to do"));
}
