//! Integration tests for the `zigwatch` CLI binary.
//!
//! These tests validate argument parsing, help output, shell completions,
//! and error handling — all without requiring a live MQTT broker.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `zigwatch` binary with env isolation.
///
/// Clears all `ZIGWATCH_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn zigwatch_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("zigwatch");
    cmd.env("HOME", "/tmp/zigwatch-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/zigwatch-cli-test-nonexistent")
        .env_remove("ZIGWATCH_PROFILE")
        .env_remove("ZIGWATCH_BROKER")
        .env_remove("ZIGWATCH_USERNAME")
        .env_remove("ZIGWATCH_PASSWORD")
        .env_remove("ZIGWATCH_COORDINATORS")
        .env_remove("ZIGWATCH_OUTPUT")
        .env_remove("ZIGWATCH_TIMEOUT");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = zigwatch_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    zigwatch_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("Zigbee2MQTT")
            .and(predicate::str::contains("monitor"))
            .and(predicate::str::contains("devices"))
            .and(predicate::str::contains("topics")),
    );
}

#[test]
fn test_version_flag() {
    zigwatch_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("zigwatch"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    zigwatch_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    zigwatch_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = zigwatch_cmd().arg("foobar").output().unwrap();
    assert!(
        !output.status.success(),
        "Expected failure for invalid subcommand"
    );
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_monitor_no_broker_config() {
    zigwatch_cmd()
        .args(["monitor"])
        .assert()
        .failure()
        .stderr(
            predicate::str::contains("config")
                .or(predicate::str::contains("Configuration"))
                .or(predicate::str::contains("broker")),
        );
}

#[test]
fn test_monitor_broker_without_coordinators() {
    // A broker flag alone is not enough: the run has nothing to subscribe
    // to without coordinators, and that is a usage error (exit 2).
    let output = zigwatch_cmd()
        .args(["monitor", "--broker", "mqtt://127.0.0.1:1883"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected usage exit code");
    let text = combined_output(&output);
    assert!(
        text.contains("coordinator"),
        "Expected error about missing coordinators:\n{text}"
    );
}

#[test]
fn test_invalid_broker_url() {
    zigwatch_cmd()
        .args([
            "monitor",
            "--broker",
            "https://not-mqtt.example",
            "--coordinator",
            "zigbee15",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("mqtt").or(predicate::str::contains("scheme")));
}

#[test]
fn test_invalid_output_format() {
    let output = zigwatch_cmd()
        .args(["--output", "invalid", "monitor"])
        .output()
        .unwrap();
    assert!(
        !output.status.success(),
        "Expected failure for invalid output format"
    );
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("possible values") || text.contains("valid value"),
        "Expected error about valid output formats:\n{text}"
    );
}

#[test]
fn test_invalid_duration() {
    let output = zigwatch_cmd()
        .args([
            "monitor",
            "--duration",
            "bogus",
            "--broker",
            "mqtt://127.0.0.1",
            "--coordinator",
            "zigbee15",
        ])
        .output()
        .unwrap();
    assert!(!output.status.success(), "Expected failure for bad duration");
}

#[test]
fn test_remove_stranded_conflicts_with_no_interactive() {
    let output = zigwatch_cmd()
        .args([
            "monitor",
            "--remove-stranded",
            "--no-interactive",
            "--broker",
            "mqtt://127.0.0.1",
            "--coordinator",
            "zigbee15",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected clap conflict error");
}

#[test]
fn test_monitor_unreachable_broker_fails() {
    // Port 1 on localhost should refuse immediately; the run is fatal with
    // a connection-class exit code, no retries.
    let output = zigwatch_cmd()
        .args([
            "monitor",
            "--broker",
            "mqtt://127.0.0.1:1",
            "--coordinator",
            "zigbee15",
            "--timeout",
            "2",
        ])
        .output()
        .unwrap();
    assert!(
        !output.status.success(),
        "Expected failure against unreachable broker"
    );
    let text = combined_output(&output);
    assert!(
        text.contains("broker") || text.contains("connect") || text.contains("Broker"),
        "Expected connection error mentioning the broker:\n{text}"
    );
}

#[test]
fn test_config_show_no_config() {
    // `config show` renders defaults even when no config file exists.
    zigwatch_cmd().args(["config", "show"]).assert().success();
}

#[test]
fn test_config_use_unknown_profile() {
    zigwatch_cmd()
        .args(["config", "use", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope"));
}

// ── Subcommand help discovery ───────────────────────────────────────

#[test]
fn test_monitor_flags_exist() {
    zigwatch_cmd()
        .args(["monitor", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--remove-stranded")
                .and(predicate::str::contains("--no-interactive"))
                .and(predicate::str::contains("--duration"))
                .and(predicate::str::contains("--fail-on-offline")),
        );
}

#[test]
fn test_devices_flags_exist() {
    zigwatch_cmd()
        .args(["devices", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--filter").and(predicate::str::contains("--details")),
        );
}

#[test]
fn test_config_subcommands_exist() {
    zigwatch_cmd()
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("init")
                .and(predicate::str::contains("show"))
                .and(predicate::str::contains("profiles"))
                .and(predicate::str::contains("set-password")),
        );
}

#[test]
fn test_global_flags_parse() {
    // All flags should parse — the failure should be about the missing
    // broker configuration, not argument parsing.
    zigwatch_cmd()
        .args([
            "--output",
            "json",
            "--verbose",
            "--quiet",
            "--timeout",
            "5",
            "topics",
        ])
        .assert()
        .failure()
        .stderr(
            predicate::str::contains("config")
                .or(predicate::str::contains("Configuration"))
                .or(predicate::str::contains("broker")),
        );
}
