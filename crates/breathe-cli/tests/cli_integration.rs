//! CLI Integration Tests
//!
//! These tests run the `breathe` binary against a throwaway config and
//! database. None of them need the air-quality service: commands that would
//! contact it point at an unreachable address.
//!
//! ```
//! cargo test --package breathe-cli --test cli_integration
//! ```

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

/// An address nothing listens on.
const UNREACHABLE_URL: &str = "http://127.0.0.1:9";

/// Run breathe with an isolated config and database.
fn run_breathe(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_breathe"))
        .args(args)
        .env("BREATHE_CONFIG", dir.join("config.toml"))
        .env("BREATHE_DB", dir.join("breathe.db"))
        .env("BREATHE_API_URL", UNREACHABLE_URL)
        .env_remove("NO_COLOR")
        .env_remove("RUST_LOG")
        .arg("--no-color")
        .output()
        .expect("Failed to run breathe binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_command() {
    let dir = TempDir::new().unwrap();
    let output = run_breathe(dir.path(), &["--help"]);

    assert!(output.status.success(), "Help should succeed");
    let out = stdout(&output);
    for cmd in ["zones", "status", "read", "pin", "widget", "watch"] {
        assert!(out.contains(cmd), "Help should list {cmd} command");
    }
}

#[test]
fn test_version_command() {
    let dir = TempDir::new().unwrap();
    let output = run_breathe(dir.path(), &["--version"]);

    assert!(output.status.success(), "Version should succeed");
    assert!(stdout(&output).contains("breathe"));
}

#[test]
fn test_subcommand_help() {
    let dir = TempDir::new().unwrap();
    let subcommands = [
        "zones",
        "status",
        "read",
        "pin",
        "pins",
        "standard",
        "watch",
        "widget",
        "config",
        "completions",
    ];

    for cmd in subcommands {
        let output = run_breathe(dir.path(), &[cmd, "--help"]);
        assert!(output.status.success(), "{} --help should succeed", cmd);
        assert!(!stdout(&output).is_empty(), "{} --help should produce output", cmd);
    }
}

#[test]
fn test_completions_bash() {
    let dir = TempDir::new().unwrap();
    let output = run_breathe(dir.path(), &["completions", "bash"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("breathe"));
}

// =============================================================================
// Config Commands
// =============================================================================

#[test]
fn test_config_path_uses_override() {
    let dir = TempDir::new().unwrap();
    let output = run_breathe(dir.path(), &["config", "path"]);

    assert!(output.status.success());
    assert!(stdout(&output).trim().ends_with("config.toml"));
    assert!(stdout(&output).contains(&*dir.path().to_string_lossy()));
}

#[test]
fn test_config_init_then_show() {
    let dir = TempDir::new().unwrap();

    let output = run_breathe(dir.path(), &["config", "init"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(dir.path().join("config.toml").exists());

    let output = run_breathe(dir.path(), &["config", "init"]);
    assert!(!output.status.success(), "Second init without --force should fail");

    let output = run_breathe(dir.path(), &["--format", "json", "config", "show"]);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    // the environment override wins over the file
    assert_eq!(json["api_url"], UNREACHABLE_URL);
    assert_eq!(json["sync"]["refresh_interval_secs"], 60);
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        "[sync]\nrefresh_interval_secs = 1\n",
    )
    .unwrap();

    let output = run_breathe(dir.path(), &["pins"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("refresh_interval_secs"));
}

// =============================================================================
// Offline Commands
// =============================================================================

#[test]
fn test_pin_toggle_persists() {
    let dir = TempDir::new().unwrap();

    let output = run_breathe(dir.path(), &["pin", "srinagar"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "Pinned srinagar\n");

    let output = run_breathe(dir.path(), &["pins"]);
    assert_eq!(stdout(&output), "srinagar\n");

    let output = run_breathe(dir.path(), &["pin", "srinagar"]);
    assert_eq!(stdout(&output), "Unpinned srinagar\n");

    let output = run_breathe(dir.path(), &["pins"]);
    assert_eq!(stdout(&output), "No pinned zones.\n");
}

#[test]
fn test_pins_json() {
    let dir = TempDir::new().unwrap();
    run_breathe(dir.path(), &["pin", "jammu"]);
    run_breathe(dir.path(), &["pin", "anantnag"]);

    let output = run_breathe(dir.path(), &["--format", "json", "pins"]);
    let ids: Vec<String> = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(ids, vec!["anantnag", "jammu"]);
}

#[test]
fn test_standard_round_trip() {
    let dir = TempDir::new().unwrap();

    let output = run_breathe(dir.path(), &["standard"]);
    assert!(stdout(&output).starts_with("NAQI"));

    let output = run_breathe(dir.path(), &["standard", "us"]);
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("US AQI"));

    let output = run_breathe(dir.path(), &["--format", "json", "standard"]);
    assert_eq!(stdout(&output).trim(), "\"us\"");
}

#[test]
fn test_status_offline_without_cache() {
    let dir = TempDir::new().unwrap();
    run_breathe(dir.path(), &["pin", "srinagar"]);

    let output = run_breathe(dir.path(), &["status", "--offline"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "srinagar: no reading\n");
    assert!(stderr(&output).contains("No cached data"));
}

#[test]
fn test_status_fails_when_unreachable_and_uncached() {
    let dir = TempDir::new().unwrap();
    let output = run_breathe(dir.path(), &["--quiet", "status"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Failed to refresh air quality"));
}

#[test]
fn test_read_unreachable_service() {
    let dir = TempDir::new().unwrap();
    let output = run_breathe(dir.path(), &["read", "srinagar"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("srinagar"));
}

#[test]
fn test_widget_with_no_pins_is_empty() {
    let dir = TempDir::new().unwrap();

    let output = run_breathe(dir.path(), &["widget", "add", "7"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).starts_with("Widget 7: Empty"));

    let output = run_breathe(dir.path(), &["--format", "json", "widget", "list"]);
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json[0]["id"], 7);
    assert_eq!(json[0]["status"], "empty");
}

#[test]
fn test_widget_unknown_instance() {
    let dir = TempDir::new().unwrap();

    let output = run_breathe(dir.path(), &["widget", "next", "3"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("not registered"));

    let output = run_breathe(dir.path(), &["widget", "remove", "3"]);
    assert!(!output.status.success());
}

#[test]
fn test_widget_remove() {
    let dir = TempDir::new().unwrap();
    run_breathe(dir.path(), &["widget", "add", "1"]);

    let output = run_breathe(dir.path(), &["widget", "remove", "1"]);
    assert!(output.status.success());

    let output = run_breathe(dir.path(), &["widget", "list"]);
    assert_eq!(stdout(&output), "No widgets registered.\n");
}
