//! End-to-end tests over the compiled binary.
//!
//! Each test gets a private HOME so config and database state cannot leak
//! between tests or into the developer's real data directory. The `run`
//! command hosts a live loop until Ctrl-C and is exercised by the core
//! integration tests instead.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_pomotrace"))
        .env("HOME", home)
        // XDG paths win over HOME inside dirs, so they must go too.
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("XDG_DATA_HOME")
        .env_remove("POMOTRACE_PROBE")
        .env_remove("POMOTRACE_ENV")
        .args(args)
        .output()
        .expect("failed to execute CLI binary");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);
    (stdout, stderr, code)
}

#[test]
fn config_show_prints_defaults() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "show"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["durations"]["work"], 25);
    assert_eq!(parsed["timer"]["long_break_interval"], 4);
    assert_eq!(parsed["tracking"]["interval_secs"], 5);
}

#[test]
fn config_get_reads_dot_paths() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "get", "durations.work"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "25");
}

#[test]
fn config_set_persists_across_invocations() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "set", "durations.work", "50"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "ok");

    let (stdout, _, code) = run_cli(home.path(), &["config", "get", "durations.work"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "50");
}

#[test]
fn config_get_unknown_key_fails() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["config", "get", "durations.nap"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn config_reset_restores_defaults() {
    let home = TempDir::new().unwrap();
    let (_, _, code) = run_cli(home.path(), &["config", "set", "durations.work", "50"]);
    assert_eq!(code, 0);
    let (_, _, code) = run_cli(home.path(), &["config", "reset"]);
    assert_eq!(code, 0);
    let (stdout, _, code) = run_cli(home.path(), &["config", "get", "durations.work"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "25");
}

#[test]
fn stats_all_on_fresh_database_is_zeroed() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["stats", "all"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["total_sessions"], 0);
    assert_eq!(parsed["streak_days"], 0);
}

#[test]
fn stats_today_reports_the_date() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["stats", "today"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(parsed["date"].is_string());
    assert_eq!(parsed["work_sessions_today"], 0);
}

#[test]
fn stats_sessions_on_fresh_database_is_empty() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["stats", "sessions"]);
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed.as_array().map(Vec::len), Some(0));
}

#[test]
fn status_without_checkpoint_says_so() {
    let home = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["status"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("no tracking run persisted"));
}

#[test]
fn usage_last_without_sessions_fails() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["usage", "--last"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("no matching session"));
}

#[test]
fn usage_requires_a_session_selector() {
    let home = TempDir::new().unwrap();
    let (_, _, code) = run_cli(home.path(), &["usage"]);
    assert_ne!(code, 0);
}

#[test]
fn probe_check_uses_the_static_backend() {
    let home = TempDir::new().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_pomotrace"))
        .env("HOME", home.path())
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("XDG_DATA_HOME")
        .env("POMOTRACE_PROBE", "static:editor:Editor")
        .args(["probe", "check"])
        .output()
        .expect("failed to execute CLI binary");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["id"], "editor");
    assert_eq!(parsed["display_name"], "Editor");
}
