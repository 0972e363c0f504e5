//! Integration tests for the hirecache binary
//!
//! Every test points the binary at its own temporary cache directory and
//! only exercises paths that need no network access.

use std::path::Path;
use std::process::Command;

use hirecache::cache::{CacheKey, CacheStore, ReportKind};
use serde_json::json;
use tempfile::TempDir;

/// Helper to run the CLI with given args against a cache directory
fn run_cli(cache_dir: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_hirecache"))
        .args(args)
        .arg("--cache-dir")
        .arg(cache_dir)
        // Nothing listens here; any accidental request fails fast.
        .args(["--base-url", "http://127.0.0.1:9/api/v1"])
        .output()
        .expect("Failed to execute hirecache")
}

fn seed(cache_dir: &Path, kind: ReportKind, id: &str) {
    let store = CacheStore::with_dir(cache_dir.to_path_buf());
    store
        .put(&CacheKey::new(kind, id).unwrap(), json!({"seeded": kind.as_str()}))
        .expect("seeding the cache should succeed");
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = Command::new(env!("CARGO_BIN_EXE_hirecache"))
        .arg("--help")
        .output()
        .expect("Failed to execute hirecache");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("hirecache"));
    assert!(stdout.contains("status"));
    assert!(stdout.contains("refresh"));
}

#[test]
fn test_status_on_empty_cache_reports_all_absent() {
    let temp_dir = TempDir::new().unwrap();

    let output = run_cli(temp_dir.path(), &["status", "42"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("document: absent | written: absent | interview: absent | final: absent"),
        "unexpected output: {}",
        stdout
    );
}

#[test]
fn test_status_shows_cached_entries() {
    let temp_dir = TempDir::new().unwrap();
    seed(temp_dir.path(), ReportKind::Document, "42");

    let output = run_cli(temp_dir.path(), &["status", "42", "--json"]);

    assert!(output.status.success());
    let status: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("status --json should print JSON");
    assert_eq!(status["statuses"]["document"]["exists"], json!(true));
    assert_eq!(status["statuses"]["document"]["expired"], json!(false));
    assert_eq!(status["statuses"]["written"]["exists"], json!(false));
}

#[test]
fn test_load_lists_missing_reports_without_network() {
    let temp_dir = TempDir::new().unwrap();
    seed(temp_dir.path(), ReportKind::Document, "42");

    let output = run_cli(temp_dir.path(), &["load", "42"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("written-test report"));
    assert!(stdout.contains("interview report"));
    assert!(!stdout.contains("document report"));
}

#[test]
fn test_clear_one_kind_keeps_final() {
    let temp_dir = TempDir::new().unwrap();
    seed(temp_dir.path(), ReportKind::Document, "5");
    seed(temp_dir.path(), ReportKind::Final, "5");

    let output = run_cli(temp_dir.path(), &["clear", "document", "5"]);
    assert!(output.status.success());

    let store = CacheStore::with_dir(temp_dir.path().to_path_buf());
    assert!(store
        .get(&CacheKey::new(ReportKind::Document, "5").unwrap())
        .is_none());
    assert!(store
        .get(&CacheKey::new(ReportKind::Final, "5").unwrap())
        .is_some());
}

#[test]
fn test_clear_all_then_list_is_empty() {
    let temp_dir = TempDir::new().unwrap();
    for kind in ReportKind::ALL {
        seed(temp_dir.path(), kind, "5");
    }

    let output = run_cli(temp_dir.path(), &["clear", "all", "5"]);
    assert!(output.status.success());

    let output = run_cli(temp_dir.path(), &["list"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No cached reports"));
}

#[test]
fn test_list_shows_stored_keys() {
    let temp_dir = TempDir::new().unwrap();
    seed(temp_dir.path(), ReportKind::Written, "17");

    let output = run_cli(temp_dir.path(), &["list"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("17"));
    assert!(stdout.contains("written"));
}

#[test]
fn test_unknown_target_is_rejected() {
    let temp_dir = TempDir::new().unwrap();

    let output = run_cli(temp_dir.path(), &["clear", "summary", "5"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("summary"), "stderr: {}", stderr);
}

#[test]
fn test_refresh_without_backend_fails_cleanly() {
    let temp_dir = TempDir::new().unwrap();

    let output = run_cli(temp_dir.path(), &["refresh", "document", "5"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error"), "stderr: {}", stderr);
}
