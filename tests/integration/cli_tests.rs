//! CLI integration tests
//!
//! These tests run `resrepo` against resource roots built in a temporary
//! directory.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// A library with a default and a French string, a color and a layout
fn fixture() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let res = dir.path().join("res");
    write(
        &res,
        "values/values.xml",
        r##"<resources>
    <string name="hello">hello</string>
    <color name="black">#000000</color>
</resources>"##,
    );
    write(
        &res,
        "values-fr/strings.xml",
        r#"<resources><string name="hello">bonjour</string></resources>"#,
    );
    write(
        &res,
        "layout/main.xml",
        r#"<FrameLayout xmlns:android="http://schemas.android.com/apk/res/android" android:id="@+id/root"/>"#,
    );
    (dir, res)
}

fn resrepo() -> Command {
    let mut cmd = Command::cargo_bin("resrepo").expect("Binary not found");
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

/// Run resrepo with arguments and return (stdout, stderr, success)
fn run_cli(args: &[&str]) -> (String, String, bool) {
    let output = resrepo().args(args).output().expect("Failed to execute command");
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

fn json_report(args: &[&str]) -> serde_json::Value {
    let (stdout, stderr, success) = run_cli(args);
    assert!(success, "resrepo failed: {}", stderr);
    serde_json::from_str(&stdout).expect("stdout should be a JSON report")
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_cli_help() {
    resrepo()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("resrepo"))
        .stdout(predicate::str::contains("--write-cache"))
        .stdout(predicate::str::contains("--parallel"));
}

#[test]
fn test_cli_version() {
    resrepo()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("resrepo"));
}

#[test]
fn test_cli_summary() {
    let (_dir, res) = fixture();

    resrepo()
        .arg(&res)
        .assert()
        .success()
        .stdout(predicate::str::contains("namespace res-auto"))
        .stdout(predicate::str::contains("5 resources"))
        .stderr(predicate::str::contains("Loaded 5 resources from 1 repositories"));
}

#[test]
fn test_cli_quiet_only_prints_report() {
    let (_dir, res) = fixture();

    resrepo()
        .arg(&res)
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::contains("5 resources"))
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_cli_missing_root_is_empty() {
    let dir = TempDir::new().unwrap();

    resrepo()
        .arg(dir.path().join("res"))
        .assert()
        .success()
        .stdout(predicate::str::contains("No resources found"));
}

// ============================================================================
// Listing Tests
// ============================================================================

#[test]
fn test_cli_list_by_type_and_name() {
    let (_dir, res) = fixture();

    resrepo()
        .arg(&res)
        .args(["--type", "string", "--name", "hello"])
        .assert()
        .success()
        .stdout(predicate::str::contains("string/hello"))
        .stdout(predicate::str::contains("string-fr/hello"))
        .stdout(predicate::str::contains("bonjour"))
        .stdout(predicate::str::contains("2 matching variants"));
}

#[test]
fn test_cli_unknown_type_fails() {
    let (_dir, res) = fixture();

    resrepo()
        .arg(&res)
        .args(["--type", "nonsense"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown resource type"));
}

#[test]
fn test_cli_public_only() {
    let (dir, res) = fixture();
    write(dir.path(), "public.txt", "color black\n");

    let report = json_report(&[res.to_str().unwrap(), "--type", "color", "--public-only", "--format", "json"]);
    let items = report["repositories"][0]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "black");

    let report = json_report(&[res.to_str().unwrap(), "--type", "string", "--public-only", "--format", "json"]);
    assert!(report["repositories"][0]["items"].as_array().unwrap().is_empty());
}

// ============================================================================
// Output Format Tests
// ============================================================================

#[test]
fn test_cli_json_summary() {
    let (_dir, res) = fixture();

    let report = json_report(&[res.to_str().unwrap(), "--format", "json"]);
    assert_eq!(report["version"], "1.0");

    let repository = &report["repositories"][0];
    assert_eq!(repository["namespace"], "res-auto");
    assert_eq!(repository["total_items"], 5);
    assert_eq!(repository["types"]["string"]["items"], 2);
    assert_eq!(repository["types"]["id"]["items"], 1);
    assert!(repository.get("items").is_none());
}

#[test]
fn test_cli_json_output_file() {
    let (dir, res) = fixture();
    let output = dir.path().join("report.json");

    resrepo()
        .arg(&res)
        .args(["--format", "json", "--output"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Report written to"));

    let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(report["repositories"][0]["total_items"], 5);
}

#[test]
fn test_cli_format_from_config() {
    let (dir, res) = fixture();
    let config = dir.path().join("resrepo.toml");
    fs::write(&config, "[report]\nformat = \"json\"\n").unwrap();

    let report = json_report(&[res.to_str().unwrap(), "--config", config.to_str().unwrap()]);
    assert_eq!(report["repositories"][0]["total_items"], 5);
}

#[test]
fn test_cli_namespace_and_library_name() {
    let (_dir, res) = fixture();

    let report = json_report(&[
        res.to_str().unwrap(),
        "--namespace",
        "com.example.lib",
        "--library-name",
        "com.example:lib:1.0",
        "--format",
        "json",
    ]);
    let repository = &report["repositories"][0];
    assert_eq!(repository["namespace"], "com.example.lib");
    assert_eq!(repository["package_name"], "com.example.lib");
    assert_eq!(repository["library_name"], "com.example:lib:1.0");
}

// ============================================================================
// Multiple Roots and Cache Tests
// ============================================================================

#[test]
fn test_cli_parallel_mode() {
    let (_first_dir, first) = fixture();
    let (_second_dir, second) = fixture();

    let (stdout, stderr, success) = run_cli(&[
        first.to_str().unwrap(),
        second.to_str().unwrap(),
        "--parallel",
    ]);

    assert!(success, "Parallel load should succeed: {}", stderr);
    assert!(stderr.contains("Parallel mode"), "Should announce parallel mode");
    assert!(stderr.contains("from 2 repositories"));
    assert_eq!(stdout.matches("5 resources").count(), 2);
}

#[test]
fn test_cli_write_then_read_cache() {
    let (dir, res) = fixture();
    let cache = dir.path().join("resources.cache");

    resrepo()
        .arg(&res)
        .arg("--write-cache")
        .arg(&cache)
        .assert()
        .success();
    assert!(cache.exists());

    let from_xml = json_report(&[res.to_str().unwrap(), "--type", "string", "--format", "json"]);
    let from_cache = json_report(&["--read-cache", cache.to_str().unwrap(), "--type", "string", "--format", "json"]);
    assert_eq!(from_xml["repositories"], from_cache["repositories"]);
}

#[test]
fn test_cli_write_cache_needs_one_root() {
    let (_first_dir, first) = fixture();
    let (_second_dir, second) = fixture();

    resrepo()
        .arg(&first)
        .arg(&second)
        .arg("--write-cache")
        .arg(first.with_file_name("resources.cache"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("exactly one resource directory"));
}

#[test]
fn test_cli_read_and_write_cache_conflict() {
    resrepo()
        .args(["--read-cache", "a.cache", "--write-cache", "b.cache"])
        .assert()
        .failure();
}

#[test]
fn test_cli_read_corrupt_cache_fails() {
    let dir = TempDir::new().unwrap();
    let cache = dir.path().join("broken.cache");
    fs::write(&cache, b"garbage").unwrap();

    resrepo()
        .arg("--read-cache")
        .arg(&cache)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read cache"));
}
