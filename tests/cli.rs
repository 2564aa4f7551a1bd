mod common;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use common::{pdf_with_pages, write_config_file};
use wakeup::hashing::hash_bytes;

fn wakeup_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("wakeup");
    path
}

fn run_wakeup(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = wakeup_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("WAKEUP_API_TOKEN")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run wakeup binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn setup_with_pdf(pages: &[&str]) -> (TempDir, PathBuf, PathBuf, String) {
    let tmp = TempDir::new().unwrap();
    let config_path = write_config_file(tmp.path());
    let bytes = pdf_with_pages(pages);
    let pdf_path = tmp.path().join("reading.pdf");
    fs::write(&pdf_path, &bytes).unwrap();
    let hash = hash_bytes(&bytes);
    (tmp, config_path, pdf_path, hash)
}

#[test]
fn test_ingest_then_show() {
    let (_tmp, config_path, pdf_path, hash) = setup_with_pdf(&["morning", "evening"]);

    let (stdout, stderr, success) =
        run_wakeup(&config_path, &["ingest", pdf_path.to_str().unwrap()]);
    assert!(success, "ingest failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains(&hash));
    assert!(stdout.contains("pages: 2"));

    let (stdout, _, success) = run_wakeup(&config_path, &["show", &hash]);
    assert!(success);
    assert!(stdout.contains("--- page 1 ---"));
    assert!(stdout.contains("morning"));
    assert!(stdout.contains("--- page 2 ---"));
    assert!(stdout.contains("evening"));
}

#[test]
fn test_ingest_twice_reports_duplicate() {
    let (_tmp, config_path, pdf_path, _) = setup_with_pdf(&["once"]);

    let (_, _, success) = run_wakeup(&config_path, &["ingest", pdf_path.to_str().unwrap()]);
    assert!(success);

    let (_, stderr, success) = run_wakeup(&config_path, &["ingest", pdf_path.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("File already uploaded"));
}

#[test]
fn test_plan_batches() {
    let (_tmp, config_path, pdf_path, hash) =
        setup_with_pdf(&["one", "two", "three", "four", "five"]);
    run_wakeup(&config_path, &["ingest", pdf_path.to_str().unwrap()]);

    let (stdout, stderr, success) = run_wakeup(&config_path, &["plan", &hash, "--per-batch", "2"]);
    assert!(success, "plan failed: {}", stderr);
    assert!(stdout.contains("5 pages in 3 batches"));
    assert!(stdout.contains("batch 3: pages 5-5"));
}

#[test]
fn test_show_unknown_hash() {
    let tmp = TempDir::new().unwrap();
    let config_path = write_config_file(tmp.path());
    let (_, stderr, success) = run_wakeup(&config_path, &["show", "deadbeef"]);
    assert!(!success);
    assert!(stderr.contains("No document stored"));
}

#[test]
fn test_schedule_without_deliveries_errors() {
    let tmp = TempDir::new().unwrap();
    let config_path = write_config_file(tmp.path());
    let (_, stderr, success) = run_wakeup(&config_path, &["schedule"]);
    assert!(!success);
    assert!(stderr.contains("No deliveries configured"));
}

#[test]
fn test_model_unsupported_pair_fails_before_network() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("missing.json");
    let (_, stderr, success) = run_wakeup(
        &config_path,
        &["model", "text-to-music", "groq", "--token", "t"],
    );
    assert!(!success);
    assert!(stderr.contains("text-to-music"));
    assert!(stderr.contains("groq"));
}

#[test]
fn test_model_requires_token() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("missing.json");
    let (_, stderr, success) = run_wakeup(&config_path, &["model", "model-list", "openai"]);
    assert!(!success);
    assert!(stderr.contains("WAKEUP_API_TOKEN"));
}

#[test]
fn test_missing_config_errors() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_wakeup(&tmp.path().join("nope.json"), &["show", "abc"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}
