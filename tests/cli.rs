//! Command-line behaviour of the `moduleflow` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn demo_page() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/home.json")
}

fn moduleflow() -> Command {
    Command::cargo_bin("moduleflow").unwrap()
}

#[test]
fn render_prints_document_to_stdout() {
    moduleflow()
        .arg("render")
        .arg(demo_page())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<!DOCTYPE html>"))
        .stdout(predicate::str::contains("<div class=\"page-row\">"))
        .stdout(predicate::str::contains("data-module-id=\"7\"").not())
        .stdout(predicate::str::contains("Members area").not());
}

#[test]
fn render_writes_output_with_layout_overrides() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("site/index.html");

    moduleflow()
        .arg("render")
        .arg(demo_page())
        .args(["-l", "sidebar=narrow-column", "--layout", "main=3/4"])
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let html = fs::read_to_string(&output).unwrap();
    assert!(html.contains("<aside class=\"narrow-column\">"));
    assert!(html.contains("<main class=\"page-main\" data-layout=\"3/4\">"));
}

#[test]
fn render_dev_profile_shows_diagnostics() {
    moduleflow()
        .args(["render", "--dev"])
        .arg(demo_page())
        .assert()
        .success()
        .stdout(predicate::str::contains("module-diagnostic"))
        .stdout(predicate::str::contains("unsupported-future-type"));
}

#[test]
fn render_authenticated_viewer_sees_gated_module() {
    moduleflow()
        .args(["render", "--auth", "authenticated"])
        .arg(demo_page())
        .assert()
        .success()
        .stdout(predicate::str::contains("Members area"));
}

#[test]
fn render_reads_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("moduleflow.toml");
    fs::write(
        &config,
        "[auth]\nlogin_url = \"/login\"\n\n[output]\ntitle = \"Demo home\"\n",
    )
    .unwrap();

    moduleflow()
        .arg("render")
        .arg(demo_page())
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("<title>Demo home</title>"))
        .stdout(predicate::str::contains("class=\"login-prompt\""));
}

#[test]
fn check_reports_each_module() {
    moduleflow()
        .arg("check")
        .arg(demo_page())
        .assert()
        .success()
        .stdout(predicate::str::contains("1\theader\tok hero"))
        .stdout(predicate::str::contains("3\tmain\tskip:"))
        .stdout(predicate::str::contains("unknown module type `unsupported-future-type`"))
        .stdout(predicate::str::contains("6 of 8 modules valid"));
}

#[test]
fn missing_source_fails() {
    moduleflow()
        .args(["render", "does-not-exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn unsupported_source_extension_fails() {
    let temp_dir = TempDir::new().unwrap();
    let page = temp_dir.path().join("page.txt");
    fs::write(&page, "[]").unwrap();

    moduleflow()
        .arg("check")
        .arg(&page)
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected .json, .yaml or .yml"));
}
