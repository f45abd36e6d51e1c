//! Integration tests for the autosolo CLI.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn autosolo() -> Command {
    cargo_bin_cmd!("autosolo")
}

fn write_chapter_list(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("solo_chapters.json");
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn help_lists_subcommands() {
    autosolo()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("chapters"))
        .stdout(predicate::str::contains("stats"))
        .stdout(predicate::str::contains("identity"));
}

#[test]
fn chapters_prints_gate_breakdown() {
    let dir = TempDir::new().unwrap();
    let path = write_chapter_list(&dir, r#"{"chapters": [30009, 30010, 710001]}"#);

    autosolo()
        .arg("chapters")
        .arg("--file")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("3 chapters"))
        .stdout(predicate::str::contains("gate   3: 2 chapters"))
        .stdout(predicate::str::contains("gate  71: 1 chapters"));
}

#[test]
fn chapters_fails_on_missing_file() {
    let dir = TempDir::new().unwrap();

    autosolo()
        .arg("chapters")
        .arg("--file")
        .arg(dir.path().join("nope.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("chapter list not found"));
}

#[test]
fn chapters_fails_on_empty_list() {
    let dir = TempDir::new().unwrap();
    let path = write_chapter_list(&dir, r#"{"chapters": []}"#);

    autosolo()
        .arg("chapters")
        .arg("--file")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("empty"));
}

#[test]
fn stats_on_fresh_store_shows_zero_resolved() {
    let dir = TempDir::new().unwrap();

    autosolo()
        .arg("--data-dir")
        .arg(dir.path())
        .arg("stats")
        .arg("--identity")
        .arg("tester")
        .assert()
        .success()
        .stdout(predicate::str::contains("identity: tester"))
        .stdout(predicate::str::contains("resolved: 0"));
}

#[test]
fn identity_falls_back_to_default() {
    let dir = TempDir::new().unwrap();

    autosolo()
        .arg("identity")
        .arg("--local-data-dir")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("default"));
}

#[test]
fn identity_detects_user_folder() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("1c48200c")).unwrap();

    autosolo()
        .arg("identity")
        .arg("--local-data-dir")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("1c48200c"));
}
