//! CLI end-to-end tests
//!
//! Tests for the trailerio command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the trailerio binary
#[allow(deprecated)]
fn trailerio_cmd() -> Command {
    Command::cargo_bin("trailerio").unwrap()
}

/// Config whose every upstream refuses connections.
const OFFLINE_CONFIG: &str = r#"
[fetch]
timeout_ms = 500

[sources.endpoints]
wikidata = "http://127.0.0.1:1/sparql"
apple_tv = "http://127.0.0.1:1"
plex_auth = "http://127.0.0.1:1"
plex_metadata = "http://127.0.0.1:1"
rotten_tomatoes = "http://127.0.0.1:1"
theplatform = "http://127.0.0.1:1"
digital_digest = "http://127.0.0.1:1"
imdb = "http://127.0.0.1:1"
"#;

#[test]
fn test_cli_no_args_shows_help() {
    trailerio_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_command() {
    trailerio_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "trailerio {}",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn test_cli_validate_valid_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        "[server]\nport = 7200\n\n[sources]\nenabled = [\"plex\", \"imdb\"]\n",
    )
    .unwrap();

    trailerio_cmd()
        .arg("validate")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("0.0.0.0:7200"))
        .stdout(predicate::str::contains("plex, imdb"));
}

#[test]
fn test_cli_validate_invalid_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[fetch]\ntimeout_ms = 0\n").unwrap();

    trailerio_cmd()
        .arg("validate")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("timeout"));
}

#[test]
fn test_cli_resolve_offline_prints_empty_result() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, OFFLINE_CONFIG).unwrap();

    let output = trailerio_cmd()
        .args(["-c", path.to_str().unwrap(), "resolve", "tt0111161", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["title"], "tt0111161");
    assert_eq!(result["links"], serde_json::json!([]));
}

#[test]
fn test_cli_resolve_plain_output() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, OFFLINE_CONFIG).unwrap();

    trailerio_cmd()
        .args(["--config", path.to_str().unwrap(), "resolve", "tt0111161"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Title: tt0111161"))
        .stdout(predicate::str::contains("No trailers found."));
}
