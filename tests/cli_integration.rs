//! CLI Integration Tests
//!
//! End-to-end tests for CLI commands using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Get the streamdash binary for testing, isolated in `dir`
fn streamdash_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("streamdash").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("STREAMDASH_URL")
        .env_remove("STREAMDASH_LANG")
        .env_remove("STREAMDASH_LOG_LEVEL")
        .env_remove("STREAMDASH_LOG_FORMAT")
        .env_remove("STREAMDASH_ON_EXPIRY")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_version_output() {
    let dir = TempDir::new().unwrap();
    streamdash_cmd(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("streamdash"));
}

#[test]
fn test_help_shows_all_commands() {
    let dir = TempDir::new().unwrap();
    streamdash_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("watch"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("set"))
        .stdout(predicate::str::contains("check-now"))
        .stdout(predicate::str::contains("history"))
        .stdout(predicate::str::contains("lang"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn test_set_help() {
    let dir = TempDir::new().unwrap();
    streamdash_cmd(&dir)
        .args(["set", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--check-interval"))
        .stdout(predicate::str::contains("--live-mode"))
        .stdout(predicate::str::contains("--youtube-enabled"))
        .stdout(predicate::str::contains("--no-wait"));
}

#[test]
fn test_config_init_creates_file() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("streamdash.toml");

    streamdash_cmd(&dir)
        .args(["config", "init", "-o", config_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration file created"));

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[server]"));
    assert!(content.contains("[countdown]"));
}

#[test]
fn test_config_init_no_overwrite() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("streamdash.toml");
    std::fs::write(&config_path, "existing content").unwrap();

    streamdash_cmd(&dir)
        .args(["config", "init", "-o", config_path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("exists"));

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert_eq!(content, "existing content");
}

#[test]
fn test_invalid_command() {
    let dir = TempDir::new().unwrap();
    streamdash_cmd(&dir)
        .arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_completions_bash() {
    let dir = TempDir::new().unwrap();
    streamdash_cmd(&dir)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("complete"));
}

#[test]
fn test_invalid_url_is_rejected() {
    let dir = TempDir::new().unwrap();
    streamdash_cmd(&dir)
        .args(["check-now", "--url", "nas:8000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("base_url"));
}

#[test]
fn test_set_without_changes_fails() {
    let dir = TempDir::new().unwrap();
    streamdash_cmd(&dir)
        .args(["set", "--url", "http://127.0.0.1:1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to change"));
}

#[test]
fn test_lang_shows_default_then_stored() {
    let dir = TempDir::new().unwrap();
    streamdash_cmd(&dir)
        .arg("lang")
        .assert()
        .success()
        .stdout(predicate::str::contains("Current language: en"));

    std::fs::write(
        dir.path().join("streamdash-state.json"),
        r#"{"language":"de"}"#,
    )
    .unwrap();
    streamdash_cmd(&dir)
        .arg("lang")
        .assert()
        .success()
        .stdout(predicate::str::contains("Current language: de"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_check_now_against_backend() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/check-now"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    streamdash_cmd(&dir)
        .args(["check-now", "--url", &mock_server.uri()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Check triggered"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_history_json_against_backend() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "last_check_timestamp": "2024-05-01T12:00:00", "youtube_is_live": true, "obs_streaming": false }
        ])))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    streamdash_cmd(&dir)
        .args(["history", "--json", "--url", &mock_server.uri()])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"history\""))
        .stdout(predicate::str::contains("2024-05-01T12:00:00Z"));
}
