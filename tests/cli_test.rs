//! Binary-level tests for the mdchat command line

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use wiremock::MockServer;

mod common;

fn mdchat() -> Command {
    let mut cmd = Command::cargo_bin("mdchat").unwrap();
    cmd.env_remove("MDCHAT_BACKEND_URL")
        .env_remove("MDCHAT_TIMEOUT_SECONDS")
        .env_remove("MDCHAT_EXPORT_FORMAT")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    mdchat()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("export"))
        .stdout(predicate::str::contains("login"));
}

#[test]
fn test_version() {
    mdchat()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mdchat"));
}

#[test]
fn test_login_and_logout_toggle_flag_file() {
    let dir = tempfile::tempdir().unwrap();
    let auth_file = dir.path().join("auth.json");

    mdchat()
        .env("MDCHAT_AUTH_FILE", &auth_file)
        .args(["--config", "missing.yaml", "login"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in"));
    let contents = std::fs::read_to_string(&auth_file).unwrap();
    assert!(contents.contains("\"logged_in\": true"));

    mdchat()
        .env("MDCHAT_AUTH_FILE", &auth_file)
        .args(["--config", "missing.yaml", "logout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out"));
    let contents = std::fs::read_to_string(&auth_file).unwrap();
    assert!(contents.contains("\"logged_in\": false"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let (_dir, config_path) = common::temp_config_file("backend:\n  timeout_seconds: 0\n");

    mdchat()
        .arg("--config")
        .arg(config_path)
        .arg("logout")
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be greater than 0"));
}

#[test]
fn test_non_http_backend_url_is_rejected() {
    mdchat()
        .args(["--config", "missing.yaml", "--backend-url", "ftp://example.test", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("http or https"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_json_against_backend() {
    let server = MockServer::start().await;
    common::mount_json(
        &server,
        "GET",
        "/api/list_chats",
        json!({"chats": [{"id": "c1", "title": "Rash"}]}),
    )
    .await;

    let uri = server.uri();
    let output = tokio::task::spawn_blocking(move || {
        mdchat()
            .args(["--config", "missing.yaml", "--backend-url", &uri, "list", "--json"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success());
    let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listed, json!([{"id": "c1", "title": "Rash"}]));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_export_writes_text_transcript() {
    let server = MockServer::start().await;
    common::mount_json(
        &server,
        "GET",
        "/api/history/c1",
        json!({"history": [
            {"role": "user", "message": "Hello", "timestamp": "t1"},
            {"role": "assistant", "message": "Hi there", "timestamp": "t2"}
        ]}),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.txt");
    let uri = server.uri();
    let out_arg = out.clone();
    let output = tokio::task::spawn_blocking(move || {
        mdchat()
            .args(["--config", "missing.yaml", "--backend-url", &uri, "export", "c1"])
            .arg("--output")
            .arg(&out_arg)
            .args(["--format", "text"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success());
    let text = std::fs::read_to_string(out).unwrap();
    assert_eq!(text, "MD Agents Chat Export\nUser: Hello\nAI: Hi there\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_history_against_failing_backend_fails() {
    let server = MockServer::start().await;
    common::mount_status(&server, "GET", "/api/history/c1", 500).await;

    let uri = server.uri();
    let output = tokio::task::spawn_blocking(move || {
        mdchat()
            .args(["--config", "missing.yaml", "--backend-url", &uri, "history", "c1"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Network error"));
    assert!(stderr.contains("Could not talk to the MD Agents backend"));
}
