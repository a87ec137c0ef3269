//! Integration tests for the `elka` CLI binary.
//!
//! Argument parsing, help output, completions, and end-to-end commands
//! against a wiremock server. Every test gets its own config and data
//! directories so the user's real session is never touched.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `elka` binary with env isolation.
fn elka_cmd(home: &TempDir) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("elka");
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_DATA_HOME", home.path().join("data"))
        .env("NO_COLOR", "1")
        .env_remove("ELKA_PROFILE")
        .env_remove("ELKA_BASE_URL")
        .env_remove("ELKA_OUTPUT")
        .env_remove("ELKA_INSECURE")
        .env_remove("ELKA_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

/// Same, pointed at a mock server.
fn elka_at(home: &TempDir, server: &MockServer) -> assert_cmd::Command {
    let mut cmd = elka_cmd(home);
    cmd.args(["--base-url", &server.uri()]);
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn profile_json() -> serde_json::Value {
    json!({"id": 7, "email": "ann@example.com", "name": "Ann", "is_superuser": false})
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .and(body_json(json!({"email": "ann@example.com", "password": "s3cret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "a-1", "refresh_token": "r-1", "token_type": "bearer"
        })))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/auth/profile"))
        .and(header("authorization", "Bearer a-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json()))
        .expect(1)
        .mount(server)
        .await;
}

fn login(home: &TempDir, server: &MockServer) {
    elka_at(home, server)
        .env("ELKA_TEST_PASSWORD", "s3cret")
        .args([
            "auth",
            "login",
            "--email",
            "ann@example.com",
            "--password-env",
            "ELKA_TEST_PASSWORD",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("Signed in as Ann"));
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = TempDir::new().unwrap();
    let output = elka_cmd(&home).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn test_help_flag() {
    let home = TempDir::new().unwrap();
    elka_cmd(&home).arg("--help").assert().success().stdout(
        predicate::str::contains("Elka")
            .and(predicate::str::contains("devices"))
            .and(predicate::str::contains("auth"))
            .and(predicate::str::contains("open")),
    );
}

#[test]
fn test_version_flag() {
    let home = TempDir::new().unwrap();
    elka_cmd(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("elka"));
}

#[test]
fn test_completions_zsh() {
    let home = TempDir::new().unwrap();
    elka_cmd(&home)
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_invalid_subcommand() {
    let home = TempDir::new().unwrap();
    let output = elka_cmd(&home).arg("foobar").output().unwrap();
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("foobar"));
}

#[test]
fn test_unsupported_rows_per_page_is_usage_error() {
    let home = TempDir::new().unwrap();
    elka_cmd(&home)
        .args(["--base-url", "http://127.0.0.1:9", "devices", "list", "--rows", "25"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("rows"));
}

// ── Auth ────────────────────────────────────────────────────────────

#[test]
fn test_profile_without_session_exits_with_auth_code() {
    let home = TempDir::new().unwrap();
    elka_cmd(&home)
        .args(["--base-url", "http://127.0.0.1:9", "auth", "profile"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Authentication required"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_persists_session_between_runs() {
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;
    mount_login(&server).await;

    login(&home, &server);

    // Served from the cached profile: the profile mock expects one call.
    elka_at(&home, &server)
        .args(["-o", "json", "auth", "profile"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ann@example.com"));

    elka_at(&home, &server)
        .args(["open", "/profile"])
        .assert()
        .success()
        .stdout(predicate::str::contains("My Profile").and(predicate::str::contains("User")));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_server_message_is_shown() {
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Incorrect email or password"})),
        )
        .mount(&server)
        .await;

    elka_at(&home, &server)
        .env("ELKA_TEST_PASSWORD", "bad")
        .args(["auth", "login", "-e", "ann@example.com", "--password-env", "ELKA_TEST_PASSWORD"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Incorrect email or password"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_logout_clears_session() {
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;
    mount_login(&server).await;
    login(&home, &server);

    elka_at(&home, &server)
        .args(["auth", "logout"])
        .assert()
        .success();
    elka_at(&home, &server)
        .args(["auth", "profile"])
        .assert()
        .code(3);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_oauth_error_makes_no_exchange_call() {
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1.0/auth/yandex/callback"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    elka_at(&home, &server)
        .args(["auth", "oauth-callback", "/auth/yandex/callback?error=access_denied"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Yandex OAuth error: access_denied"));
}

#[test]
fn test_oauth_url_uses_yandex() {
    let home = TempDir::new().unwrap();
    elka_cmd(&home)
        .args(["auth", "oauth-url"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("https://oauth.yandex.ru/authorize")
                .and(predicate::str::contains("response_type=code")),
        );
}

// ── Devices ─────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_devices_list_renders_table() {
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/devices/"))
        .and(query_param("skip", "20"))
        .and(query_param("limit", "20"))
        .and(query_param("sort_field", "serial_number"))
        .and(query_param("sort_direction", "asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "devices": [
                {"id": 1, "name": "Bedroom", "serial_number": "SN-1",
                 "owner": {"id": 7, "email": "ann@example.com", "name": "Ann"}}
            ],
            "total": 21
        })))
        .expect(1)
        .mount(&server)
        .await;

    elka_at(&home, &server)
        .args(["devices", "list", "--page", "2", "--sort", "serial-number", "--asc"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("SN-1")
                .and(predicate::str::contains("ann@example.com"))
                .and(predicate::str::contains("21")),
        )
        .stderr(predicate::str::contains("21-21 / 21"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_devices_list_empty() {
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/devices/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"devices": [], "total": 0})),
        )
        .mount(&server)
        .await;

    elka_at(&home, &server)
        .args(["devices", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No devices found."));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_device_get_404_exits_not_found() {
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/devices/SN-9"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Device not found"})))
        .mount(&server)
        .await;

    elka_at(&home, &server)
        .args(["devices", "get", "SN-9"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("device 'SN-9' not found"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_create_requires_session() {
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/devices/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    elka_at(&home, &server)
        .args(["devices", "create", "--name", "Kitchen", "--serial", "SN-2", "--room", "main"])
        .assert()
        .code(3);
}

// ── Routes ──────────────────────────────────────────────────────────

#[test]
fn test_open_unknown_path_is_not_found() {
    let home = TempDir::new().unwrap();
    elka_cmd(&home)
        .args(["--base-url", "http://127.0.0.1:9", "open", "/nowhere"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("page '/nowhere' not found"));
}

#[test]
fn test_open_protected_page_without_session() {
    let home = TempDir::new().unwrap();
    elka_cmd(&home)
        .args(["--base-url", "http://127.0.0.1:9", "open", "/logs"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("/login"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_set_then_show() {
    let home = TempDir::new().unwrap();
    elka_cmd(&home)
        .args(["config", "set", "base_url", "http://localhost:8000/"])
        .assert()
        .success();
    elka_cmd(&home)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("base_url = \"http://localhost:8000\""));
}

#[test]
fn test_config_use_unknown_profile() {
    let home = TempDir::new().unwrap();
    elka_cmd(&home)
        .args(["config", "use", "staging"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("staging"));
}
