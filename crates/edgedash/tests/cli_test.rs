//! Integration tests for the `edgedash` CLI binary.
//!
//! Argument parsing, configuration errors, and offline rendering run without
//! a server; sync and check run against a wiremock Grafana.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEMPLATE: &str =
    r#"{"uid":"edge-${UID_SUFFIX}","title":"Edge ${EDGE_NAME}","ds":"${DATASOURCE_UID}"}"#;

// ── Helpers ─────────────────────────────────────────────────────────

const ISOLATED_ENV: [&str; 20] = [
    "GRAFANA_URL",
    "GRAFANA_TOKEN",
    "EDGES",
    "FOLDER_TITLE",
    "FOLDER_UID",
    "TEMPLATE_PATH",
    "DATASOURCE_PREFIX",
    "MIMIR_URL",
    "CA_CERT_PATH",
    "CLIENT_CERT_PATH",
    "CLIENT_KEY_PATH",
    "EDGEDASH_CONFIG",
    "EDGEDASH_OUTPUT",
    "EDGEDASH_TIMEOUT",
    "EDGEDASH_INSECURE",
    "EDGEDASH_EDGES",
    "EDGEDASH_GRAFANA_URL",
    "EDGEDASH_GRAFANA_TOKEN",
    "EDGEDASH_ON_ERROR",
    "RUST_LOG",
];

/// Build a [`Command`] for the `edgedash` binary with env isolation.
///
/// Clears every variable the config loader reads and points config
/// directories at a nonexistent path so tests never touch real settings.
fn edgedash_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("edgedash");
    cmd.env("HOME", "/tmp/edgedash-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/edgedash-cli-test-nonexistent");
    for key in ISOLATED_ENV {
        cmd.env_remove(key);
    }
    cmd
}

/// A command wired to `server` with one template and the given edges.
fn sync_cmd(server: &MockServer, template: &Path, edges: &str) -> assert_cmd::Command {
    let mut cmd = edgedash_cmd();
    cmd.env("GRAFANA_URL", server.uri())
        .env("GRAFANA_TOKEN", "glsa_test")
        .env("DATASOURCE_PREFIX", "mimir-")
        .env("TEMPLATE_PATH", template)
        .env("EDGES", edges);
    cmd
}

fn write_template(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("edge-template.json");
    std::fs::write(&path, body).unwrap();
    path
}

/// Run a command off the async runtime so the mock server keeps serving.
async fn run(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

async fn mount_existing_folder(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/folders/edges-folder"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1, "uid": "edges-folder", "title": "Edges"
        })))
        .mount(server)
        .await;
}

async fn mount_existing_datasource(server: &MockServer, edge: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/api/datasources/name/mimir-{edge}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3, "uid": format!("ds-{edge}"), "name": format!("mimir-{edge}")
        })))
        .mount(server)
        .await;
}

async fn mount_dashboard_upsert(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/dashboards/db"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 9, "uid": "edge-x", "url": "/d/edge-x", "status": "success", "version": 2
        })))
        .mount(server)
        .await;
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn no_args_shows_help() {
    let output = edgedash_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage"), "{stderr}");
}

#[test]
fn help_lists_commands() {
    edgedash_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("sync")
            .and(predicate::str::contains("render"))
            .and(predicate::str::contains("check"))
            .and(predicate::str::contains("config")),
    );
}

#[test]
fn version_flag() {
    edgedash_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("edgedash"));
}

#[test]
fn completions_bash() {
    edgedash_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("edgedash"));
}

#[test]
fn invalid_subcommand_is_usage_error() {
    edgedash_cmd().arg("frobnicate").assert().code(2);
}

#[test]
fn invalid_on_error_value_is_rejected() {
    edgedash_cmd()
        .args(["sync", "--on-error", "sometimes"])
        .assert()
        .code(2);
}

// ── Configuration ───────────────────────────────────────────────────

#[test]
fn sync_without_url_is_config_error() {
    edgedash_cmd()
        .arg("sync")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("GRAFANA_URL"));
}

#[test]
fn sync_without_token_is_config_error() {
    edgedash_cmd()
        .args(["--url", "https://grafana.example.com", "sync"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("GRAFANA_TOKEN"));
}

#[test]
fn explicit_missing_config_file_is_error() {
    edgedash_cmd()
        .args(["--config", "/tmp/edgedash-cli-test-nonexistent/nope.toml", "config", "show"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn config_show_redacts_token() {
    edgedash_cmd()
        .env("GRAFANA_TOKEN", "glsa_very_secret")
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("grafana_token = \"****\"")
                .and(predicate::str::contains("glsa_very_secret").not()),
        );
}

#[test]
fn config_show_layers_file_env_and_flags() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("edgedash.toml");
    std::fs::write(
        &file,
        "folder_title = \"From file\"\nfolder_uid = \"file-folder\"\ntimeout = 5\n",
    )
    .unwrap();

    let output = edgedash_cmd()
        .env("FOLDER_UID", "env-folder")
        .env("EDGEDASH_TENANT_HEADER", "X-Tenant")
        .env("EDGES", "edge-a, edge-b")
        .arg("--config")
        .arg(&file)
        .args(["--timeout", "9", "--output", "json", "config", "show"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");

    let shown: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(shown["folder_title"], "From file");
    assert_eq!(shown["folder_uid"], "env-folder");
    assert_eq!(shown["tenant_header"], "X-Tenant");
    assert_eq!(shown["timeout"], 9);
    assert_eq!(shown["edges"], json!(["edge-a", "edge-b"]));
    assert!(shown.get("grafana_token").is_none());
}

// ── Render ──────────────────────────────────────────────────────────

#[test]
fn render_substitutes_tokens_offline() {
    let dir = tempfile::tempdir().unwrap();
    let template = write_template(&dir, TEMPLATE);

    let output = edgedash_cmd()
        .args(["render", "--edge", "Edge A", "--datasource-uid", "ds-1", "--template"])
        .arg(&template)
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");

    let doc: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        doc,
        json!({ "uid": "edge-edge-a", "title": "Edge Edge A", "ds": "ds-1" })
    );
}

#[test]
fn render_help_mentions_uid_requirement() {
    edgedash_cmd()
        .args(["render", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("top-level \"uid\""));
}

#[test]
fn render_without_uid_is_template_error() {
    let dir = tempfile::tempdir().unwrap();
    let template = write_template(&dir, r#"{"title":"${EDGE_NAME}"}"#);

    edgedash_cmd()
        .args(["render", "--edge", "a", "--datasource-uid", "ds", "--template"])
        .arg(&template)
        .assert()
        .code(9);
}

#[test]
fn render_missing_template_is_template_error() {
    edgedash_cmd()
        .args([
            "render",
            "--edge",
            "a",
            "--datasource-uid",
            "ds",
            "--template",
            "/tmp/edgedash-cli-test-nonexistent/t.json",
        ])
        .assert()
        .code(9);
}

// ── Against a mock Grafana ──────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn sync_reports_created_datasource() {
    let server = MockServer::start().await;
    mount_existing_folder(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/datasources/name/mimir-edge-a"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "not found" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/datasources"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 3, "message": "Datasource added",
            "datasource": { "id": 3, "uid": "ds-edge-a", "name": "mimir-edge-a" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_dashboard_upsert(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let template = write_template(&dir, TEMPLATE);
    let mut cmd = sync_cmd(&server, &template, "edge-a");
    cmd.args(["--output", "json", "sync"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{output:?}");

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["folder"]["action"], "existing");
    assert_eq!(report["edges"][0]["datasource"]["uid"], "ds-edge-a");
    assert_eq!(report["edges"][0]["datasource"]["action"], "created");
    assert_eq!(report["edges"][0]["dashboard"]["action"], "updated");
}

#[tokio::test(flavor = "multi_thread")]
async fn sync_maps_unauthorized_to_auth_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/folders/edges-folder"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "invalid API key" })),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let template = write_template(&dir, TEMPLATE);
    let mut cmd = sync_cmd(&server, &template, "edge-a");
    cmd.arg("sync");
    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(3), "{output:?}");
}

#[tokio::test(flavor = "multi_thread")]
async fn sync_continue_reports_partial_failure() {
    let server = MockServer::start().await;
    mount_existing_folder(&server).await;
    mount_existing_datasource(&server, "edge-a").await;
    Mock::given(method("GET"))
        .and(path("/api/datasources/name/mimir-edge-b"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database is locked"))
        .mount(&server)
        .await;
    mount_dashboard_upsert(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let template = write_template(&dir, TEMPLATE);
    let mut cmd = sync_cmd(&server, &template, "edge-b,edge-a");
    cmd.args(["--output", "json", "sync", "--on-error", "continue"]);
    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(10), "{output:?}");

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(report["edges"][0]["error"].is_string());
    assert_eq!(report["edges"][1]["datasource"]["uid"], "ds-edge-a");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("edge-b"), "{stderr}");
}

#[tokio::test(flavor = "multi_thread")]
async fn sync_fail_fast_stops_at_first_failure() {
    let server = MockServer::start().await;
    mount_existing_folder(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/datasources/name/mimir-edge-b"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database is locked"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/datasources/name/mimir-edge-a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "uid": "ds-edge-a" })))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let template = write_template(&dir, TEMPLATE);
    let mut cmd = sync_cmd(&server, &template, "edge-b,edge-a");
    cmd.arg("sync");
    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(1), "{output:?}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("mimir-edge-b"), "{stderr}");
}

#[tokio::test(flavor = "multi_thread")]
async fn check_prints_grafana_version() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "database": "ok", "version": "11.2.0", "commit": "abc"
        })))
        .mount(&server)
        .await;

    let mut cmd = edgedash_cmd();
    cmd.env("GRAFANA_URL", server.uri())
        .env("GRAFANA_TOKEN", "glsa_test")
        .arg("check");
    let output = run(cmd).await;
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Grafana 11.2.0"), "{stdout}");
    assert!(stdout.contains("Database: ok"), "{stdout}");
}

#[tokio::test(flavor = "multi_thread")]
async fn prefixed_token_env_beats_plain_token_env() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .and(header("authorization", "Bearer glsa_prefixed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "database": "ok", "version": "11.2.0"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .and(header("authorization", "Bearer glsa_plain"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "invalid API key"
        })))
        .mount(&server)
        .await;

    let mut cmd = edgedash_cmd();
    cmd.env("GRAFANA_URL", server.uri())
        .env("GRAFANA_TOKEN", "glsa_plain")
        .env("EDGEDASH_GRAFANA_TOKEN", "glsa_prefixed")
        .arg("check");
    let output = run(cmd).await;
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Grafana 11.2.0"), "{stdout}");
}

#[tokio::test(flavor = "multi_thread")]
async fn token_flag_beats_token_env() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .and(header("authorization", "Bearer glsa_flag"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "database": "ok", "version": "11.2.0"
        })))
        .mount(&server)
        .await;

    let mut cmd = edgedash_cmd();
    cmd.env("GRAFANA_URL", server.uri())
        .env("GRAFANA_TOKEN", "glsa_plain")
        .env("EDGEDASH_GRAFANA_TOKEN", "glsa_prefixed")
        .args(["--token", "glsa_flag", "check"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{output:?}");
}
