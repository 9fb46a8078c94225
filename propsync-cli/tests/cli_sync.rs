use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use assert_cmd::prelude::*;
use predicates::str::contains;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DIRECTORY_PATH: &str = "/api/v2/reports/property_directory.json";
const PROPERTIES_PATH: &str = "/rest/v1/properties";

/// Binary with a clean environment rooted at `home`.
fn propsync_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("propsync"));
    cmd.env_clear()
        .env("HOME", home)
        .env("USERPROFILE", home)
        .env("NO_COLOR", "1");
    cmd
}

fn with_credentials(cmd: &mut Command, server_uri: &str) {
    cmd.env("APPFOLIO_CLIENT_ID", "client")
        .env("APPFOLIO_CLIENT_SECRET", "super-secret-value")
        .env("APPFOLIO_BASE_URL", server_uri)
        .env("SUPABASE_URL", server_uri)
        .env("SUPABASE_SERVICE_KEY", "service-role-key");
}

async fn run_blocking(home: PathBuf, server_uri: String, args: &'static [&'static str]) -> Output {
    tokio::task::spawn_blocking(move || {
        let mut cmd = propsync_cmd(&home);
        with_credentials(&mut cmd, &server_uri);
        cmd.args(args).output().expect("run propsync")
    })
    .await
    .expect("blocking task")
}

async fn mount_datasets(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(DIRECTORY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                { "property_id": 1, "property_address": "1 Elm" },
                { "property_id": 2, "property_address": "2 Elm" },
                { "property_id": 3, "property_address": "" }
            ]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(PROPERTIES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "address": "1 Elm", "appfolio_id": "1", "active": true },
            { "id": 9, "address": "9 Gone", "appfolio_id": "9", "active": true }
        ])))
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[test]
fn missing_credentials_exit_1_and_list_every_name() {
    let home = TempDir::new().expect("home");
    propsync_cmd(home.path())
        .arg("check")
        .assert()
        .code(1)
        .stderr(contains("APPFOLIO_CLIENT_ID"))
        .stderr(contains("APPFOLIO_CLIENT_SECRET"))
        .stderr(contains("SUPABASE_URL"))
        .stderr(contains("SUPABASE_SERVICE_KEY"));
}

#[test]
fn check_masks_secrets() {
    let home = TempDir::new().expect("home");
    let mut cmd = propsync_cmd(home.path());
    with_credentials(&mut cmd, "https://example.test/");
    let assert = cmd
        .arg("check")
        .assert()
        .success()
        .stdout(contains("https://example.test"))
        .stdout(contains("supe********"));
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    assert!(!stdout.contains("super-secret-value"), "secret leaked: {stdout}");
    assert!(!stdout.contains("service-role-key"), "secret leaked: {stdout}");
}

#[test]
fn non_numeric_timeout_is_a_config_error() {
    let home = TempDir::new().expect("home");
    let mut cmd = propsync_cmd(home.path());
    with_credentials(&mut cmd, "https://example.test");
    cmd.env("PROPSYNC_SOURCE_TIMEOUT_SECS", "abc")
        .arg("check")
        .assert()
        .code(1)
        .stderr(contains("invalid configuration"))
        .stderr(contains("PROPSYNC_SOURCE_TIMEOUT_SECS"));
}

#[test]
fn timeout_flag_reaches_resolved_config() {
    let home = TempDir::new().expect("home");
    let mut cmd = propsync_cmd(home.path());
    with_credentials(&mut cmd, "https://example.test");
    cmd.args(["check", "--source-timeout-secs", "12"])
        .assert()
        .success()
        .stdout(contains("12s"));
}

#[test]
fn default_config_file_in_home_is_read() {
    let home = TempDir::new().expect("home");
    let dir = home.path().join(".propsync");
    fs::create_dir_all(&dir).expect("mkdir");
    fs::write(
        dir.join("config.yaml"),
        "appfolio_client_id: from-file\n\
         appfolio_client_secret: file-secret-123\n\
         supabase_url: https://db.example.test\n\
         supabase_service_key: file-key-123456\n",
    )
    .expect("write config");

    propsync_cmd(home.path())
        .env("APPFOLIO_CLIENT_ID", "from-env")
        .arg("check")
        .assert()
        .success()
        .stdout(contains("from-env"))
        .stdout(contains("https://db.example.test"));
}

#[test]
fn explicit_missing_config_file_fails() {
    let home = TempDir::new().expect("home");
    propsync_cmd(home.path())
        .args(["--config", "does-not-exist.yaml", "check"])
        .assert()
        .code(1)
        .stderr(contains("config file not found"));
}

// ---------------------------------------------------------------------------
// Runs against a mock server
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread")]
async fn sync_applies_changes_and_exits_0() {
    let server = MockServer::start().await;
    mount_datasets(&server).await;
    Mock::given(method("POST"))
        .and(path(PROPERTIES_PATH))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(PROPERTIES_PATH))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().expect("home");
    let output = run_blocking(home.path().to_path_buf(), server.uri(), &["sync", "--json"]).await;
    assert!(
        output.status.success(),
        "status={} stderr={}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );

    let report: Value = serde_json::from_slice(&output.stdout).expect("json outcome");
    assert_eq!(report["writes"]["added"], 1);
    assert_eq!(report["writes"]["deactivated"], 1);
    assert_eq!(report["plan"]["summary"]["unchanged"], 1);
    assert_eq!(report["plan"]["summary"]["skipped"], 1);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("skipping property"), "missing warning: {stderr}");
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_write_exits_1_after_running_the_rest() {
    let server = MockServer::start().await;
    mount_datasets(&server).await;
    Mock::given(method("POST"))
        .and(path(PROPERTIES_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("insert exploded"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(PROPERTIES_PATH))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().expect("home");
    let output = run_blocking(home.path().to_path_buf(), server.uri(), &["sync"]).await;
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("insert exploded"), "stdout: {stdout}");
    assert!(stdout.contains("deactivated"), "stdout: {stdout}");
}

#[tokio::test(flavor = "multi_thread")]
async fn source_failure_exits_1_without_writes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(DIRECTORY_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(PROPERTIES_PATH))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let home = TempDir::new().expect("home");
    let output = run_blocking(home.path().to_path_buf(), server.uri(), &["sync"]).await;
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to fetch source roster"), "stderr: {stderr}");
}

#[tokio::test(flavor = "multi_thread")]
async fn diff_and_dry_run_never_write() {
    let server = MockServer::start().await;
    mount_datasets(&server).await;
    Mock::given(method("POST"))
        .and(path(PROPERTIES_PATH))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let home = TempDir::new().expect("home");
    let diff = run_blocking(home.path().to_path_buf(), server.uri(), &["diff"]).await;
    assert!(diff.status.success());
    let stdout = String::from_utf8_lossy(&diff.stdout);
    assert!(stdout.contains("+ 2  2 Elm"), "stdout: {stdout}");
    assert!(stdout.contains("- 9  deactivate"), "stdout: {stdout}");

    let dry = run_blocking(home.path().to_path_buf(), server.uri(), &["sync", "--dry-run"]).await;
    assert!(dry.status.success());
    let stdout = String::from_utf8_lossy(&dry.stdout);
    assert!(stdout.contains("[dry-run]"), "stdout: {stdout}");
    assert!(stdout.contains("would add"), "stdout: {stdout}");
}
