use assert_cmd::assert::OutputAssertExt;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Lays out a content tree plus a config file pointing at it.
fn workspace(storage_url: &str) -> TempDir {
    let dir = TempDir::new().expect("Creating temp dir failed");
    let content = dir.path().join("supabase_content");
    fs::create_dir_all(content.join("manifests")).unwrap();
    fs::create_dir_all(content.join("lessons")).unwrap();
    fs::write(
        content.join("manifests/global_manifest.json"),
        r#"{"version": 1, "lessons": ["01"]}"#,
    )
    .unwrap();
    fs::write(content.join("lessons/01.json"), r#"{"id": 1, "title": "مرحبا"}"#).unwrap();

    let config = format!(
        "content_root: {}\nstorage:\n  url: {}\n  bucket: content\n",
        content.display(),
        storage_url
    );
    fs::write(dir.path().join("config.yaml"), config).unwrap();
    dir
}

fn content_sync(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("content-sync").expect("Binary exists");
    cmd.current_dir(dir).env_remove("RUST_LOG");
    cmd
}

#[tokio::test(flavor = "multi_thread")]
async fn sync_happy_flow_exits_zero_and_prints_public_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(2)
        .mount(&server)
        .await;

    let dir = workspace(&server.uri());
    let mut cmd = content_sync(dir.path());
    cmd.arg("sync")
        .arg("--config")
        .arg(dir.path().join("config.yaml"))
        .env("SUPABASE_SERVICE_ROLE_KEY", "test-key");

    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();

    let expected_url = format!("Public URL base: {}/storage/v1/object/public/content/", server.uri());
    output
        .assert()
        .success()
        .stdout(predicate::str::contains("Success: 2"))
        .stdout(predicate::str::contains("Failed: 0"))
        .stdout(predicate::str::contains("Total: 2"))
        .stdout(predicate::str::contains(expected_url));
}

#[tokio::test(flavor = "multi_thread")]
async fn sync_with_invalid_file_exits_non_zero_and_lists_it() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = workspace(&server.uri());
    fs::write(
        dir.path().join("supabase_content/lessons/01.json"),
        r#"{"id": 1, "blocks": ["#,
    )
    .unwrap();

    let mut cmd = content_sync(dir.path());
    cmd.arg("sync")
        .arg("--config")
        .arg(dir.path().join("config.yaml"))
        .env("SUPABASE_SERVICE_ROLE_KEY", "test-key");

    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();

    output
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Success: 1"))
        .stdout(predicate::str::contains("Failed: 1"))
        .stdout(predicate::str::contains("Total: 2"))
        .stdout(predicate::str::contains("lessons/01.json [failed_validation]"));
}

#[tokio::test(flavor = "multi_thread")]
async fn sync_json_output_is_machine_readable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let dir = workspace(&server.uri());
    let mut cmd = content_sync(dir.path());
    cmd.arg("sync")
        .arg("--config")
        .arg(dir.path().join("config.yaml"))
        .arg("--json")
        .env("SUPABASE_SERVICE_ROLE_KEY", "test-key");

    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(report["total"], 2);
    assert_eq!(report["succeeded"], 2);
    assert_eq!(report["results"][0]["key"], "lessons/01.json");
    assert_eq!(report["results"][0]["outcome"], "succeeded");
    assert!(report["public_url_base"]
        .as_str()
        .unwrap()
        .ends_with("/storage/v1/object/public/content/"));
}

#[test]
fn sync_with_missing_content_root_fails_without_report() {
    let dir = workspace("http://127.0.0.1:9");
    fs::remove_dir_all(dir.path().join("supabase_content")).unwrap();

    content_sync(dir.path())
        .arg("sync")
        .arg("--config")
        .arg(dir.path().join("config.yaml"))
        .env("SUPABASE_SERVICE_ROLE_KEY", "test-key")
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Summary").not())
        .stderr(predicate::str::contains("content root not found"));
}

#[test]
fn sync_with_zero_concurrency_fails_without_report() {
    let dir = workspace("http://127.0.0.1:9");

    content_sync(dir.path())
        .arg("sync")
        .arg("--config")
        .arg(dir.path().join("config.yaml"))
        .arg("--concurrency")
        .arg("0")
        .env("SUPABASE_SERVICE_ROLE_KEY", "test-key")
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Summary").not())
        .stderr(predicate::str::contains("concurrency must be at least 1"));
}

#[test]
fn sync_without_service_key_is_a_configuration_error() {
    let dir = workspace("http://127.0.0.1:9");

    content_sync(dir.path())
        .arg("sync")
        .arg("--config")
        .arg(dir.path().join("config.yaml"))
        .env_remove("SUPABASE_SERVICE_ROLE_KEY")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("SUPABASE_SERVICE_ROLE_KEY"));
}

#[test]
fn sync_reports_transport_failures() {
    // Nothing listens on the discard port, so every upload fails to connect.
    let dir = workspace("http://127.0.0.1:9");

    content_sync(dir.path())
        .arg("sync")
        .arg("--config")
        .arg(dir.path().join("config.yaml"))
        .env("SUPABASE_SERVICE_ROLE_KEY", "test-key")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Failed: 2"))
        .stdout(predicate::str::contains("[failed_transport]"));
}

#[test]
fn check_needs_no_credentials() {
    let dir = workspace("http://127.0.0.1:9");

    content_sync(dir.path())
        .arg("check")
        .arg("--content-root")
        .arg(dir.path().join("supabase_content"))
        .env_remove("SUPABASE_SERVICE_ROLE_KEY")
        .assert()
        .success()
        .stdout(predicate::str::contains("--- Validation Summary ---"))
        .stdout(predicate::str::contains("Success: 2"))
        .stdout(predicate::str::contains("Public URL base").not());
}

#[test]
fn check_flags_invalid_json() {
    let dir = workspace("http://127.0.0.1:9");
    fs::write(dir.path().join("supabase_content/lessons/02.json"), "{\"id\": 2,}").unwrap();

    content_sync(dir.path())
        .arg("check")
        .arg("--config")
        .arg(dir.path().join("config.yaml"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Failed: 1"))
        .stdout(predicate::str::contains("lessons/02.json [failed_validation]"));
}
