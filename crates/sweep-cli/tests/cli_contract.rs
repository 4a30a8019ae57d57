#![allow(deprecated)]
//! Exit-code and output contract of the `sweep` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use tempfile::tempdir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sweep() -> Command {
    let mut cmd = Command::cargo_bin("sweep").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("SWEEP_API_KEY")
        .env_remove("SWEEP_TENANT_ID")
        .env_remove("SWEEP_API_URL");
    cmd
}

fn write_config(dir: &std::path::Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("eval.yaml");
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn version_prints_crate_version() {
    sweep()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn missing_config_exits_1() {
    let dir = tempdir().unwrap();
    sweep()
        .current_dir(dir.path())
        .args(["run", "--config", "nope.yaml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to read config"));
}

#[test]
fn unsupported_predictor_exits_3_without_contacting_api() {
    let dir = tempdir().unwrap();
    let cfg = write_config(
        dir.path(),
        "version: 1\ndataset: qa\npredictor:\n  kind: agent-executor\n",
    );
    sweep()
        .env("SWEEP_API_URL", "http://127.0.0.1:9")
        .arg("run")
        .arg("--config")
        .arg(&cfg)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("unsupported predictor kind: agent-executor"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn run_writes_results_keyed_by_example() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/datasets"))
        .and(query_param("name", "qa"))
        .and(query_param("tenant_id", "tenant-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"id": "ds-1", "name": "qa"}])),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/examples"))
        .and(query_param("dataset", "ds-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "a", "inputs": {"x": 1}},
            {"id": "b", "inputs": {"x": 2}}
        ])))
        .mount(&mock_server)
        .await;

    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), "version: 1\npredictor:\n  kind: echo\n");
    let out = dir.path().join("results.json");

    sweep()
        .env("SWEEP_API_URL", mock_server.uri())
        .env("SWEEP_TENANT_ID", "tenant-1")
        .arg("run")
        .arg("--config")
        .arg(&cfg)
        .args(["--dataset", "qa", "--repetitions", "2", "--workers", "2"])
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::contains("Session 'qa-echo-2'"));

    let v: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(v["processed"], 2);
    assert_eq!(v["results"]["a"], json!([{"x": 1}, {"x": 1}]));
    assert_eq!(v["results"]["b"], json!([{"x": 2}, {"x": 2}]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn datasets_unauthorized_exits_2() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/datasets"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"detail": "forbidden"})))
        .mount(&mock_server)
        .await;

    sweep()
        .env("SWEEP_API_URL", mock_server.uri())
        .env("SWEEP_TENANT_ID", "tenant-1")
        .env("SWEEP_API_KEY", "bad-key")
        .arg("datasets")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("forbidden"));
}
