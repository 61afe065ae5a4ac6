//! End-to-end tests for afetch fetch
//!
//! These run the binary against a mock file server:
//! - Argument validation before any request
//! - Version probing and file naming
//! - Reuse of stored files
//! - Output to stdout

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

const CIF: &str = "data_AF-P69905-F1\n#\nloop_\n_atom_site.group_PDB\n_atom_site.id\n_atom_site.B_iso_or_equiv\nATOM 1 91.5\nATOM 2 88.5\n#\n";

/// Helper to build a command isolated from the user's config
fn afetch(server: &MockServer, dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("afetch").unwrap();
    cmd.current_dir(dir.path())
        .env("AFETCH_CONFIG", dir.path().join("config.toml"))
        .env("AFETCH_BASE_URL", server.uri())
        .env("AFETCH_MAX_VERSION", "4")
        .env("AFETCH_FETCH_PATH", dir.path())
        .env_remove("LOG_LEVEL");
    cmd
}

#[tokio::test]
async fn test_fetch_writes_newest_available_version() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/AF-P69905-F1-model_v3.cif"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CIF))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    afetch(&mock_server, &dir)
        .arg("fetch")
        .arg("P69905")
        .assert()
        .success()
        .stderr(predicate::str::contains("P69905"))
        .stderr(predicate::str::contains("v3"));

    let written = fs::read_to_string(dir.path().join("P69905-AF-v3.cif")).unwrap();
    assert_eq!(written, CIF);
}

#[tokio::test]
async fn test_fetch_reuses_stored_file() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CIF))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("P69905-AF-v2.cif"), CIF).unwrap();

    afetch(&mock_server, &dir)
        .arg("fetch")
        .arg("P69905")
        .assert()
        .success();
}

#[tokio::test]
async fn test_fetch_missing_prediction_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(4)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    afetch(&mock_server, &dir)
        .arg("fetch")
        .arg("A0A000")
        .arg("--quiet")
        .arg("0")
        .assert()
        .failure()
        .stderr(predicate::str::contains("A0A000"));

    assert!(!dir.path().join("A0A000-AF-v1.cif").exists());
}

#[tokio::test]
async fn test_fetch_invalid_type_makes_no_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CIF))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    afetch(&mock_server, &dir)
        .arg("fetch")
        .arg("P69905")
        .arg("--type")
        .arg("xyz")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid format 'xyz'"));
}

#[tokio::test]
async fn test_fetch_unknown_flag_is_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CIF))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    afetch(&mock_server, &dir)
        .arg("fetch")
        .arg("P69905")
        .arg("--colour")
        .arg("red")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--colour"));
}

#[tokio::test]
async fn test_fetch_to_stdout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/AF-P69905-F1-model_v4.cif"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CIF))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    afetch(&mock_server, &dir)
        .arg("fetch")
        .arg("P69905")
        .arg("--file")
        .arg("-")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("data_AF-P69905-F1"));

    assert!(!dir.path().join("P69905-AF-v4.cif").exists());
}

#[tokio::test]
async fn test_cached_lists_downloaded_models() {
    let mock_server = MockServer::start().await;

    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Q5VSL9-AF-v4.pdb"), "ATOM\n").unwrap();

    afetch(&mock_server, &dir)
        .arg("cached")
        .assert()
        .success()
        .stdout(predicate::str::contains("Q5VSL9"))
        .stdout(predicate::str::contains("v4"));
}

#[tokio::test]
async fn test_config_set_and_get() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let mut set = afetch(&mock_server, &dir);
    set.env_remove("AFETCH_MAX_VERSION")
        .args(["config", "set", "max_version", "6"])
        .assert()
        .success();

    let mut get = afetch(&mock_server, &dir);
    get.env_remove("AFETCH_MAX_VERSION")
        .args(["config", "get", "max_version"])
        .assert()
        .success()
        .stdout(predicate::str::diff("6\n"));

    afetch(&mock_server, &dir)
        .args(["config", "get", "colour"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown config key"));
}
