//! End-to-end runs over real HTTP against a mock server.

use kosync_engine::{
    HttpTransport, ReqwestClient, SyncConfig, SyncCredentials, SyncEngine, SyncError,
};
use kosync_protocol::BookId;
use mockito::{Matcher, Server};
use serde_json::json;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

fn engine(server: &Server, dir: &TempDir) -> SyncEngine<HttpTransport<ReqwestClient>> {
    let credentials = SyncCredentials::new(server.url(), "foo", dir.path());
    let config = SyncConfig::new(credentials).with_timeout(Duration::from_secs(5));
    SyncEngine::over_http(config).unwrap()
}

#[test]
fn test_sync_over_http() {
    let mut server = Server::new();
    let dir = TempDir::new().unwrap();
    let (a, b, c) = (BookId::new(), BookId::new(), BookId::new());
    for id in [a, b] {
        fs::write(dir.path().join(id.file_name()), b"local").unwrap();
    }

    let mut expected_body = vec![a.to_string(), b.to_string()];
    expected_body.sort();
    let sync = server
        .mock("POST", "/api/v1/sync/")
        .match_header("authorization", "Bearer foo")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!(expected_body)))
        .with_status(200)
        .with_body(json!([{ "id": c.to_string(), "url": format!("{}/files/c", server.url()) }]).to_string())
        .create();
    let download = server
        .mock("GET", "/files/c")
        .match_header("authorization", "Bearer foo")
        .with_status(200)
        .with_body("b")
        .create();

    let report = engine(&server, &dir).run().unwrap();

    assert_eq!(report.downloaded, 1);
    assert_eq!(fs::read(dir.path().join(c.file_name())).unwrap(), b"b");
    sync.assert();
    download.assert();
}

#[test]
fn test_trailing_slash_endpoint() {
    let mut server = Server::new();
    let dir = TempDir::new().unwrap();
    let sync = server
        .mock("POST", "/api/v1/sync/")
        .match_body("[]")
        .with_status(200)
        .with_body("[]")
        .create();

    let credentials = SyncCredentials::new(format!("{}/", server.url()), "foo", dir.path());
    let engine = SyncEngine::over_http(SyncConfig::new(credentials)).unwrap();

    assert_eq!(engine.run().unwrap().downloaded, 0);
    sync.assert();
}

#[test]
fn test_server_error_is_rejection() {
    let mut server = Server::new();
    let dir = TempDir::new().unwrap();
    server
        .mock("POST", "/api/v1/sync/")
        .with_status(500)
        .with_body("server error")
        .create();

    let err = engine(&server, &dir).run().unwrap_err();

    match err {
        SyncError::RemoteRejected { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "server error");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_missing_content_is_download_failure() {
    let mut server = Server::new();
    let dir = TempDir::new().unwrap();
    let id = BookId::new();
    server
        .mock("POST", "/api/v1/sync/")
        .with_status(200)
        .with_body(json!([{ "id": id.to_string(), "url": format!("{}/files/x", server.url()) }]).to_string())
        .create();
    server.mock("GET", "/files/x").with_status(404).create();

    let err = engine(&server, &dir).run().unwrap_err();

    assert!(matches!(err, SyncError::DownloadFailed { id: failed, status: 404 } if failed == id));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_malformed_response_is_protocol_violation() {
    let mut server = Server::new();
    let dir = TempDir::new().unwrap();
    server
        .mock("POST", "/api/v1/sync/")
        .with_status(200)
        .with_body(r#"[{"id": "../../etc/passwd", "url": "http://evil.test/"}]"#)
        .create();

    let err = engine(&server, &dir).run().unwrap_err();

    assert!(matches!(err, SyncError::ProtocolViolation(_)));
    assert!(!err.is_retryable());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}
