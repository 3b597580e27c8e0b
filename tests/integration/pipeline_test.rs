//! End-to-end runs: config file -> session -> HTTP -> rendered destination.

use std::sync::Arc;

use aql_exec::config::{Config, FileProfileProvider, ProfileConfig};
use aql_exec::host::{HeadlessHost, MemoryHost};
use aql_exec::transport::HttpTransport;
use aql_exec::{RunMode, Session, UnitOutcome};
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

use super::server::{CannedResponse, TestServer};

fn write_config(dir: &std::path::Path, port: u16, result_file_name: Option<&str>) -> std::path::PathBuf {
    let mut config = Config::default();
    config.connections.insert(
        "local".to_string(),
        ProfileConfig {
            host: Some("127.0.0.1".to_string()),
            port: Some(port),
            database: Some("test".to_string()),
            batch_size: Some(500),
            result_count: Some(true),
            result_file_name: result_file_name.map(String::from),
            auto_save: Some(true),
            ..Default::default()
        },
    );
    let path = dir.join("config.toml");
    config.save_to_file(&path).unwrap();
    path
}

fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[tokio::test]
async fn test_execute_issues_single_cursor_post() {
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start(vec![CannedResponse::json(
        r#"{"result":[{"_key":"1","n":12345678901234567890.1}],"hasMore":false}"#,
    )])
    .await;
    let config = write_config(dir.path(), server.port, None);

    let host = Arc::new(MemoryHost::new().with_document(None, "FOR x IN y RETURN x"));
    let session = Session::new(
        Arc::new(FileProfileProvider::new(config)),
        host.clone(),
        Arc::new(HttpTransport::new()),
    );

    let report = session.execute().await.unwrap();
    assert_eq!(report.written(), 1);

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/_db/test/_api/cursor");
    assert_eq!(
        requests[0].body,
        r#"{"query":"FOR x IN y RETURN x","count":true,"batchSize":500}"#
    );

    let expected = r#"{
  "result": [
    {
      "_key": "1",
      "n": 12345678901234567890.1
    }
  ],
  "hasMore": false
}

"#;
    assert_eq!(host.log_text(), expected);
}

#[tokio::test]
async fn test_unreachable_server_yields_no_output_and_run_completes() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), closed_port(), None);

    let host = Arc::new(MemoryHost::new().with_document(None, "RETURN 1 //! RETURN 2"));
    let session = Session::new(
        Arc::new(FileProfileProvider::new(config)),
        host.clone(),
        Arc::new(HttpTransport::new()),
    );

    let report = session.execute().await.unwrap();

    assert_eq!(
        report.outcomes,
        vec![
            UnitOutcome::NoResponse {
                query: "RETURN 1".to_string()
            },
            UnitOutcome::NoResponse {
                query: "RETURN 2".to_string()
            },
        ]
    );
    assert_eq!(host.log_text(), "");
}

#[tokio::test]
async fn test_results_written_to_file_next_to_document() {
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start(vec![
        CannedResponse::json(r#"{"result":[1]}"#),
        CannedResponse::json(r#"{"result":[2]}"#),
    ])
    .await;
    let config = write_config(dir.path(), server.port, Some("results/*.json"));

    let document = dir.path().join("report.aql");
    std::fs::write(&document, "RETURN 1\n//!\nRETURN 2\n").unwrap();
    let results = dir.path().join("results").join("report.json");
    std::fs::create_dir_all(results.parent().unwrap()).unwrap();
    std::fs::write(&results, "previous run\n").unwrap();

    let host = Arc::new(HeadlessHost::from_file(&document, Vec::new()).unwrap());
    let session = Session::new(
        Arc::new(FileProfileProvider::new(config)),
        host,
        Arc::new(HttpTransport::new()),
    );

    let report = session.run(RunMode::Execute, &CancellationToken::new()).await.unwrap();
    assert_eq!(report.written(), 2);

    assert_eq!(
        std::fs::read_to_string(&results).unwrap(),
        "{\n  \"result\": [\n    1\n  ]\n}\n\n{\n  \"result\": [\n    2\n  ]\n}\n\n"
    );
}

#[tokio::test]
async fn test_wrong_document_extension_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start(vec![CannedResponse::json("[]")]).await;
    let config = write_config(dir.path(), server.port, Some("*.json"));

    let document = dir.path().join("notes.txt");
    std::fs::write(&document, "RETURN 1").unwrap();

    let host = Arc::new(HeadlessHost::from_file(&document, Vec::new()).unwrap());
    let session = Session::new(
        Arc::new(FileProfileProvider::new(config)),
        host,
        Arc::new(HttpTransport::new()),
    );

    let report = session.execute().await.unwrap();

    assert!(matches!(report.outcomes[0], UnitOutcome::SinkFailed { .. }));
    assert!(!dir.path().join("notes.json").exists());
}

#[tokio::test]
async fn test_switch_connection_persists_and_fills_completions() {
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start(vec![CannedResponse::json(
        r#"{"result":["users","orders"],"hasMore":false,"count":2}"#,
    )])
    .await;
    let config = write_config(dir.path(), server.port, None);

    let host = Arc::new(MemoryHost::new());
    let session = Session::new(
        Arc::new(FileProfileProvider::new(&config)),
        host.clone(),
        Arc::new(HttpTransport::new()),
    );

    session.switch_connection("local").await.unwrap();

    assert_eq!(
        Config::load_from_file(&config).unwrap().default_connection.as_deref(),
        Some("local")
    );
    assert_eq!(
        host.completions(),
        vec![
            ("users".to_string(), "users".to_string()),
            ("orders".to_string(), "orders".to_string()),
        ]
    );
    assert!(server.requests()[0].body.contains("Collections()"));
}
