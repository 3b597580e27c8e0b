//! HTTP transport tests against a local canned-response server.

use std::time::Duration;

use aql_exec::config::{ConnectionProfile, ProfileConfig};
use aql_exec::query::{Endpoint, RequestEnvelope};
use aql_exec::transport::{HttpTransport, QueryTransport, MAX_CHUNK_SIZE};

use super::server::{CannedResponse, TestServer};

fn profile(port: u16, username: Option<&str>) -> ConnectionProfile {
    ConnectionProfile::from_config(
        "local",
        &ProfileConfig {
            host: Some("127.0.0.1".to_string()),
            port: Some(port),
            database: Some("test".to_string()),
            username: username.map(String::from),
            password: Some("secret".to_string()),
            batch_size: Some(500),
            result_count: Some(true),
            ..Default::default()
        },
    )
    .unwrap()
}

#[tokio::test]
async fn test_posts_envelope_to_cursor_endpoint() {
    let server = TestServer::start(vec![CannedResponse::json(r#"{"result":[1]}"#)]).await;
    let profile = profile(server.port, None);
    let envelope = RequestEnvelope::execute("FOR x IN y RETURN x", None, &profile);

    let response = HttpTransport::new()
        .execute(&profile, &envelope, Endpoint::Cursor)
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, r#"{"result":[1]}"#);

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/_db/test/_api/cursor");
    assert_eq!(
        requests[0].body,
        r#"{"query":"FOR x IN y RETURN x","count":true,"batchSize":500}"#
    );
    assert_eq!(requests[0].header("authorization"), None);
}

#[tokio::test]
async fn test_basic_auth_when_username_set() {
    let server = TestServer::start(vec![CannedResponse::json("{}")]).await;
    let profile = profile(server.port, Some("root"));

    HttpTransport::new()
        .execute(&profile, &RequestEnvelope::explain("RETURN 1", None), Endpoint::Explain)
        .await
        .unwrap();

    let request = &server.requests()[0];
    assert_eq!(request.path, "/_db/test/_api/explain");
    assert_eq!(request.header("authorization"), Some("Basic cm9vdDpzZWNyZXQ="));
}

#[tokio::test]
async fn test_reads_bodies_larger_than_one_chunk() {
    let items: Vec<String> = (0..5000).map(|i| format!("\"item-{i}\"")).collect();
    let body = format!("{{\"result\":[{}]}}", items.join(","));
    assert!(body.len() > MAX_CHUNK_SIZE * 4);

    let server = TestServer::start(vec![CannedResponse::json(&body)]).await;
    let profile = profile(server.port, None);

    let response = HttpTransport::new()
        .execute(&profile, &RequestEnvelope::explain("RETURN 1", None), Endpoint::Cursor)
        .await
        .unwrap();

    assert_eq!(response.body, body);
}

#[tokio::test]
async fn test_invalid_utf8_is_replaced() {
    let server = TestServer::start(vec![CannedResponse::bytes(b"{\"a\":\"\xff\"}".to_vec())]).await;
    let profile = profile(server.port, None);

    let response = HttpTransport::new()
        .execute(&profile, &RequestEnvelope::explain("RETURN 1", None), Endpoint::Cursor)
        .await
        .unwrap();

    assert_eq!(response.body, "{\"a\":\"\u{FFFD}\"}");
}

#[tokio::test]
async fn test_error_status_still_returns_body() {
    let error = r#"{"error":true,"errorMessage":"AQL: syntax error","code":400,"errorNum":1501}"#;
    let server = TestServer::start(vec![CannedResponse::status(400, error)]).await;
    let profile = profile(server.port, None);

    let response = HttpTransport::new()
        .execute(&profile, &RequestEnvelope::explain("RETRUN 1", None), Endpoint::Cursor)
        .await
        .unwrap();

    assert_eq!(response.status, 400);
    assert_eq!(response.body, error);
}

#[tokio::test]
async fn test_unanswered_request_times_out() {
    let server = TestServer::start(vec![CannedResponse::hang()]).await;
    let profile = profile(server.port, None);

    let err = HttpTransport::new()
        .with_request_timeout(Duration::from_millis(200))
        .execute(&profile, &RequestEnvelope::explain("RETURN 1", None), Endpoint::Cursor)
        .await
        .unwrap_err();

    assert_eq!(err.category(), "Transport Error");
    assert!(err.to_string().contains("timed out"));
}
