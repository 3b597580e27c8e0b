//! Scripted transport for testing.
//!
//! Replies are handed out in order; once the script runs out every request
//! gets an empty cursor result. Every request is recorded.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use super::{endpoint_url, QueryTransport, TransportResponse};
use crate::config::ConnectionProfile;
use crate::error::{AqlExecError, Result};
use crate::query::{Endpoint, RequestEnvelope};

const EMPTY_CURSOR: &str = r#"{"result":[],"hasMore":false,"cached":false,"error":false,"code":201}"#;

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// A 200 response with this body.
    Body(String),
    /// A transport failure with this message.
    Fail(String),
}

/// A request the mock received.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub url: String,
    pub endpoint: Endpoint,
    pub envelope: RequestEnvelope,
}

/// Transport that replays scripted replies.
#[derive(Debug, Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport that answers with `replies` in order.
    pub fn with_replies(replies: impl IntoIterator<Item = MockReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl QueryTransport for MockTransport {
    async fn execute(
        &self,
        profile: &ConnectionProfile,
        envelope: &RequestEnvelope,
        endpoint: Endpoint,
    ) -> Result<TransportResponse> {
        let url = endpoint_url(profile, endpoint)?;
        self.requests
            .lock()
            .map_err(|_| AqlExecError::internal("mock transport lock poisoned"))?
            .push(RecordedRequest {
                url: url.to_string(),
                endpoint,
                envelope: envelope.clone(),
            });

        let reply = self
            .replies
            .lock()
            .map_err(|_| AqlExecError::internal("mock transport lock poisoned"))?
            .pop_front()
            .unwrap_or_else(|| MockReply::Body(EMPTY_CURSOR.to_string()));

        match reply {
            MockReply::Body(body) => Ok(TransportResponse {
                status: 200,
                body,
                latency: Duration::from_millis(1),
                download: Duration::from_millis(1),
            }),
            MockReply::Fail(message) => Err(AqlExecError::transport(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProfileConfig;
    use crate::transport::fetch_body;

    fn profile() -> ConnectionProfile {
        ConnectionProfile::from_config(
            "t",
            &ProfileConfig {
                host: Some("localhost".to_string()),
                port: Some(8529),
                database: Some("test".to_string()),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_replies_in_order_then_empty_cursor() {
        let transport = MockTransport::with_replies([
            MockReply::Body("first".to_string()),
            MockReply::Fail("refused".to_string()),
        ]);
        let envelope = RequestEnvelope::explain("RETURN 1", None);

        let first = fetch_body(&transport, &profile(), &envelope, Endpoint::Explain).await;
        let second = fetch_body(&transport, &profile(), &envelope, Endpoint::Explain).await;
        let third = fetch_body(&transport, &profile(), &envelope, Endpoint::Explain).await;

        assert_eq!(first.as_deref(), Some("first"));
        assert_eq!(second, None);
        assert_eq!(third.as_deref(), Some(EMPTY_CURSOR));
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_records_url() {
        let transport = MockTransport::new();
        let envelope = RequestEnvelope::execute("RETURN 1", None, &profile());
        transport
            .execute(&profile(), &envelope, Endpoint::Cursor)
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].url, "http://localhost:8529/_db/test/_api/cursor");
        assert_eq!(requests[0].envelope, envelope);
    }
}
