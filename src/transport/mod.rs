//! Transport layer for the ArangoDB HTTP API.
//!
//! One POST per query unit, no retries. The trait lets the pipeline run
//! against a scripted transport in tests.

mod http;
mod mock;

pub use http::{endpoint_url, read_body, HttpTransport, DEFAULT_REQUEST_TIMEOUT_SECS, MAX_CHUNK_SIZE};
pub use mock::{MockReply, MockTransport, RecordedRequest};

use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

use crate::config::ConnectionProfile;
use crate::error::Result;
use crate::query::{Endpoint, RequestEnvelope};

/// A complete response from the server.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Body decoded as UTF-8, with invalid sequences replaced.
    pub body: String,
    /// Time from sending the request to receiving the response headers.
    pub latency: Duration,
    /// Time spent reading the body.
    pub download: Duration,
}

/// Sends query requests to a server.
#[async_trait]
pub trait QueryTransport: Send + Sync {
    /// Sends `envelope` to `endpoint` of the profile's database.
    async fn execute(
        &self,
        profile: &ConnectionProfile,
        envelope: &RequestEnvelope,
        endpoint: Endpoint,
    ) -> Result<TransportResponse>;
}

/// Sends a request and returns its body, or `None` if the request failed.
///
/// Failures are logged; callers treat `None` as nothing to render.
pub async fn fetch_body(
    transport: &dyn QueryTransport,
    profile: &ConnectionProfile,
    envelope: &RequestEnvelope,
    endpoint: Endpoint,
) -> Option<String> {
    match transport.execute(profile, envelope, endpoint).await {
        Ok(response) => Some(response.body),
        Err(e) => {
            warn!(
                "{} on {} ({}): {}",
                e.category(),
                endpoint,
                profile.display_string(),
                e
            );
            None
        }
    }
}
