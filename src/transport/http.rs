//! HTTP transport built on reqwest.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::collections::HashMap;
use std::io;
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::io::StreamReader;
use tracing::debug;
use url::Url;

use super::{QueryTransport, TransportResponse};
use crate::config::ConnectionProfile;
use crate::error::{AqlExecError, Result};
use crate::query::{Endpoint, RequestEnvelope};

/// Size of each body read. A shorter read ends the body.
pub const MAX_CHUNK_SIZE: usize = 8192;

/// Upper bound on a whole request, including reading the body.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 500;

/// Builds `http://{host}:{port}/_db/{database}{endpoint}`.
pub fn endpoint_url(profile: &ConnectionProfile, endpoint: Endpoint) -> Result<Url> {
    if profile.host.contains("://") {
        return Err(AqlExecError::config(format!(
            "host '{}' must be a bare host name; only plain http is supported",
            profile.host
        )));
    }

    let invalid_host =
        |reason: &str| AqlExecError::config(format!("Invalid host '{}': {reason}", profile.host));

    let mut url = Url::parse("http://localhost/")
        .map_err(|e| AqlExecError::internal(format!("base URL: {e}")))?;
    match profile.host.parse::<IpAddr>() {
        Ok(ip) => url
            .set_ip_host(ip)
            .map_err(|_| invalid_host("not usable as a host"))?,
        Err(_) => url
            .set_host(Some(&profile.host))
            .map_err(|e| invalid_host(&e.to_string()))?,
    }
    url.set_port(Some(profile.port))
        .map_err(|_| invalid_host("cannot carry a port"))?;
    url.set_path(&format!("/_db/{}{}", profile.database, endpoint.path()));
    Ok(url)
}

/// Reads `reader` to the end in [`MAX_CHUNK_SIZE`] chunks.
///
/// Each chunk is filled completely unless the stream ends first, so the first
/// short chunk marks the end of the body.
pub async fn read_body<R>(reader: &mut R) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut body = Vec::new();
    let mut chunk = vec![0u8; MAX_CHUNK_SIZE];

    loop {
        let read = read_chunk(reader, &mut chunk).await?;
        body.extend_from_slice(&chunk[..read]);
        if read < MAX_CHUNK_SIZE {
            break;
        }
    }

    Ok(body)
}

async fn read_chunk<R>(reader: &mut R, chunk: &mut [u8]) -> io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < chunk.len() {
        let read = reader.read(&mut chunk[filled..]).await?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    Ok(filled)
}

/// Transport talking plain HTTP/1.1 to an ArangoDB coordinator.
///
/// Clients are built once per connect timeout and reused across requests.
#[derive(Debug)]
pub struct HttpTransport {
    request_timeout: Duration,
    clients: Mutex<HashMap<Duration, Client>>,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Sets the whole-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn client(&self, profile: &ConnectionProfile) -> Result<Client> {
        let mut clients = self
            .clients
            .lock()
            .map_err(|_| AqlExecError::internal("HTTP client cache lock poisoned"))?;
        if let Some(client) = clients.get(&profile.connect_timeout) {
            return Ok(client.clone());
        }

        let client = Client::builder()
            .connect_timeout(profile.connect_timeout)
            .build()
            .map_err(|e| AqlExecError::internal(format!("Failed to create HTTP client: {e}")))?;
        clients.insert(profile.connect_timeout, client.clone());
        Ok(client)
    }

    /// Number of distinct clients built so far.
    pub fn client_count(&self) -> usize {
        self.clients.lock().map(|c| c.len()).unwrap_or(0)
    }

    fn map_request_error(e: reqwest::Error, url: &Url) -> AqlExecError {
        if e.is_timeout() {
            AqlExecError::transport(format!("Request to {url} timed out"))
        } else if e.is_connect() {
            AqlExecError::transport(format!("Failed to connect to {url}: {e}"))
        } else {
            AqlExecError::transport(format!("Request to {url} failed: {e}"))
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueryTransport for HttpTransport {
    async fn execute(
        &self,
        profile: &ConnectionProfile,
        envelope: &RequestEnvelope,
        endpoint: Endpoint,
    ) -> Result<TransportResponse> {
        let url = endpoint_url(profile, endpoint)?;
        let client = self.client(profile)?;

        let mut request = client
            .post(url.clone())
            .timeout(self.request_timeout)
            .json(envelope);
        if let Some(username) = &profile.username {
            request = request.basic_auth(username, profile.password.as_ref());
        }

        let request_started = Instant::now();
        let response = request
            .send()
            .await
            .map_err(|e| Self::map_request_error(e, &url))?;
        let latency = request_started.elapsed();

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        let download_started = Instant::now();
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| io::Error::new(io::ErrorKind::Other, e)));
        let mut reader = StreamReader::new(Box::pin(stream));
        let bytes = read_body(&mut reader)
            .await
            .map_err(|e| AqlExecError::transport(format!("Failed to read response from {url}: {e}")))?;
        let download = download_started.elapsed();

        debug!(
            "{} {} ({}, {} bytes): latency {}ms, download {}ms",
            status,
            url,
            content_type,
            bytes.len(),
            latency.as_millis(),
            download.as_millis()
        );

        Ok(TransportResponse {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&bytes).into_owned(),
            latency,
            download,
        })
    }
}
