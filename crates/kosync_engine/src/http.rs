//! HTTP transport implementation.
//!
//! This module provides an HTTP-based transport for the sync engine.
//! The actual HTTP client is abstracted via a trait so the protocol logic
//! (URL construction, bearer auth, status mapping, JSON decoding) is shared
//! by the real network client and the in-process loopback used in tests.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::transport::{ContentStream, SyncTransport};
use kosync_protocol::{sync_url, DownloadInstruction, SyncRequest, SyncResponse};
use std::fmt;
use std::io::{Cursor, Read};
use std::sync::Arc;
use tracing::debug;

/// HTTP status the protocol treats as success.
const STATUS_OK: u16 = 200;

/// An HTTP response with a streamed body.
pub struct HttpResponse {
    status: u16,
    body: ContentStream,
}

impl HttpResponse {
    /// Creates a response from a status and a body reader.
    pub fn new(status: u16, body: impl Read + Send + 'static) -> Self {
        Self {
            status,
            body: Box::new(body),
        }
    }

    /// Creates a response from a status and an in-memory body.
    pub fn from_bytes(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self::new(status, Cursor::new(body.into()))
    }

    /// Returns the HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns true for `200 OK`.
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    /// Returns the body as a reader.
    pub fn into_body(self) -> ContentStream {
        self.body
    }

    /// Reads the whole body into memory.
    pub fn into_bytes(mut self) -> SyncResult<Vec<u8>> {
        let mut bytes = Vec::new();
        self.body
            .read_to_end(&mut bytes)
            .map_err(|e| SyncError::transport("failed to read response body", true, e))?;
        Ok(bytes)
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual HTTP transport. Implementations
/// return any response the server produced, whatever its status; only
/// failures to obtain a response at all are errors, and those must be
/// [`SyncError::Transport`].
pub trait HttpClient: Send + Sync {
    /// Sends a POST request with a JSON body and `Authorization: Bearer`.
    fn post_json(&self, url: &str, bearer_token: &str, body: Vec<u8>) -> SyncResult<HttpResponse>;

    /// Sends a GET request with `Authorization: Bearer`.
    fn get(&self, url: &str, bearer_token: &str) -> SyncResult<HttpResponse>;
}

impl<C: HttpClient + ?Sized> HttpClient for Arc<C> {
    fn post_json(&self, url: &str, bearer_token: &str, body: Vec<u8>) -> SyncResult<HttpResponse> {
        (**self).post_json(url, bearer_token, body)
    }

    fn get(&self, url: &str, bearer_token: &str) -> SyncResult<HttpResponse> {
        (**self).get(url, bearer_token)
    }
}

/// HTTP-based sync transport.
///
/// Uses JSON for the reconciliation exchange and streams book content.
pub struct HttpTransport<C: HttpClient> {
    /// Full URL of the reconciliation endpoint.
    sync_url: String,
    /// Bearer token sent with every request.
    token: String,
    /// HTTP client implementation.
    client: C,
}

impl<C: HttpClient> HttpTransport<C> {
    /// Creates a new HTTP transport for the server at `endpoint`.
    pub fn new(endpoint: &str, token: impl Into<String>, client: C) -> Self {
        Self {
            sync_url: sync_url(endpoint),
            token: token.into(),
            client,
        }
    }

    /// Creates a transport from the credentials in `config`.
    pub fn from_config(config: &SyncConfig, client: C) -> Self {
        Self::new(
            &config.credentials.endpoint,
            config.credentials.token.clone(),
            client,
        )
    }

    /// Returns the reconciliation URL.
    pub fn sync_url(&self) -> &str {
        &self.sync_url
    }

    /// Returns the HTTP client.
    pub fn client(&self) -> &C {
        &self.client
    }
}

impl<C: HttpClient> SyncTransport for HttpTransport<C> {
    fn reconcile(&self, request: &SyncRequest) -> SyncResult<SyncResponse> {
        let body = request.encode()?;
        debug!(url = %self.sync_url, books = request.len(), "posting local inventory");

        let response = self.client.post_json(&self.sync_url, &self.token, body)?;
        let status = response.status();
        let bytes = response.into_bytes()?;

        if status != STATUS_OK {
            return Err(SyncError::RemoteRejected {
                status,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        debug!(bytes = bytes.len(), "received sync response");
        Ok(SyncResponse::decode(&bytes)?)
    }

    fn fetch(&self, instruction: &DownloadInstruction) -> SyncResult<ContentStream> {
        debug!(id = %instruction.id, url = %instruction.url, "requesting book");

        let response = self.client.get(instruction.url.as_str(), &self.token)?;
        if !response.is_ok() {
            return Err(SyncError::DownloadFailed {
                id: instruction.id,
                status: response.status(),
            });
        }

        Ok(response.into_body())
    }
}

/// A loopback HTTP client that routes requests directly to an in-process server.
///
/// Useful for testing without actual network overhead.
pub struct LoopbackClient<S: LoopbackServer> {
    server: S,
}

impl<S: LoopbackServer + Send + Sync> LoopbackClient<S> {
    /// Creates a new loopback client connected to the given server.
    pub fn new(server: S) -> Self {
        Self { server }
    }

    /// Returns the server.
    pub fn server(&self) -> &S {
        &self.server
    }
}

/// Trait for servers that can handle loopback requests.
///
/// Handlers return `(status, body)`; an `Err` simulates a network failure.
pub trait LoopbackServer {
    /// Handles a POST request.
    fn handle_post(&self, url: &str, bearer_token: &str, body: &[u8]) -> Result<(u16, Vec<u8>), String>;

    /// Handles a GET request.
    fn handle_get(&self, url: &str, bearer_token: &str) -> Result<(u16, Vec<u8>), String>;
}

impl<S: LoopbackServer + ?Sized> LoopbackServer for Arc<S> {
    fn handle_post(&self, url: &str, bearer_token: &str, body: &[u8]) -> Result<(u16, Vec<u8>), String> {
        (**self).handle_post(url, bearer_token, body)
    }

    fn handle_get(&self, url: &str, bearer_token: &str) -> Result<(u16, Vec<u8>), String> {
        (**self).handle_get(url, bearer_token)
    }
}

impl<S: LoopbackServer + Send + Sync> HttpClient for LoopbackClient<S> {
    fn post_json(&self, url: &str, bearer_token: &str, body: Vec<u8>) -> SyncResult<HttpResponse> {
        let (status, body) = self
            .server
            .handle_post(url, bearer_token, &body)
            .map_err(SyncError::transport_retryable)?;
        Ok(HttpResponse::from_bytes(status, body))
    }

    fn get(&self, url: &str, bearer_token: &str) -> SyncResult<HttpResponse> {
        let (status, body) = self
            .server
            .handle_get(url, bearer_token)
            .map_err(SyncError::transport_retryable)?;
        Ok(HttpResponse::from_bytes(status, body))
    }
}
