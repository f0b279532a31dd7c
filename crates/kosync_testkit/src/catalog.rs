//! In-memory catalog server.
//!
//! `MemoryCatalog` answers the sync protocol the way the real server does:
//! the client posts the ids it has, the catalog returns every book it holds
//! that is not in that list. It plugs into the engine through
//! [`LoopbackServer`], so orchestrator tests exercise the real HTTP
//! transport logic without a network.

use kosync_engine::{HttpTransport, LoopbackClient, LoopbackServer};
use kosync_protocol::{sync_url, BookId, DownloadInstruction, SyncRequest, SyncResponse};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use url::Url;

/// Base URL the catalog pretends to live at.
pub const CATALOG_URL: &str = "http://kosync.test";

/// Token the catalog accepts unless configured otherwise.
pub const CATALOG_TOKEN: &str = "foo";

/// Transport type used to talk to a shared catalog.
pub type CatalogTransport = HttpTransport<LoopbackClient<Arc<MemoryCatalog>>>;

/// A request the catalog received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// `POST` or `GET`.
    pub method: &'static str,
    /// Full request URL.
    pub url: String,
    /// Bearer token presented.
    pub bearer_token: String,
    /// Request body.
    pub body: Vec<u8>,
}

#[derive(Debug, Clone)]
struct CatalogBook {
    id: BookId,
    content: Vec<u8>,
    status: u16,
}

/// An in-process sync server holding books in memory.
#[derive(Debug)]
pub struct MemoryCatalog {
    base_url: String,
    content_base_url: String,
    token: String,
    books: RwLock<Vec<CatalogBook>>,
    sync_failure: Mutex<Option<(u16, String)>>,
    offline: Mutex<bool>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MemoryCatalog {
    /// Creates an empty catalog at [`CATALOG_URL`] accepting [`CATALOG_TOKEN`].
    pub fn new() -> Self {
        Self {
            base_url: CATALOG_URL.to_string(),
            content_base_url: CATALOG_URL.to_string(),
            token: CATALOG_TOKEN.to_string(),
            books: RwLock::new(Vec::new()),
            sync_failure: Mutex::new(None),
            offline: Mutex::new(false),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Sets the accepted token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Serves content from a different host than the sync endpoint.
    pub fn with_content_base_url(mut self, url: impl Into<String>) -> Self {
        self.content_base_url = url.into();
        self
    }

    /// Returns the base URL clients should use as endpoint.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Wraps the catalog in a transport presenting `token`.
    pub fn transport(self: &Arc<Self>, token: &str) -> CatalogTransport {
        HttpTransport::new(&self.base_url, token, LoopbackClient::new(Arc::clone(self)))
    }

    /// Adds a book, served with status 200.
    pub fn add_book(&self, id: BookId, content: impl Into<Vec<u8>>) {
        self.books.write().push(CatalogBook {
            id,
            content: content.into(),
            status: 200,
        });
    }

    /// Makes downloads of `id` answer with `status` instead of the content.
    pub fn set_download_status(&self, id: BookId, status: u16) {
        if let Some(book) = self.books.write().iter_mut().find(|b| b.id == id) {
            book.status = status;
        }
    }

    /// Makes the sync endpoint answer with `status` and `body`.
    pub fn fail_sync(&self, status: u16, body: impl Into<String>) {
        *self.sync_failure.lock() = Some((status, body.into()));
    }

    /// Simulates the server being unreachable.
    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock() = offline;
    }

    /// Returns the number of books held.
    pub fn book_count(&self) -> usize {
        self.books.read().len()
    }

    /// Returns the content URL of a book.
    pub fn content_url(&self, id: &BookId) -> String {
        format!("{}/api/v1/books/{}", self.content_base_url.trim_end_matches('/'), id)
    }

    /// Returns every request received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Returns the number of requests received so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    fn record(&self, method: &'static str, url: &str, bearer_token: &str, body: &[u8]) {
        self.requests.lock().push(RecordedRequest {
            method,
            url: url.to_string(),
            bearer_token: bearer_token.to_string(),
            body: body.to_vec(),
        });
    }

    fn check_online(&self) -> Result<(), String> {
        if *self.offline.lock() {
            Err("connection refused".into())
        } else {
            Ok(())
        }
    }

    fn missing_books(&self, request: &SyncRequest) -> Result<SyncResponse, String> {
        let instructions = self
            .books
            .read()
            .iter()
            .filter(|book| !request.books().contains(&book.id))
            .map(|book| {
                let url = Url::parse(&self.content_url(&book.id)).map_err(|e| e.to_string())?;
                Ok(DownloadInstruction::new(book.id, url))
            })
            .collect::<Result<Vec<_>, String>>()?;
        Ok(SyncResponse::new(instructions))
    }
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn text(status: u16, body: &str) -> (u16, Vec<u8>) {
    (status, body.as_bytes().to_vec())
}

impl LoopbackServer for MemoryCatalog {
    fn handle_post(&self, url: &str, bearer_token: &str, body: &[u8]) -> Result<(u16, Vec<u8>), String> {
        self.check_online()?;
        self.record("POST", url, bearer_token, body);

        if url != sync_url(&self.base_url) {
            return Ok(text(404, "not found"));
        }
        if bearer_token != self.token {
            return Ok(text(401, r#"{"detail":"Invalid token"}"#));
        }
        if let Some((status, body)) = self.sync_failure.lock().clone() {
            return Ok(text(status, &body));
        }

        let request = match SyncRequest::decode(body) {
            Ok(request) => request,
            Err(e) => return Ok(text(422, &e.to_string())),
        };
        let response = self.missing_books(&request)?;
        let encoded = response.encode().map_err(|e| e.to_string())?;
        Ok((200, encoded))
    }

    fn handle_get(&self, url: &str, bearer_token: &str) -> Result<(u16, Vec<u8>), String> {
        self.check_online()?;
        self.record("GET", url, bearer_token, &[]);

        if bearer_token != self.token {
            return Ok(text(401, r#"{"detail":"Invalid token"}"#));
        }

        let books = self.books.read();
        let Some(book) = books.iter().find(|b| self.content_url(&b.id) == url) else {
            return Ok(text(404, "not found"));
        };

        if book.status != 200 {
            return Ok(text(book.status, "unavailable"));
        }
        Ok((200, book.content.clone()))
    }
}
