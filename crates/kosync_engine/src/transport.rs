//! Transport layer abstraction for sync operations.

use crate::error::{SyncError, SyncResult};
use kosync_protocol::{BookId, DownloadInstruction, SyncRequest, SyncResponse};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::{Cursor, Read};

/// Streamed body of a downloaded book.
pub type ContentStream = Box<dyn Read + Send>;

/// A sync transport handles network communication with the sync server.
///
/// This trait abstracts the network layer, allowing for different implementations
/// (HTTP, in-process loopback, mock for testing, etc.).
pub trait SyncTransport: Send + Sync {
    /// Sends the local inventory and returns the books the server wants fetched.
    fn reconcile(&self, request: &SyncRequest) -> SyncResult<SyncResponse>;

    /// Opens the content of one book.
    ///
    /// Returns [`SyncError::DownloadFailed`] before any byte is read if the
    /// server does not answer 200.
    fn fetch(&self, instruction: &DownloadInstruction) -> SyncResult<ContentStream>;
}

/// Canned answer for a mock download.
#[derive(Debug, Clone)]
enum MockContent {
    Body(Vec<u8>),
    Status(u16),
}

/// A mock transport for testing.
#[derive(Debug, Default)]
pub struct MockTransport {
    response: Mutex<Option<SyncResponse>>,
    rejection: Mutex<Option<(u16, String)>>,
    contents: Mutex<HashMap<BookId, MockContent>>,
    requests: Mutex<Vec<SyncRequest>>,
    fetched: Mutex<Vec<BookId>>,
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the reconciliation response.
    pub fn set_response(&self, response: SyncResponse) {
        *self.response.lock() = Some(response);
    }

    /// Makes reconciliation fail with the given status and body.
    pub fn set_rejection(&self, status: u16, body: impl Into<String>) {
        *self.rejection.lock() = Some((status, body.into()));
    }

    /// Sets the content served for a book.
    pub fn set_content(&self, id: BookId, content: impl Into<Vec<u8>>) {
        self.contents
            .lock()
            .insert(id, MockContent::Body(content.into()));
    }

    /// Makes the download of a book fail with the given status.
    pub fn set_download_status(&self, id: BookId, status: u16) {
        self.contents.lock().insert(id, MockContent::Status(status));
    }

    /// Returns every reconciliation request received so far.
    pub fn requests(&self) -> Vec<SyncRequest> {
        self.requests.lock().clone()
    }

    /// Returns the books fetched so far, in order.
    pub fn fetched(&self) -> Vec<BookId> {
        self.fetched.lock().clone()
    }
}

impl SyncTransport for MockTransport {
    fn reconcile(&self, request: &SyncRequest) -> SyncResult<SyncResponse> {
        self.requests.lock().push(request.clone());

        if let Some((status, body)) = self.rejection.lock().clone() {
            return Err(SyncError::RemoteRejected { status, body });
        }

        self.response
            .lock()
            .clone()
            .ok_or_else(|| SyncError::transport_fatal("no mock sync response set"))
    }

    fn fetch(&self, instruction: &DownloadInstruction) -> SyncResult<ContentStream> {
        self.fetched.lock().push(instruction.id);

        match self.contents.lock().get(&instruction.id).cloned() {
            Some(MockContent::Body(bytes)) => Ok(Box::new(Cursor::new(bytes))),
            Some(MockContent::Status(status)) => Err(SyncError::DownloadFailed {
                id: instruction.id,
                status,
            }),
            None => Err(SyncError::DownloadFailed {
                id: instruction.id,
                status: 404,
            }),
        }
    }
}
