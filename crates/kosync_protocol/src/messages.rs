//! Protocol messages for sync.

use crate::book_id::BookId;
use crate::error::{ProtocolError, ProtocolResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use url::Url;

/// Path of the reconciliation endpoint, relative to the server base URL.
pub const SYNC_PATH: &str = "/api/v1/sync/";

/// Builds the reconciliation URL for a server base URL.
///
/// Trailing slashes on `endpoint` are dropped before [`SYNC_PATH`] is
/// appended, so `https://host/` and `https://host` are equivalent.
pub fn sync_url(endpoint: &str) -> String {
    format!("{}{}", endpoint.trim_end_matches('/'), SYNC_PATH)
}

/// The local inventory sent to the server.
///
/// Serialized as a JSON array of canonical identifiers. The server treats it
/// as a set; entries are kept sorted so payloads are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncRequest {
    books: BTreeSet<BookId>,
}

impl SyncRequest {
    /// Creates a request from the books present locally.
    pub fn new(books: impl IntoIterator<Item = BookId>) -> Self {
        Self {
            books: books.into_iter().collect(),
        }
    }

    /// Returns the books in the request.
    pub fn books(&self) -> &BTreeSet<BookId> {
        &self.books
    }

    /// Returns the number of books in the request.
    pub fn len(&self) -> usize {
        self.books.len()
    }

    /// Returns true if no books are present locally.
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Encodes to JSON.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes from JSON.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// A server directive to fetch one book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadInstruction {
    /// Identifier the book is stored under locally.
    pub id: BookId,
    /// Where to fetch the content from. May be on any host.
    pub url: Url,
}

impl DownloadInstruction {
    /// Creates a new instruction.
    pub fn new(id: BookId, url: Url) -> Self {
        Self { id, url }
    }

    /// Checks that the URL can be fetched over HTTP.
    pub fn validate(&self) -> ProtocolResult<()> {
        match self.url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ProtocolError::invalid_url(
                    self.url.as_str(),
                    format!("unsupported scheme {other}"),
                ))
            }
        }
        if self.url.host_str().is_none() {
            return Err(ProtocolError::invalid_url(self.url.as_str(), "missing host"));
        }
        Ok(())
    }
}

/// The server's answer to a [`SyncRequest`]: the books missing locally.
///
/// An empty response means the library is up to date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncResponse {
    /// Instructions in the order the server returned them.
    pub instructions: Vec<DownloadInstruction>,
}

impl SyncResponse {
    /// Creates a response.
    pub fn new(instructions: Vec<DownloadInstruction>) -> Self {
        Self { instructions }
    }

    /// Encodes to JSON.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes from JSON and validates every instruction.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        let response: Self = serde_json::from_slice(bytes)?;
        for instruction in &response.instructions {
            instruction.validate()?;
        }
        Ok(response)
    }

    /// Returns the number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns true if nothing needs fetching.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "01980fd0-c9b1-4f75-beb7-7cd5e847482c";
    const B: &str = "66243753-4f8c-4330-9f9e-6b9ef2f0974e";

    fn id(s: &str) -> BookId {
        s.parse().unwrap()
    }

    #[test]
    fn sync_url_normalizes_trailing_slash() {
        assert_eq!(sync_url("http://kosync.test/"), "http://kosync.test/api/v1/sync/");
        assert_eq!(sync_url("http://kosync.test"), "http://kosync.test/api/v1/sync/");
        assert_eq!(sync_url("http://kosync.test///"), "http://kosync.test/api/v1/sync/");
        assert_eq!(
            sync_url("https://books.example.com/kosync/"),
            "https://books.example.com/kosync/api/v1/sync/"
        );
    }

    #[test]
    fn request_encodes_as_string_array() {
        let request = SyncRequest::new([id(B), id(A)]);
        let json: serde_json::Value = serde_json::from_slice(&request.encode().unwrap()).unwrap();
        assert_eq!(json, serde_json::json!([A, B]));
    }

    #[test]
    fn empty_request_encodes_as_empty_array() {
        let request = SyncRequest::default();
        assert!(request.is_empty());
        assert_eq!(request.encode().unwrap(), b"[]");
    }

    #[test]
    fn request_decode_rejects_non_ids() {
        assert!(SyncRequest::decode(br#"["hello"]"#).is_err());
        assert!(SyncRequest::decode(br#"{"ids": []}"#).is_err());
        let request = SyncRequest::decode(format!(r#"["{A}"]"#).as_bytes()).unwrap();
        assert_eq!(request.len(), 1);
        assert!(request.books().contains(&id(A)));
    }

    #[test]
    fn response_decodes_in_server_order() {
        let body = format!(
            r#"[{{"id": "{B}", "url": "http://localhost:8000/api/v1/books/{B}"}},
                {{"id": "{A}", "url": "https://cdn.example.com/{A}"}}]"#
        );
        let response = SyncResponse::decode(body.as_bytes()).unwrap();
        assert_eq!(response.len(), 2);
        assert_eq!(response.instructions[0].id, id(B));
        assert_eq!(response.instructions[1].id, id(A));
        assert_eq!(response.instructions[1].url.host_str(), Some("cdn.example.com"));
    }

    #[test]
    fn empty_response_is_valid() {
        let response = SyncResponse::decode(b"[]").unwrap();
        assert!(response.is_empty());
    }

    #[test]
    fn response_rejects_malformed_json() {
        assert!(matches!(
            SyncResponse::decode(b"<html>oops</html>"),
            Err(ProtocolError::Json(_))
        ));
        assert!(matches!(
            SyncResponse::decode(br#"[{"id": "x"}]"#),
            Err(ProtocolError::Json(_))
        ));
    }

    #[test]
    fn response_rejects_path_like_ids() {
        let body = r#"[{"id": "../evil", "url": "http://host/file"}]"#;
        assert!(SyncResponse::decode(body.as_bytes()).is_err());
    }

    #[test]
    fn response_rejects_relative_and_non_http_urls() {
        let relative = format!(r#"[{{"id": "{A}", "url": "/books/{A}"}}]"#);
        assert!(SyncResponse::decode(relative.as_bytes()).is_err());

        let file = format!(r#"[{{"id": "{A}", "url": "file:///etc/passwd"}}]"#);
        assert!(matches!(
            SyncResponse::decode(file.as_bytes()),
            Err(ProtocolError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn response_encode_matches_wire_shape() {
        let url = Url::parse("https://cdn.example.com/a.epub").unwrap();
        let response = SyncResponse::new(vec![DownloadInstruction::new(id(A), url)]);
        let json: serde_json::Value = serde_json::from_slice(&response.encode().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"id": A, "url": "https://cdn.example.com/a.epub"}])
        );
    }
}
