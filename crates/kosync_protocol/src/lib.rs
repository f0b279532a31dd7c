//! # KoSync Protocol
//!
//! Wire types and the identifier codec for the KoSync library protocol.
//!
//! This crate provides:
//! - `BookId`, the canonical book identifier, and its file-name codec
//! - `SyncRequest`, the local inventory sent to the server
//! - `SyncResponse` / `DownloadInstruction`, the server's fetch list
//! - JSON encoding/decoding and endpoint URL construction
//!
//! This is a pure protocol crate with no I/O operations.
//!
//! ## Wire format
//!
//! ```text
//! POST {endpoint}/api/v1/sync/
//! Authorization: Bearer {token}
//!
//! ["0e5c6c0f-8d0a-4a4e-9a8e-3f1d2b7c9a10", ...]
//!
//! 200 OK
//! [{"id": "...", "url": "https://..."}, ...]
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod book_id;
mod error;
mod messages;

pub use book_id::{BookId, BOOK_EXTENSION};
pub use error::{ProtocolError, ProtocolResult};
pub use messages::{sync_url, DownloadInstruction, SyncRequest, SyncResponse, SYNC_PATH};
