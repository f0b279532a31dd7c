//! # KoSync Engine
//!
//! Reconciliation and download engine for the KoSync library client.
//!
//! This crate provides:
//! - Local inventory scanning (`Library`)
//! - The reconciliation exchange with the sync server (`SyncTransport`,
//!   `HttpTransport`)
//! - Atomic book downloads (`Fetcher`)
//! - The run orchestrator (`SyncEngine`)
//! - A blocking `reqwest` HTTP client and an in-process loopback client
//!
//! ## Architecture
//!
//! One run is a one-directional **pull what's missing** pass:
//! 1. Scan the library directory for `{id}.epub` files
//! 2. POST the ids to the server, which answers with what is missing
//! 3. Download each missing book, in server order, one at a time
//!
//! ## Key Invariants
//!
//! - Every file the fetcher publishes is recognized by the scanner
//! - A failed download never leaves a `{id}.epub` behind
//! - Local file names come from validated ids, never from the server's URLs
//! - Re-running after a successful run downloads nothing
//! - Nothing is retried automatically

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod config;
mod error;
mod fetcher;
mod http;
mod library;
mod state;
mod transport;

pub use client::ReqwestClient;
pub use config::{DownloadPolicy, SyncConfig, SyncCredentials, DEFAULT_TIMEOUT};
pub use error::{BoxError, SyncError, SyncResult};
pub use fetcher::Fetcher;
pub use http::{HttpClient, HttpResponse, HttpTransport, LoopbackClient, LoopbackServer};
pub use library::Library;
pub use state::{DownloadFailure, SyncEngine, SyncReport, SyncState, SyncStats};
pub use transport::{ContentStream, MockTransport, SyncTransport};

pub use kosync_protocol::{BookId, DownloadInstruction, SyncRequest, SyncResponse};
