//! Error types for the sync engine.

use kosync_protocol::{BookId, ProtocolError};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Boxed underlying cause of a transport failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during a sync run.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The library directory could not be listed.
    #[error("cannot read library directory {}: {source}", .path.display())]
    DirectoryUnreadable {
        /// Library directory.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The library directory could not be created or is not a directory.
    #[error("cannot prepare library directory {}: {source}", .path.display())]
    Configuration {
        /// Library directory.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Network or transport error (DNS, connect, TLS, timeout, body read).
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether re-running later may succeed.
        retryable: bool,
        /// Underlying cause, if any.
        #[source]
        source: Option<BoxError>,
    },

    /// The sync endpoint answered with a status other than 200.
    #[error("server rejected sync request with status {status}: {body}")]
    RemoteRejected {
        /// HTTP status code.
        status: u16,
        /// Raw response body, for diagnostics.
        body: String,
    },

    /// The sync endpoint answered 200 with a payload that does not decode.
    #[error("protocol violation: {0}")]
    ProtocolViolation(#[from] ProtocolError),

    /// A content URL answered with a status other than 200.
    #[error("download of book {id} failed with status {status}")]
    DownloadFailed {
        /// Book being fetched.
        id: BookId,
        /// HTTP status code.
        status: u16,
    },

    /// A downloaded book could not be written to disk.
    #[error("cannot write {}: {source}", .path.display())]
    LocalWrite {
        /// File being written.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Invalid state transition.
    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        /// Current state.
        from: String,
        /// Attempted target state.
        to: String,
    },
}

impl SyncError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
            source: None,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
            source: None,
        }
    }

    /// Creates a transport error wrapping its cause.
    pub fn transport(
        message: impl Into<String>,
        retryable: bool,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Transport {
            message: message.into(),
            retryable,
            source: Some(source.into()),
        }
    }

    /// Returns true if re-running the sync later may succeed.
    ///
    /// The engine never retries by itself; this is a hint for the operator.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport { retryable, .. } => *retryable,
            SyncError::RemoteRejected { status, .. } | SyncError::DownloadFailed { status, .. } => {
                *status == 429 || *status >= 500
            }
            _ => false,
        }
    }

    /// Returns the HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            SyncError::RemoteRejected { status, .. } | SyncError::DownloadFailed { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}
