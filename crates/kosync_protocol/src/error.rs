//! Error types for the sync protocol.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while encoding or decoding protocol messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The payload is not valid JSON or does not have the expected shape.
    #[error("malformed JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    /// A book identifier is not a canonical UUID.
    #[error("invalid book identifier: {0:?}")]
    InvalidBookId(String),

    /// A download URL is unusable.
    #[error("invalid download url {url:?}: {reason}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl ProtocolError {
    /// Creates an invalid-url error.
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }
}
