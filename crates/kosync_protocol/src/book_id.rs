//! Book identifier and its file-name codec.

use crate::error::{ProtocolError, ProtocolResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// File extension of every book stored in a library directory.
pub const BOOK_EXTENSION: &str = "epub";

/// Length of a hyphenated UUID string.
const CANONICAL_LEN: usize = 36;

/// Unique identifier for a book.
///
/// Book IDs are UUIDs assigned by the server. The canonical textual form is
/// the lowercase hyphenated UUID, which is what goes on the wire and into
/// file names. Parsing accepts either case.
///
/// The same type is the only codec between identifiers and file names: the
/// scanner decodes names with [`BookId::from_file_name`] and the fetcher
/// encodes them with [`BookId::file_name`], so every file written is
/// recognized on the next scan.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BookId(Uuid);

impl BookId {
    /// Creates a new random book ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a book ID from a UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Parses a hyphenated UUID token.
    ///
    /// Returns `None` for anything else, including the braced, URN and
    /// simple UUID forms.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        if token.len() != CANONICAL_LEN {
            return None;
        }
        Uuid::parse_str(token).ok().map(Self)
    }

    /// Decodes a directory entry name of the form `<uuid>.epub`.
    ///
    /// The extension is compared ASCII case-insensitively. Names that do not
    /// match (temp files, other formats, bare UUIDs) yield `None`.
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (stem, extension) = name.rsplit_once('.')?;
        if !extension.eq_ignore_ascii_case(BOOK_EXTENSION) {
            return None;
        }
        Self::parse(stem)
    }

    /// Returns the file name this book is stored under.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.{}", self, BOOK_EXTENSION)
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BookId({})", self.0.hyphenated())
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for BookId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> ProtocolResult<Self> {
        Self::parse(s).ok_or_else(|| ProtocolError::InvalidBookId(s.to_string()))
    }
}

impl TryFrom<String> for BookId {
    type Error = ProtocolError;

    fn try_from(value: String) -> ProtocolResult<Self> {
        value.parse()
    }
}

impl From<BookId> for String {
    fn from(id: BookId) -> Self {
        id.to_string()
    }
}

impl From<Uuid> for BookId {
    fn from(uuid: Uuid) -> Self {
        Self::from_uuid(uuid)
    }
}

impl From<BookId> for Uuid {
    fn from(id: BookId) -> Self {
        id.0
    }
}
