//! Local library directory management.
//!
//! This module handles the on-disk layout of the book library:
//!
//! ```text
//! <books_dir>/
//! ├─ 01980fd0-c9b1-4f75-beb7-7cd5e847482c.epub   # one file per book
//! ├─ 66243753-4f8c-4330-9f9e-6b9ef2f0974e.epub
//! └─ .29ce38bb-ebb5-457c-93a8-d50480ccafc7.epub.part   # only during a download
//! ```
//!
//! File names are produced and recognized by [`BookId`] alone. Partial
//! downloads use a hidden name the codec never decodes, so a crashed transfer
//! can never be mistaken for a finished book.

use crate::error::{SyncError, SyncResult};
use kosync_protocol::BookId;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Suffix appended to in-flight downloads.
const PARTIAL_SUFFIX: &str = "part";

/// The local book library: a flat directory of `{id}.epub` files.
#[derive(Debug, Clone)]
pub struct Library {
    /// Root directory path.
    path: PathBuf,
}

impl Library {
    /// Creates a handle for the library at `path`. Touches nothing on disk.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path to the library directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the directory if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Configuration`] if the directory cannot be
    /// created or the path exists but is not a directory.
    pub fn ensure(&self) -> SyncResult<()> {
        fs::create_dir_all(&self.path).map_err(|source| SyncError::Configuration {
            path: self.path.clone(),
            source,
        })?;

        if !self.path.is_dir() {
            return Err(SyncError::Configuration {
                path: self.path.clone(),
                source: io::Error::other("path is not a directory"),
            });
        }

        Ok(())
    }

    /// Lists the books present in the library.
    ///
    /// Entries whose name does not decode as a book file, and entries that
    /// are not regular files, are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::DirectoryUnreadable`] if the directory cannot be
    /// listed.
    pub fn scan(&self) -> SyncResult<BTreeSet<BookId>> {
        let unreadable = |source| SyncError::DirectoryUnreadable {
            path: self.path.clone(),
            source,
        };

        let mut books = BTreeSet::new();
        for entry in fs::read_dir(&self.path).map_err(unreadable)? {
            let entry = entry.map_err(unreadable)?;
            let name = entry.file_name();

            let Some(id) = name.to_str().and_then(BookId::from_file_name) else {
                trace!(entry = ?name, "skipping non-book entry");
                continue;
            };

            if !entry.path().is_file() {
                trace!(entry = ?name, "skipping non-file entry");
                continue;
            }

            books.insert(id);
        }

        Ok(books)
    }

    /// Returns true if the book is present in the library.
    #[must_use]
    pub fn contains(&self, id: &BookId) -> bool {
        self.book_path(id).is_file()
    }

    /// Returns the final path of a book.
    #[must_use]
    pub fn book_path(&self, id: &BookId) -> PathBuf {
        self.path.join(id.file_name())
    }

    /// Returns the temporary path a book is downloaded to.
    #[must_use]
    pub fn partial_path(&self, id: &BookId) -> PathBuf {
        self.path
            .join(format!(".{}.{}", id.file_name(), PARTIAL_SUFFIX))
    }

    /// Moves a completed download into place.
    ///
    /// Uses write-then-rename: the caller has already written and synced the
    /// partial file; this renames it over the final name and syncs the
    /// directory so the rename is durable.
    pub fn publish(&self, id: &BookId) -> SyncResult<PathBuf> {
        let partial = self.partial_path(id);
        let target = self.book_path(id);

        fs::rename(&partial, &target).map_err(|source| SyncError::LocalWrite {
            path: target.clone(),
            source,
        })?;

        self.sync_directory().map_err(|source| SyncError::LocalWrite {
            path: self.path.clone(),
            source,
        })?;

        Ok(target)
    }

    /// Removes a leftover partial download, if any.
    pub fn discard_partial(&self, id: &BookId) {
        let partial = self.partial_path(id);
        match fs::remove_file(&partial) {
            Ok(()) => trace!(path = %partial.display(), "removed partial download"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => trace!(path = %partial.display(), error = %e, "cannot remove partial download"),
        }
    }

    /// Syncs the library directory so renames survive a power loss.
    #[cfg(unix)]
    fn sync_directory(&self) -> io::Result<()> {
        File::open(&self.path)?.sync_all()
    }

    #[cfg(not(unix))]
    fn sync_directory(&self) -> io::Result<()> {
        // NTFS journals metadata; directories cannot be opened for sync.
        Ok(())
    }
}
