//! Test fixtures and library helpers.
//!
//! Provides convenience functions for setting up library directories
//! and common test scenarios.

use kosync_engine::{Library, SyncCredentials};
use kosync_protocol::BookId;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Placeholder EPUB content: a zip local-file header followed by the id.
pub fn sample_epub(id: &BookId) -> Vec<u8> {
    let mut bytes = b"PK\x03\x04mimetypeapplication/epub+zip".to_vec();
    bytes.extend_from_slice(id.to_string().as_bytes());
    bytes
}

/// A library directory with automatic cleanup.
pub struct TestLibrary {
    /// The temporary directory (kept alive to prevent cleanup).
    dir: TempDir,
}

impl TestLibrary {
    /// Creates an empty library.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Creates a library already holding `count` books.
    pub fn with_books(count: usize) -> (Self, Vec<BookId>) {
        let library = Self::new();
        let ids = (0..count)
            .map(|_| {
                let id = BookId::new();
                library.add_book(id, sample_epub(&id));
                id
            })
            .collect();
        (library, ids)
    }

    /// Returns the library directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Returns an engine-side handle on the directory.
    pub fn library(&self) -> Library {
        Library::new(self.path())
    }

    /// Returns credentials pointing at this directory.
    pub fn credentials(&self, endpoint: &str, token: &str) -> SyncCredentials {
        SyncCredentials::new(endpoint, token, self.path())
    }

    /// Stores a book under its canonical file name.
    pub fn add_book(&self, id: BookId, content: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path().join(id.file_name());
        fs::write(&path, content).expect("Failed to write book");
        path
    }

    /// Stores an arbitrary file, e.g. a stray that must be ignored.
    pub fn add_file(&self, name: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path().join(name);
        fs::write(&path, content).expect("Failed to write file");
        path
    }

    /// Reads a book back.
    pub fn read_book(&self, id: &BookId) -> Option<Vec<u8>> {
        fs::read(self.path().join(id.file_name())).ok()
    }

    /// Returns every entry name in the directory, sorted.
    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.path())
            .expect("Failed to list library")
            .map(|entry| {
                entry
                    .expect("Failed to read entry")
                    .file_name()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        names.sort();
        names
    }
}

impl Default for TestLibrary {
    fn default() -> Self {
        Self::new()
    }
}
