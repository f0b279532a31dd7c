//! End-to-end sync harness.
//!
//! Wires a temporary library, a [`MemoryCatalog`] and a [`SyncEngine`]
//! together so tests can describe a device and a server and run the
//! whole pipeline against them.

use crate::catalog::{CatalogTransport, MemoryCatalog, CATALOG_TOKEN};
use crate::fixtures::{sample_epub, TestLibrary};
use kosync_engine::{DownloadPolicy, SyncConfig, SyncEngine, SyncReport, SyncResult};
use kosync_protocol::BookId;
use std::sync::Arc;

/// A device library paired with a catalog server.
pub struct SyncHarness {
    /// The device side.
    pub library: TestLibrary,
    /// The server side.
    pub catalog: Arc<MemoryCatalog>,
    token: String,
}

impl SyncHarness {
    /// Creates an empty library and an empty catalog.
    pub fn new() -> Self {
        Self::with_catalog(MemoryCatalog::new())
    }

    /// Creates an empty library paired with `catalog`.
    pub fn with_catalog(catalog: MemoryCatalog) -> Self {
        Self {
            library: TestLibrary::new(),
            catalog: Arc::new(catalog),
            token: CATALOG_TOKEN.to_string(),
        }
    }

    /// Presents `token` instead of the one the catalog accepts.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Adds a book to the catalog only and returns its id.
    pub fn publish_book(&self) -> BookId {
        let id = BookId::new();
        self.catalog.add_book(id, sample_epub(&id));
        id
    }

    /// Adds a book to both the catalog and the library and returns its id.
    pub fn shared_book(&self) -> BookId {
        let id = self.publish_book();
        self.library.add_book(id, sample_epub(&id));
        id
    }

    /// Returns the engine configuration for this pair.
    pub fn config(&self) -> SyncConfig {
        SyncConfig::new(self.library.credentials(self.catalog.base_url(), &self.token))
    }

    /// Builds a fail-fast engine.
    pub fn engine(&self) -> SyncEngine<CatalogTransport> {
        self.engine_with(DownloadPolicy::FailFast)
    }

    /// Builds an engine with the given download policy.
    pub fn engine_with(&self, policy: DownloadPolicy) -> SyncEngine<CatalogTransport> {
        let config = self.config().with_policy(policy);
        SyncEngine::new(config, self.catalog.transport(&self.token))
    }

    /// Runs one fail-fast sync.
    pub fn run(&self) -> SyncResult<SyncReport> {
        self.engine().run()
    }

    /// Asserts every catalog book is present locally with catalog content.
    pub fn assert_converged(&self, ids: &[BookId]) {
        for id in ids {
            assert_eq!(
                self.library.read_book(id),
                Some(sample_epub(id)),
                "book {id} missing or corrupt"
            );
        }
    }
}

impl Default for SyncHarness {
    fn default() -> Self {
        Self::new()
    }
}
