//! # KoSync Testkit
//!
//! Test utilities for the KoSync client.
//!
//! This crate provides:
//! - Temporary library directories with book fixtures
//! - `MemoryCatalog`, an in-process sync server speaking the wire protocol
//! - `SyncHarness`, wiring a library, a catalog and an engine together
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kosync_testkit::prelude::*;
//!
//! #[test]
//! fn downloads_missing_books() {
//!     let harness = SyncHarness::new();
//!     harness.catalog.add_book(BookId::new(), b"epub".to_vec());
//!     assert_eq!(harness.run().unwrap().downloaded, 1);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod catalog;
pub mod fixtures;
pub mod generators;
pub mod harness;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::catalog::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::harness::*;
    pub use kosync_protocol::BookId;
}

pub use catalog::*;
pub use fixtures::*;
pub use generators::*;
pub use harness::*;
