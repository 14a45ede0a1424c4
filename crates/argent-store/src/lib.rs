//! Persistence for Argent accounts and ledgers.
//!
//! Every record is JSON compressed with zstd and stored under a key in a
//! [`BlobStore`]. Ledgers are split into fixed-capacity pages ([`Shelf`])
//! with a small index on top; a locator per transaction makes cross-ledger
//! lookup by hash possible.
//!
//! # Storage Backends
//!
//! - [`InMemoryBlobStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsBlobStore`] -- one file per key under an explicit root, atomic writes
//!
//! All I/O errors are propagated as [`StoreError`], never ignored.

pub mod codec;
pub mod config;
pub mod error;
pub mod fs;
pub mod ledger_store;
pub mod memory;
pub mod shelf;
pub mod traits;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use fs::FsBlobStore;
pub use ledger_store::{BlobLedgerStore, LedgerIndex, TxLocator};
pub use memory::InMemoryBlobStore;
pub use shelf::{Page, Shelf};
pub use traits::{BlobStore, LedgerStore};
