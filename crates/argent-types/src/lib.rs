//! Foundation types for the Argent ledger.
//!
//! This crate provides the data model shared by every other Argent crate.
//! It performs no cryptography: addresses are carried here as opaque text and
//! validated by `argent-crypto`.
//!
//! # Key Types
//!
//! - [`Scheme`] -- Signature scheme (classical EC or post-quantum)
//! - [`Address`] -- Checksummed textual identity
//! - [`Currency`] -- Native currency or a user-minted token
//! - [`Transaction`] -- Tagged Create/Send/Claim/Trust transaction
//! - [`Account`] -- Identity record with its public key and ledgers
//! - [`LedgerRecord`] -- Persisted hash-chained ledger for one (identity, currency)

pub mod account;
pub mod address;
pub mod currency;
pub mod error;
pub mod ledger;
pub mod scheme;
pub mod transaction;

pub use account::Account;
pub use address::Address;
pub use currency::Currency;
pub use error::{SchemeError, TypeError};
pub use ledger::LedgerRecord;
pub use scheme::{Scheme, Signature};
pub use transaction::{Transaction, TxBody, TxKind};
