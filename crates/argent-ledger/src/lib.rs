//! Identity and ledger-integrity engine for Argent.
//!
//! This crate provides:
//! - Canonical transaction projection and content hashing
//! - Builders for the four transaction kinds
//! - A staged verification pipeline (preconditions, hash, signature)
//! - `LedgerChain`: one hash-chained ledger per identity and currency
//! - `LedgerService`: account bootstrap and per-ledger serialized appends
//! - Offline audit of stored ledgers

pub mod audit;
pub mod builder;
pub mod canonical;
pub mod chain;
pub mod config;
pub mod error;
pub mod service;
pub mod verifier;

#[cfg(test)]
mod test_support;

pub use audit::{AuditReport, StreamValidator, Violation, ViolationKind};
pub use canonical::Canonicalizer;
pub use chain::{Appended, ChainState, LedgerChain};
pub use config::LedgerConfig;
pub use error::{LedgerError, ValidationError};
pub use service::LedgerService;
pub use verifier::{
    now_nanos, KeyDirectory, TransactionVerifier, VerifierStage, VerifyContext,
};
