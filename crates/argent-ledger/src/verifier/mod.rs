//! Transaction verification pipeline.
//!
//! Every transaction passes the same fail-fast sequence of stages before it
//! may join a ledger:
//!
//! 1. [`PreconditionStage`] -- kind-specific field rules
//! 2. [`AuthenticityStage`] -- stored hash equals canonical hash
//! 3. [`SignatureStage`] -- signer's key, scheme agreement, signature
//!
//! Verification has no side effects; a failure at any stage leaves every
//! ledger untouched.

pub mod stage;
pub mod stages;

use tracing::debug;

use argent_types::Transaction;

use crate::error::LedgerError;

pub use stage::{KeyDirectory, VerifierStage, VerifyContext};
pub use stages::{AuthenticityStage, PreconditionStage, SignatureStage};

/// Current Unix time in nanoseconds.
pub fn now_nanos() -> i64 {
    chrono::Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
}

/// An ordered pipeline of [`VerifierStage`]s.
pub struct TransactionVerifier {
    stages: Vec<Box<dyn VerifierStage>>,
}

impl TransactionVerifier {
    /// An empty pipeline that accepts everything.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Precondition -> Authenticity -> Signature.
    pub fn standard() -> Self {
        let mut verifier = Self::new();
        verifier.add_stage(Box::new(PreconditionStage));
        verifier.add_stage(Box::new(AuthenticityStage));
        verifier.add_stage(Box::new(SignatureStage));
        verifier
    }

    pub fn add_stage(&mut self, stage: Box<dyn VerifierStage>) {
        self.stages.push(stage);
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Verify against the current wall clock.
    pub fn verify(&self, tx: &Transaction, keys: &dyn KeyDirectory) -> Result<(), LedgerError> {
        self.verify_at(tx, keys, now_nanos())
    }

    /// Verify as of `now` (Unix nanoseconds).
    pub fn verify_at(
        &self,
        tx: &Transaction,
        keys: &dyn KeyDirectory,
        now: i64,
    ) -> Result<(), LedgerError> {
        let context = VerifyContext { now, keys };
        for stage in &self.stages {
            if let Err(err) = stage.check(tx, &context) {
                debug!(stage = stage.name(), hash = %tx.hash, error = %err, "verification failed");
                return Err(err);
            }
        }
        Ok(())
    }
}

impl Default for TransactionVerifier {
    fn default() -> Self {
        Self::standard()
    }
}
