use argent_store::LedgerStore;
use argent_types::{Account, Address, Transaction};

use crate::error::LedgerError;

/// Source of account records for signer lookup.
pub trait KeyDirectory {
    fn account(&self, address: &Address) -> Result<Option<Account>, LedgerError>;
}

impl<S: LedgerStore + ?Sized> KeyDirectory for S {
    fn account(&self, address: &Address) -> Result<Option<Account>, LedgerError> {
        Ok(self.load_account(address)?)
    }
}

/// Inputs shared by every stage of one verification.
pub struct VerifyContext<'a> {
    /// Unix time in nanoseconds used for expiry checks.
    pub now: i64,
    pub keys: &'a dyn KeyDirectory,
}

/// One check in the verification pipeline.
///
/// Stages are pure: they never mutate the transaction or any ledger.
pub trait VerifierStage: Send + Sync {
    fn name(&self) -> &'static str;

    fn check(&self, tx: &Transaction, context: &VerifyContext<'_>) -> Result<(), LedgerError>;
}
