use argent_types::Transaction;

use crate::canonical::Canonicalizer;
use crate::error::LedgerError;
use crate::verifier::stage::{VerifierStage, VerifyContext};

/// The stored hash must equal the recomputed canonical hash.
pub struct AuthenticityStage;

impl VerifierStage for AuthenticityStage {
    fn name(&self) -> &'static str {
        "authenticity"
    }

    fn check(&self, tx: &Transaction, _context: &VerifyContext<'_>) -> Result<(), LedgerError> {
        Ok(Canonicalizer::check(tx)?)
    }
}
