//! Offline re-validation of a whole ledger record.
//!
//! Appends are checked one at a time as they arrive; the audit walks a
//! stored record end to end and reports every problem it finds instead of
//! stopping at the first.

use std::collections::HashSet;

use argent_crypto::{ChainError, HashLinked, LinkVerifier, RollingHash, SignatureProvider};
use argent_types::{Address, LedgerRecord, Transaction, TxBody, TxKind};

use crate::canonical::Canonicalizer;
use crate::error::LedgerError;
use crate::verifier::{KeyDirectory, SignatureStage, VerifierStage, VerifyContext};

/// Outcome of auditing one ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditReport {
    pub owner: Address,
    pub ticker: String,
    pub transaction_count: usize,
    pub genesis_valid: bool,
    pub links_valid: bool,
    pub hashes_valid: bool,
    pub owner_consistent: bool,
    pub rolling_hash_valid: bool,
    /// `None` when signatures were not checked.
    pub signatures_valid: Option<bool>,
    pub violations: Vec<Violation>,
}

impl AuditReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific integrity violation found during the audit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    /// Position in the ledger; `None` for ledger-level findings.
    pub index: Option<usize>,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    MissingGenesis,
    BrokenLink,
    HashMismatch,
    WrongOwner,
    CurrencyMismatch,
    DuplicateClaim,
    RollingHashMismatch,
    BadSignature,
    BadLedgerSignature,
}

struct Linked<'a>(&'a Transaction);

impl HashLinked for Linked<'_> {
    fn own_hash(&self) -> &str {
        &self.0.hash
    }

    fn previous(&self) -> Option<&str> {
        self.0.previous_hash.as_deref()
    }
}

/// Ledger integrity auditor.
pub struct StreamValidator;

impl StreamValidator {
    /// Structural audit: genesis, links, canonical hashes, ownership,
    /// currency and the rolling hash.
    pub fn validate(record: &LedgerRecord) -> AuditReport {
        let mut violations = Vec::new();
        let owner = record.owner.as_str();

        let mut genesis_valid = true;
        match record.genesis() {
            Some(first) if first.kind() == TxKind::Create => {}
            Some(first) => {
                genesis_valid = false;
                violations.push(Violation {
                    index: Some(0),
                    kind: ViolationKind::MissingGenesis,
                    description: format!("ledger starts with a {} transaction", first.kind()),
                });
            }
            None => {}
        }

        let linked: Vec<Linked<'_>> = record.transactions.iter().map(Linked).collect();
        let links_valid = match LinkVerifier::verify_links(&linked) {
            Ok(()) => true,
            Err(err) => {
                let index = match err {
                    ChainError::GenesisHasPrevious => 0,
                    ChainError::BrokenLink { index } | ChainError::MissingPrevious { index } => {
                        index
                    }
                };
                violations.push(Violation {
                    index: Some(index),
                    kind: ViolationKind::BrokenLink,
                    description: err.to_string(),
                });
                false
            }
        };

        let mut hashes_valid = true;
        let mut owner_consistent = true;
        let mut claimed = HashSet::new();
        for (index, tx) in record.transactions.iter().enumerate() {
            if let Err(err) = Canonicalizer::check(tx) {
                hashes_valid = false;
                violations.push(Violation {
                    index: Some(index),
                    kind: ViolationKind::HashMismatch,
                    description: err.to_string(),
                });
            }

            if tx.chain_identity() != owner {
                owner_consistent = false;
                violations.push(Violation {
                    index: Some(index),
                    kind: ViolationKind::WrongOwner,
                    description: format!("belongs to {}", tx.chain_identity()),
                });
            }

            if let Some(currency) = tx.currency() {
                if *currency != record.currency {
                    violations.push(Violation {
                        index: Some(index),
                        kind: ViolationKind::CurrencyMismatch,
                        description: format!(
                            "currency {} in a {} ledger",
                            currency.ticker, record.currency.ticker
                        ),
                    });
                }
            }

            if let TxBody::Claim { origin, .. } = &tx.body {
                if !claimed.insert(origin.as_str()) {
                    violations.push(Violation {
                        index: Some(index),
                        kind: ViolationKind::DuplicateClaim,
                        description: format!("{origin} claimed more than once"),
                    });
                }
            }
        }

        let rolling_hash_valid = if record.is_empty() {
            true
        } else {
            RollingHash::matches(record.transactions.iter().map(|t| t.hash.as_str()), &record.hash)
        };
        if !rolling_hash_valid {
            violations.push(Violation {
                index: None,
                kind: ViolationKind::RollingHashMismatch,
                description: "stored rolling hash does not match transactions".into(),
            });
        }

        AuditReport {
            owner: record.owner.clone(),
            ticker: record.ticker().to_string(),
            transaction_count: record.len(),
            genesis_valid,
            links_valid,
            hashes_valid,
            owner_consistent,
            rolling_hash_valid,
            signatures_valid: None,
            violations,
        }
    }

    /// [`Self::validate`] plus every transaction signature and the
    /// aggregate ledger signature, if one is stored.
    ///
    /// Trust expirations are not re-checked: a grant that was live when it
    /// was appended stays valid history.
    pub fn validate_signed(
        record: &LedgerRecord,
        keys: &dyn KeyDirectory,
    ) -> Result<AuditReport, LedgerError> {
        let mut report = Self::validate(record);
        let context = VerifyContext { now: 0, keys };
        let mut signatures_valid = true;

        for (index, tx) in record.transactions.iter().enumerate() {
            match SignatureStage.check(tx, &context) {
                Ok(()) => {}
                Err(err @ LedgerError::Persistence(_)) => return Err(err),
                Err(err) => {
                    signatures_valid = false;
                    report.violations.push(Violation {
                        index: Some(index),
                        kind: ViolationKind::BadSignature,
                        description: err.to_string(),
                    });
                }
            }
        }

        if let Some(signature) = &record.signature {
            let verdict = match keys.account(&record.owner)? {
                Some(account) => SignatureProvider::verify(
                    signature,
                    record.hash.as_bytes(),
                    &account.public_key,
                    account.scheme,
                )
                .map_err(|e| e.to_string()),
                None => Err(format!("no account for {}", record.owner)),
            };
            if let Err(reason) = verdict {
                signatures_valid = false;
                report.violations.push(Violation {
                    index: None,
                    kind: ViolationKind::BadLedgerSignature,
                    description: reason,
                });
            }
        }

        report.signatures_valid = Some(signatures_valid);
        Ok(report)
    }
}
