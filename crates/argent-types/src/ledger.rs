use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::currency::Currency;
use crate::scheme::Signature;
use crate::transaction::Transaction;

/// Persisted shape of one (identity, currency) ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub owner: Address,
    pub currency: Currency,
    /// Rolling hash over every transaction hash, base64.
    pub hash: String,
    pub transactions: Vec<Transaction>,
    /// Owner's signature over `hash`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
}

impl LedgerRecord {
    /// A ledger with no transactions. Never persisted in this state.
    pub fn empty(owner: Address, currency: Currency) -> Self {
        Self {
            owner,
            currency,
            hash: String::new(),
            transactions: Vec::new(),
            signature: None,
        }
    }

    pub fn ticker(&self) -> &str {
        &self.currency.ticker
    }

    pub fn genesis(&self) -> Option<&Transaction> {
        self.transactions.first()
    }

    pub fn head(&self) -> Option<&Transaction> {
        self.transactions.last()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::TxBody;

    #[test]
    fn empty_record_has_no_head() {
        let rec = LedgerRecord::empty(Address::new("o"), Currency::native());
        assert!(rec.is_empty());
        assert!(rec.head().is_none());
        assert_eq!(rec.ticker(), "ART");
    }

    #[test]
    fn genesis_and_head() {
        let mut rec = LedgerRecord::empty(Address::new("o"), Currency::native());
        let mut create = Transaction::new(
            TxBody::Create {
                balance: 0,
                currency: Currency::native(),
                origin: Address::new("o"),
            },
            None,
        );
        create.hash = "2aa".into();
        rec.transactions.push(create);
        assert_eq!(rec.genesis().map(|t| t.hash.as_str()), Some("2aa"));
        assert_eq!(rec.head().map(|t| t.hash.as_str()), Some("2aa"));
        assert_eq!(rec.len(), 1);
    }
}
