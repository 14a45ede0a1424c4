//! A single hash-chained ledger: one identity, one currency.
//!
//! A chain starts Empty and becomes Populated once its genesis Create is
//! accepted; there is no terminal state. Every accepted append recomputes
//! the rolling hash and persists the whole record before the in-memory
//! state changes, so a persistence failure leaves the chain as it was.

use std::sync::Arc;

use tracing::{info, warn};

use argent_crypto::{AddressCodec, RollingHash, SignatureProvider};
use argent_store::LedgerStore;
use argent_types::{
    Address, Currency, LedgerRecord, Scheme, SchemeError, Signature, Transaction, TxBody, TxKind,
};

use crate::config::LedgerConfig;
use crate::error::{LedgerError, ValidationError};
use crate::verifier::{now_nanos, TransactionVerifier};

/// Lifecycle state of a chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainState {
    Empty,
    Populated,
}

/// Result of a successful append.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Appended {
    pub hash: String,
    pub rolling_hash: String,
    /// Number of transactions in the ledger after the append.
    pub height: usize,
}

pub struct LedgerChain<'s, S: LedgerStore> {
    store: &'s S,
    verifier: Arc<TransactionVerifier>,
    config: LedgerConfig,
    record: LedgerRecord,
}

impl<'s, S: LedgerStore> LedgerChain<'s, S> {
    /// Wrap an existing record. Use [`LedgerRecord::empty`] for a new ledger.
    pub fn new(store: &'s S, record: LedgerRecord) -> Self {
        Self {
            store,
            verifier: Arc::new(TransactionVerifier::standard()),
            config: LedgerConfig::default(),
            record,
        }
    }

    /// Load the persisted ledger, or start an empty one (nothing is written).
    pub fn open(store: &'s S, owner: &Address, currency: &Currency) -> Result<Self, LedgerError> {
        let record = match store.load_ledger(owner, &currency.ticker)? {
            Some(record) => {
                if record.currency != *currency {
                    return Err(ValidationError::CurrencyMismatch {
                        expected: record.currency.ticker.clone(),
                        found: currency.ticker.clone(),
                    }
                    .into());
                }
                record
            }
            None => LedgerRecord::empty(owner.clone(), currency.clone()),
        };
        Ok(Self::new(store, record))
    }

    pub fn with_config(mut self, config: LedgerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_verifier(mut self, verifier: Arc<TransactionVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn state(&self) -> ChainState {
        if self.record.is_empty() {
            ChainState::Empty
        } else {
            ChainState::Populated
        }
    }

    pub fn owner(&self) -> &Address {
        &self.record.owner
    }

    pub fn currency(&self) -> &Currency {
        &self.record.currency
    }

    pub fn record(&self) -> &LedgerRecord {
        &self.record
    }

    pub fn into_record(self) -> LedgerRecord {
        self.record
    }

    pub fn head(&self) -> Option<&Transaction> {
        self.record.head()
    }

    pub fn len(&self) -> usize {
        self.record.len()
    }

    pub fn is_empty(&self) -> bool {
        self.record.is_empty()
    }

    pub fn find_by_hash(&self, hash: &str) -> Option<&Transaction> {
        self.record.transactions.iter().find(|tx| tx.hash == hash)
    }

    /// The stored rolling hash; empty for an empty ledger.
    pub fn rolling_hash(&self) -> &str {
        &self.record.hash
    }

    /// Verify `tx` and add it to the ledger.
    pub fn append(&mut self, tx: Transaction) -> Result<Appended, LedgerError> {
        self.append_at(tx, now_nanos())
    }

    /// [`Self::append`] with an explicit clock (Unix nanoseconds).
    pub fn append_at(&mut self, tx: Transaction, now: i64) -> Result<Appended, LedgerError> {
        if let Err(err) = self.admit(&tx, now) {
            warn!(
                owner = %self.record.owner.short(),
                ticker = %self.record.currency.ticker,
                hash = %tx.hash,
                reason = %err,
                "append rejected"
            );
            return Err(err);
        }

        let mut staged = self.record.clone();
        staged.transactions.push(tx);
        staged.hash = RollingHash::compute(staged.transactions.iter().map(|t| t.hash.as_str()));
        // The aggregate signature covered the previous rolling hash.
        staged.signature = None;

        self.store.save_ledger(&staged)?;
        self.record = staged;

        let appended = Appended {
            hash: self.record.head().map(|t| t.hash.clone()).unwrap_or_default(),
            rolling_hash: self.record.hash.clone(),
            height: self.record.len(),
        };
        info!(
            owner = %self.record.owner.short(),
            ticker = %self.record.currency.ticker,
            hash = %appended.hash,
            height = appended.height,
            "transaction appended"
        );
        Ok(appended)
    }

    fn admit(&self, tx: &Transaction, now: i64) -> Result<(), LedgerError> {
        let owner = self.record.owner.as_str();
        match self.record.head() {
            None => {
                if tx.kind() != TxKind::Create {
                    return Err(ValidationError::GenesisRequired(tx.kind()).into());
                }
                if tx.origin() != owner {
                    return Err(ValidationError::WrongOwner {
                        expected: owner.to_string(),
                        found: tx.origin().to_string(),
                    }
                    .into());
                }
                self.check_currency(tx)?;
                self.verifier.verify_at(tx, self.store, now)?;
            }
            Some(head) => {
                if tx.kind() == TxKind::Create {
                    return Err(ValidationError::UnexpectedCreate.into());
                }
                if tx.chain_identity() != owner {
                    return Err(ValidationError::WrongOwner {
                        expected: owner.to_string(),
                        found: tx.chain_identity().to_string(),
                    }
                    .into());
                }
                if self.config.require_previous_link && tx.previous_hash_str() != head.hash {
                    return Err(ValidationError::BrokenLink {
                        expected: head.hash.clone(),
                        found: tx.previous_hash_str().to_string(),
                    }
                    .into());
                }
                self.check_currency(tx)?;
                self.verifier.verify_at(tx, self.store, now)?;
                if let TxBody::Claim { origin, .. } = &tx.body {
                    if self.config.require_claim_reference {
                        self.check_claim(origin)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn check_currency(&self, tx: &Transaction) -> Result<(), ValidationError> {
        match tx.currency() {
            Some(currency) if *currency != self.record.currency => {
                Err(ValidationError::CurrencyMismatch {
                    expected: self.record.currency.ticker.clone(),
                    found: currency.ticker.clone(),
                })
            }
            _ => Ok(()),
        }
    }

    /// A claim must name a stored Send to this owner in this currency that
    /// has not been claimed here before.
    fn check_claim(&self, send_hash: &str) -> Result<(), LedgerError> {
        let already = self.record.transactions.iter().any(|t| {
            matches!(&t.body, TxBody::Claim { origin, .. } if origin == send_hash)
        });
        if already {
            return Err(ValidationError::AlreadyClaimed(send_hash.to_string()).into());
        }

        let referenced = self
            .store
            .find_transaction(send_hash)?
            .ok_or_else(|| ValidationError::MissingClaimReference(send_hash.to_string()))?;
        let invalid = |reason: &str| ValidationError::InvalidClaimReference {
            hash: send_hash.to_string(),
            reason: reason.to_string(),
        };
        match &referenced.body {
            TxBody::Send {
                currency,
                destination,
                ..
            } => {
                if *destination != self.record.owner {
                    return Err(invalid("send is addressed to another identity").into());
                }
                if *currency != self.record.currency {
                    return Err(invalid("send is in another currency").into());
                }
                Ok(())
            }
            _ => Err(invalid("referenced transaction is not a send").into()),
        }
    }

    /// Attach the owner's signature over the current rolling hash.
    pub fn update_signature(
        &mut self,
        signature: Signature,
        scheme: Scheme,
    ) -> Result<(), LedgerError> {
        if self.record.is_empty() {
            return Err(ValidationError::EmptyLedger.into());
        }
        let account = self
            .store
            .load_account(&self.record.owner)?
            .ok_or_else(|| ValidationError::UnknownSigner(self.record.owner.to_string()))?;
        if account.address != self.record.owner
            || !AddressCodec::matches_public_key(&self.record.owner, &account.public_key)
        {
            return Err(ValidationError::KeyBindingMismatch(self.record.owner.to_string()).into());
        }
        if account.scheme != scheme {
            return Err(SchemeError::Unexpected {
                expected: account.scheme,
                found: scheme,
            }
            .into());
        }
        SignatureProvider::verify(
            &signature,
            self.record.hash.as_bytes(),
            &account.public_key,
            scheme,
        )?;

        let mut staged = self.record.clone();
        staged.signature = Some(signature);
        self.store.save_ledger(&staged)?;
        self.record = staged;
        info!(
            owner = %self.record.owner.short(),
            ticker = %self.record.currency.ticker,
            "ledger signature updated"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder;
    use crate::test_support::{keypair, register, store, MemoryStore};
    use argent_crypto::{ContentHasher, KeyPair};
    use argent_types::Account;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;

    fn genesis<'a>(store: &'a MemoryStore, kp: &KeyPair) -> LedgerChain<'a, MemoryStore> {
        let mut chain = LedgerChain::open(store, &kp.address(), &Currency::native()).unwrap();
        let tx = builder::sign_with(builder::create_native(&kp.address()).unwrap(), kp).unwrap();
        chain.append(tx).unwrap();
        chain
    }

    fn rejection(err: LedgerError) -> ValidationError {
        match err {
            LedgerError::Rejected(v) => v,
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn empty_chain_accepts_only_owned_create() {
        let store = store();
        let kp = keypair(1);
        register(&store, &kp);
        let mut chain = LedgerChain::open(&store, &kp.address(), &Currency::native()).unwrap();
        assert_eq!(chain.state(), ChainState::Empty);

        let send = builder::sign_with(
            builder::send(&kp.address(), "2x", &keypair(2).address(), 0, Currency::native()).unwrap(),
            &kp,
        )
        .unwrap();
        assert_eq!(
            rejection(chain.append(send).unwrap_err()),
            ValidationError::GenesisRequired(TxKind::Send)
        );

        let other = keypair(2);
        register(&store, &other);
        let foreign = builder::sign_with(builder::create_native(&other.address()).unwrap(), &other).unwrap();
        assert!(matches!(
            rejection(chain.append(foreign).unwrap_err()),
            ValidationError::WrongOwner { .. }
        ));
        assert_eq!(chain.state(), ChainState::Empty);
        assert_eq!(store.load_ledger(&kp.address(), "ART").unwrap(), None);
    }

    #[test]
    fn genesis_rolling_hash_is_double_sha_of_separator_and_hash() {
        let store = store();
        let kp = keypair(1);
        register(&store, &kp);
        let chain = genesis(&store, &kp);
        assert_eq!(chain.state(), ChainState::Populated);
        let head = chain.head().unwrap().hash.clone();
        let expected = RollingHash::compute([head.as_str()]);
        assert_eq!(chain.rolling_hash(), expected);
        let raw = ContentHasher::double_hash(format!(":{head}").as_bytes());
        assert_eq!(chain.rolling_hash(), STANDARD.encode(raw));
    }

    #[test]
    fn linked_send_is_accepted_and_moves_rolling_hash() {
        let store = store();
        let kp = keypair(1);
        register(&store, &kp);
        let mut chain = genesis(&store, &kp);
        let before = chain.rolling_hash().to_string();
        let head = chain.head().unwrap().hash.clone();

        let send = builder::sign_with(
            builder::send(&kp.address(), &head, &keypair(2).address(), 0, Currency::native()).unwrap(),
            &kp,
        )
        .unwrap();
        let appended = chain.append(send).unwrap();
        assert_eq!(appended.height, 2);
        assert_ne!(appended.rolling_hash, before);
        assert_eq!(store.load_ledger(&kp.address(), "ART").unwrap().unwrap(), *chain.record());
    }

    #[test]
    fn foreign_origin_is_rejected_even_if_validly_signed() {
        let store = store();
        let kp = keypair(1);
        let other = keypair(2);
        register(&store, &kp);
        register(&store, &other);
        let mut chain = genesis(&store, &kp);
        let head = chain.head().unwrap().hash.clone();
        let foreign = builder::sign_with(
            builder::send(&other.address(), &head, &kp.address(), 0, Currency::native()).unwrap(),
            &other,
        )
        .unwrap();
        assert!(matches!(
            rejection(chain.append(foreign).unwrap_err()),
            ValidationError::WrongOwner { .. }
        ));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn second_create_and_broken_link_are_rejected() {
        let store = store();
        let kp = keypair(1);
        register(&store, &kp);
        let mut chain = genesis(&store, &kp);
        let again = builder::sign_with(builder::create_native(&kp.address()).unwrap(), &kp).unwrap();
        assert_eq!(rejection(chain.append(again).unwrap_err()), ValidationError::UnexpectedCreate);

        let unlinked = builder::sign_with(
            builder::send(&kp.address(), "2deadbeef", &keypair(2).address(), 0, Currency::native()).unwrap(),
            &kp,
        )
        .unwrap();
        assert!(matches!(
            rejection(chain.append(unlinked).unwrap_err()),
            ValidationError::BrokenLink { .. }
        ));
    }

    #[test]
    fn stored_hash_mismatch_is_rejected_despite_valid_signature() {
        let store = store();
        let kp = keypair(1);
        register(&store, &kp);
        let mut chain = genesis(&store, &kp);
        let head = chain.head().unwrap().hash.clone();
        let mut send = builder::send(&kp.address(), &head, &keypair(2).address(), 0, Currency::native()).unwrap();
        let flipped = if send.hash.as_bytes()[1] == b'0' { "1" } else { "0" };
        send.hash.replace_range(1..2, flipped);
        let send = builder::sign_with(send, &kp).unwrap();
        assert!(matches!(
            rejection(chain.append(send).unwrap_err()),
            ValidationError::HashMismatch { .. }
        ));
    }

    #[test]
    fn claim_requires_matching_unclaimed_send() {
        let store = store();
        let alice = keypair(1);
        let bob = keypair(2);
        register(&store, &alice);
        register(&store, &bob);
        let mut alice_chain = genesis(&store, &alice);
        let mut bob_chain = genesis(&store, &bob);

        let head = alice_chain.head().unwrap().hash.clone();
        let send = builder::sign_with(
            builder::send(&alice.address(), &head, &bob.address(), 0, Currency::native()).unwrap(),
            &alice,
        )
        .unwrap();
        let send_hash = alice_chain.append(send).unwrap().hash;

        let missing = builder::sign_with(
            builder::claim(&bob.address(), &bob_chain.head().unwrap().hash, "0nothing").unwrap(),
            &bob,
        )
        .unwrap();
        assert_eq!(
            rejection(bob_chain.append(missing).unwrap_err()),
            ValidationError::MissingClaimReference("0nothing".into())
        );

        let claim = builder::sign_with(
            builder::claim(&bob.address(), &bob_chain.head().unwrap().hash, &send_hash).unwrap(),
            &bob,
        )
        .unwrap();
        bob_chain.append(claim).unwrap();

        let twice = builder::sign_with(
            builder::claim(&bob.address(), &bob_chain.head().unwrap().hash, &send_hash).unwrap(),
            &bob,
        )
        .unwrap();
        assert_eq!(
            rejection(bob_chain.append(twice).unwrap_err()),
            ValidationError::AlreadyClaimed(send_hash.clone())
        );

        // Alice cannot claim her own send to Bob.
        let stolen = builder::sign_with(
            builder::claim(&alice.address(), &alice_chain.head().unwrap().hash, &send_hash).unwrap(),
            &alice,
        )
        .unwrap();
        assert!(matches!(
            rejection(alice_chain.append(stolen).unwrap_err()),
            ValidationError::InvalidClaimReference { .. }
        ));
    }

    #[test]
    fn update_signature_over_rolling_hash() {
        let store = store();
        let kp = keypair(1);
        register(&store, &kp);
        let mut chain = genesis(&store, &kp);

        let wrong = SignatureProvider::sign(&kp, b"not the rolling hash").unwrap();
        assert_eq!(
            rejection(chain.update_signature(wrong, Scheme::Ec).unwrap_err()),
            ValidationError::SignatureMismatch
        );

        let sig = SignatureProvider::sign(&kp, chain.rolling_hash().as_bytes()).unwrap();
        assert!(matches!(
            chain.update_signature(sig.clone(), Scheme::PostQuantum).unwrap_err(),
            LedgerError::Scheme(_)
        ));
        chain.update_signature(sig.clone(), Scheme::Ec).unwrap();
        let stored = store.load_ledger(&kp.address(), "ART").unwrap().unwrap();
        assert_eq!(stored.signature, Some(sig));
    }

    #[test]
    fn update_signature_on_empty_ledger() {
        let store = store();
        let kp = keypair(1);
        let mut chain = LedgerChain::open(&store, &kp.address(), &Currency::native()).unwrap();
        let sig = SignatureProvider::sign(&kp, b"").unwrap();
        assert_eq!(
            rejection(chain.update_signature(sig, Scheme::Ec).unwrap_err()),
            ValidationError::EmptyLedger
        );
    }

    #[test]
    fn relaxed_config_skips_link_check() {
        let store = store();
        let kp = keypair(1);
        register(&store, &kp);
        let mut chain = genesis(&store, &kp).with_config(LedgerConfig::relaxed());
        let unlinked = builder::sign_with(
            builder::send(&kp.address(), "2deadbeef", &keypair(2).address(), 0, Currency::native()).unwrap(),
            &kp,
        )
        .unwrap();
        chain.append(unlinked).unwrap();
        assert_eq!(chain.len(), 2);
        assert!(chain.find_by_hash(&chain.head().unwrap().hash.clone()).is_some());
    }

    #[test]
    fn update_signature_refuses_a_rebound_account_key() {
        let store = store();
        let kp = keypair(1);
        let intruder = keypair(2);
        register(&store, &kp);
        let mut chain = genesis(&store, &kp);

        let forged = Account::new(kp.address(), Scheme::Ec, intruder.public_key().to_vec());
        store.save_account(&forged).unwrap();
        let sig = SignatureProvider::sign(&intruder, chain.rolling_hash().as_bytes()).unwrap();

        let err = chain.update_signature(sig, Scheme::Ec).unwrap_err();
        assert_eq!(
            rejection(err),
            ValidationError::KeyBindingMismatch(kp.address().to_string())
        );
        assert!(chain.record().signature.is_none());
    }
}
