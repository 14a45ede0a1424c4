//! Multi-ledger front end: account bootstrap and serialized appends.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use tracing::{debug, info, warn};

use argent_crypto::AddressCodec;
use argent_store::LedgerStore;
use argent_types::{Account, Address, Currency, LedgerRecord, Scheme, SchemeError, Signature, Transaction, TxBody};

use crate::audit::{AuditReport, StreamValidator};
use crate::chain::{Appended, LedgerChain};
use crate::config::LedgerConfig;
use crate::error::{LedgerError, ValidationError};
use crate::verifier::{now_nanos, TransactionVerifier};

type LedgerKey = (Address, String);

/// Owns the store and serializes work per ledger.
///
/// Appends and signature updates on the same (owner, ticker) pair run one at
/// a time under a dedicated lock held across verify, append and persist.
/// Distinct ledgers proceed in parallel.
pub struct LedgerService<S: LedgerStore> {
    store: S,
    config: LedgerConfig,
    verifier: Arc<TransactionVerifier>,
    locks: Mutex<HashMap<LedgerKey, Weak<Mutex<()>>>>,
}

impl<S: LedgerStore> LedgerService<S> {
    pub fn new(store: S, config: LedgerConfig) -> Self {
        Self {
            store,
            config,
            verifier: Arc::new(TransactionVerifier::standard()),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_verifier(mut self, verifier: TransactionVerifier) -> Self {
        self.verifier = Arc::new(verifier);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// The lock for one ledger. Entries are weak; dead ones are pruned
    /// whenever a new lock is created.
    fn lock_for(&self, owner: &Address, ticker: &str) -> Result<Arc<Mutex<()>>, LedgerError> {
        let mut locks = self.locks.lock().map_err(|_| LedgerError::LockPoisoned)?;
        let key = (owner.clone(), ticker.to_string());
        if let Some(lock) = locks.get(&key).and_then(Weak::upgrade) {
            return Ok(lock);
        }
        locks.retain(|_, lock| lock.strong_count() > 0);
        let lock = Arc::new(Mutex::new(()));
        locks.insert(key, Arc::downgrade(&lock));
        Ok(lock)
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.locks.lock().map(|locks| locks.len()).unwrap_or(0)
    }

    fn chain(&self, record: LedgerRecord) -> LedgerChain<'_, S> {
        LedgerChain::new(&self.store, record)
            .with_config(self.config.clone())
            .with_verifier(Arc::clone(&self.verifier))
    }

    /// Open the account for `address`, creating it on first use.
    ///
    /// The key must derive to the address and both scheme classifications
    /// must agree with `scheme`. An existing account with a different key
    /// is refused.
    pub fn open_account(
        &self,
        address: &Address,
        public_key: &[u8],
        scheme: Scheme,
    ) -> Result<Account, LedgerError> {
        if !AddressCodec::validate(address) {
            return Err(ValidationError::MalformedAddress {
                field: "account",
                address: address.to_string(),
            }
            .into());
        }
        let resolved = AddressCodec::resolve_scheme(address, public_key)?;
        if resolved != scheme {
            return Err(SchemeError::Unexpected {
                expected: resolved,
                found: scheme,
            }
            .into());
        }
        if !AddressCodec::matches_public_key(address, public_key) {
            return Err(ValidationError::KeyBindingMismatch(address.to_string()).into());
        }

        if let Some(existing) = self.store.load_account(address)? {
            if existing.public_key != public_key || existing.scheme != scheme {
                return Err(ValidationError::KeyBindingMismatch(address.to_string()).into());
            }
            debug!(address = %address.short(), "account loaded");
            return Ok(existing);
        }

        let account = Account::new(address.clone(), scheme, public_key.to_vec());
        self.store.save_account(&account)?;
        info!(address = %address.short(), %scheme, "account opened");
        Ok(account)
    }

    pub fn account(&self, address: &Address) -> Result<Option<Account>, LedgerError> {
        Ok(self.store.load_account(address)?)
    }

    /// The persisted ledger, or an empty chain if none exists yet.
    pub fn open_ledger(
        &self,
        owner: &Address,
        currency: &Currency,
    ) -> Result<LedgerChain<'_, S>, LedgerError> {
        let chain = LedgerChain::open(&self.store, owner, currency)?;
        Ok(chain
            .with_config(self.config.clone())
            .with_verifier(Arc::clone(&self.verifier)))
    }

    pub fn ledger(&self, owner: &Address, ticker: &str) -> Result<Option<LedgerRecord>, LedgerError> {
        Ok(self.store.load_ledger(owner, ticker)?)
    }

    /// Append `tx` to the ledger of `owner` in `ticker`.
    pub fn append(
        &self,
        owner: &Address,
        ticker: &str,
        tx: Transaction,
    ) -> Result<Appended, LedgerError> {
        self.append_at(owner, ticker, tx, now_nanos())
    }

    pub fn append_at(
        &self,
        owner: &Address,
        ticker: &str,
        tx: Transaction,
        now: i64,
    ) -> Result<Appended, LedgerError> {
        let lock = self.lock_for(owner, ticker)?;
        let _guard = lock.lock().map_err(|_| LedgerError::LockPoisoned)?;

        let mut account = self
            .store
            .load_account(owner)?
            .ok_or_else(|| ValidationError::UnknownAccount(owner.to_string()))?;

        let record = match self.store.load_ledger(owner, ticker)? {
            Some(record) => record,
            None => {
                let currency = match &tx.body {
                    TxBody::Create { currency, .. } => currency.clone(),
                    _ => return Err(ValidationError::GenesisRequired(tx.kind()).into()),
                };
                if currency.ticker != ticker {
                    return Err(ValidationError::CurrencyMismatch {
                        expected: ticker.to_string(),
                        found: currency.ticker,
                    }
                    .into());
                }
                LedgerRecord::empty(owner.clone(), currency)
            }
        };

        let mut chain = self.chain(record);
        let appended = chain.append_at(tx, now)?;

        // The transaction is committed; a failed registration is retried on
        // the next append to this ledger.
        if account.add_currency(ticker) {
            match self.store.save_account(&account) {
                Ok(()) => debug!(address = %owner.short(), ticker, "ledger registered on account"),
                Err(err) => warn!(
                    address = %owner.short(),
                    ticker,
                    error = %err,
                    "ledger registration on account failed"
                ),
            }
        }
        Ok(appended)
    }

    /// Append a token Create as the genesis of its holder's token ledger.
    pub fn mint(&self, tx: Transaction) -> Result<Appended, LedgerError> {
        let (holder, ticker) = match &tx.body {
            TxBody::Create {
                currency, origin, ..
            } if !currency.is_native() => (origin.clone(), currency.ticker.clone()),
            _ => return Err(ValidationError::NotTokenCreate.into()),
        };
        self.append(&holder, &ticker, tx)
    }

    /// Verify and store the owner's signature over the ledger's rolling hash.
    pub fn update_signature(
        &self,
        owner: &Address,
        ticker: &str,
        signature: Signature,
        scheme: Scheme,
    ) -> Result<(), LedgerError> {
        let lock = self.lock_for(owner, ticker)?;
        let _guard = lock.lock().map_err(|_| LedgerError::LockPoisoned)?;

        let record = self
            .store
            .load_ledger(owner, ticker)?
            .ok_or(ValidationError::EmptyLedger)?;
        self.chain(record).update_signature(signature, scheme)
    }

    /// Look a transaction up by hash in any ledger.
    pub fn find_transaction(&self, hash: &str) -> Result<Option<Transaction>, LedgerError> {
        Ok(self.store.find_transaction(hash)?)
    }

    /// Full re-validation of a persisted ledger, signatures included.
    pub fn audit(&self, owner: &Address, ticker: &str) -> Result<AuditReport, LedgerError> {
        let record = self
            .store
            .load_ledger(owner, ticker)?
            .ok_or(ValidationError::EmptyLedger)?;
        StreamValidator::validate_signed(&record, &self.store)
    }
}
