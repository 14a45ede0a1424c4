use std::sync::Arc;

use argent_types::{Account, Address, LedgerRecord, Transaction};

use crate::error::StoreResult;

/// Flat key-value storage of encoded records.
///
/// Keys are `/`-separated relative paths such as `accounts/<address>.json.zst`.
/// Implementations must make `put` atomic: a reader sees either the old
/// bytes or the new bytes, never a partial write.
pub trait BlobStore: Send + Sync {
    /// Returns `Ok(None)` if the key does not exist.
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Write or replace the value at `key`.
    fn put(&self, key: &str, bytes: &[u8]) -> StoreResult<()>;

    fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Persistence of accounts and ledgers.
pub trait LedgerStore: Send + Sync {
    fn load_account(&self, address: &Address) -> StoreResult<Option<Account>>;

    fn save_account(&self, account: &Account) -> StoreResult<()>;

    /// Load the ledger of `owner` in `ticker`, if one was ever saved.
    fn load_ledger(&self, owner: &Address, ticker: &str) -> StoreResult<Option<LedgerRecord>>;

    /// Persist a ledger. An empty ledger is never written.
    fn save_ledger(&self, ledger: &LedgerRecord) -> StoreResult<()>;

    /// Find any persisted transaction by its hash, across all ledgers.
    fn find_transaction(&self, hash: &str) -> StoreResult<Option<Transaction>>;
}

impl<T: LedgerStore + ?Sized> LedgerStore for Arc<T> {
    fn load_account(&self, address: &Address) -> StoreResult<Option<Account>> {
        (**self).load_account(address)
    }

    fn save_account(&self, account: &Account) -> StoreResult<()> {
        (**self).save_account(account)
    }

    fn load_ledger(&self, owner: &Address, ticker: &str) -> StoreResult<Option<LedgerRecord>> {
        (**self).load_ledger(owner, ticker)
    }

    fn save_ledger(&self, ledger: &LedgerRecord) -> StoreResult<()> {
        (**self).save_ledger(ledger)
    }

    fn find_transaction(&self, hash: &str) -> StoreResult<Option<Transaction>> {
        (**self).find_transaction(hash)
    }
}
