//! Blob layout for accounts and paged ledgers.
//!
//! ```text
//! accounts/<address>.json.zst
//! ledgers/<address>/<hex(ticker)>/index.json.zst
//! ledgers/<address>/<hex(ticker)>/page-<n>.json.zst
//! tx/<hash>.json.zst
//! ```
//!
//! Ledgers are append-only: a save rewrites the index and the pages from the
//! first new transaction onward, never earlier pages. Pages and transaction
//! locators are written before the index, and the index write is the commit
//! point: readers only reach transactions the index counts.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use argent_types::{Account, Address, Currency, LedgerRecord, Signature, Transaction};

use crate::codec;
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::fs::FsBlobStore;
use crate::memory::InMemoryBlobStore;
use crate::shelf::{Page, Shelf};
use crate::traits::{BlobStore, LedgerStore};

/// Head record of a persisted ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerIndex {
    pub owner: Address,
    pub currency: Currency,
    /// Rolling hash at the time of the save.
    pub hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
    pub page_capacity: usize,
    pub transaction_count: usize,
}

impl LedgerIndex {
    pub fn page_count(&self) -> usize {
        self.transaction_count.div_ceil(self.page_capacity.max(1))
    }
}

/// Where a transaction lives: its ledger, page and slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxLocator {
    pub owner: Address,
    pub ticker: String,
    pub page: usize,
    pub slot: usize,
}

/// [`LedgerStore`] over any [`BlobStore`].
#[derive(Debug)]
pub struct BlobLedgerStore<B> {
    blobs: B,
    config: StoreConfig,
}

impl BlobLedgerStore<FsBlobStore> {
    /// Open (creating if needed) a filesystem store at `config.root`.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        std::fs::create_dir_all(&config.root)?;
        info!(root = %config.root.display(), "opened filesystem store");
        Ok(Self {
            blobs: FsBlobStore::new(config.root.clone()),
            config,
        })
    }
}

impl BlobLedgerStore<InMemoryBlobStore> {
    pub fn in_memory(page_capacity: usize) -> StoreResult<Self> {
        let config = StoreConfig::new("memory").with_page_capacity(page_capacity);
        Self::new(InMemoryBlobStore::new(), config)
    }
}

impl<B: BlobStore> BlobLedgerStore<B> {
    pub fn new(blobs: B, config: StoreConfig) -> StoreResult<Self> {
        config.validate()?;
        Ok(Self { blobs, config })
    }

    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The index of a persisted ledger, without loading its pages.
    pub fn load_index(&self, owner: &Address, ticker: &str) -> StoreResult<Option<LedgerIndex>> {
        self.read(&index_key(owner, ticker)?)
    }

    pub fn load_page(
        &self,
        owner: &Address,
        ticker: &str,
        number: usize,
    ) -> StoreResult<Option<Page>> {
        self.read(&page_key(owner, ticker, number)?)
    }

    fn read<T: serde::de::DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        match self.blobs.get(key)? {
            Some(bytes) => codec::decode(&bytes, key).map(Some),
            None => Ok(None),
        }
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<()> {
        let bytes = codec::encode(value, self.config.compression_level)?;
        self.blobs.put(key, &bytes)
    }
}

impl<B: BlobStore> LedgerStore for BlobLedgerStore<B> {
    fn load_account(&self, address: &Address) -> StoreResult<Option<Account>> {
        self.read(&account_key(address)?)
    }

    fn save_account(&self, account: &Account) -> StoreResult<()> {
        let key = account_key(&account.address)?;
        self.write(&key, account)?;
        debug!(address = %account.address.short(), "account saved");
        Ok(())
    }

    fn load_ledger(&self, owner: &Address, ticker: &str) -> StoreResult<Option<LedgerRecord>> {
        let key = index_key(owner, ticker)?;
        let Some(index) = self.read::<LedgerIndex>(&key)? else {
            return Ok(None);
        };
        if index.page_capacity == 0 {
            return Err(StoreError::Corrupt {
                key,
                reason: "index has zero page capacity".into(),
            });
        }
        if index.owner != *owner || index.currency.ticker != ticker {
            return Err(StoreError::Corrupt {
                key,
                reason: "index names a different ledger".into(),
            });
        }

        let mut transactions = Vec::with_capacity(index.transaction_count);
        for number in 0..index.page_count() {
            let page_key = page_key(owner, ticker, number)?;
            let page: Page = self.read(&page_key)?.ok_or_else(|| StoreError::Corrupt {
                key: page_key.clone(),
                reason: "page listed in index is missing".into(),
            })?;
            let expected = index
                .page_capacity
                .min(index.transaction_count - number * index.page_capacity);
            if page.number != number || page.transactions.len() < expected {
                return Err(StoreError::Corrupt {
                    key: page_key,
                    reason: format!(
                        "page {} holds {} transactions, expected {expected}",
                        page.number,
                        page.transactions.len()
                    ),
                });
            }
            transactions.extend(page.transactions.into_iter().take(expected));
        }

        Ok(Some(LedgerRecord {
            owner: index.owner,
            currency: index.currency,
            hash: index.hash,
            transactions,
            signature: index.signature,
        }))
    }

    fn save_ledger(&self, ledger: &LedgerRecord) -> StoreResult<()> {
        if ledger.is_empty() {
            return Err(StoreError::EmptyLedger {
                owner: ledger.owner.to_string(),
                ticker: ledger.ticker().to_string(),
            });
        }
        let owner = &ledger.owner;
        let ticker = ledger.ticker();

        let previous = self.load_index(owner, ticker)?;
        let capacity = previous
            .as_ref()
            .map_or(self.config.page_capacity, |i| i.page_capacity);
        let persisted = previous
            .as_ref()
            .map_or(0, |i| i.transaction_count)
            .min(ledger.len());

        let shelf = Shelf::from_transactions(capacity, ledger.transactions.iter().cloned());
        let (first_dirty, _) = shelf.position_of(persisted);
        for page in shelf.pages().iter().skip(first_dirty) {
            self.write(&page_key(owner, ticker, page.number)?, page)?;
        }

        for (index, tx) in ledger.transactions.iter().enumerate().skip(persisted) {
            let (page, slot) = shelf.position_of(index);
            let locator = TxLocator {
                owner: owner.clone(),
                ticker: ticker.to_string(),
                page,
                slot,
            };
            self.write(&tx_key(&tx.hash)?, &locator)?;
        }

        let index = LedgerIndex {
            owner: owner.clone(),
            currency: ledger.currency.clone(),
            hash: ledger.hash.clone(),
            signature: ledger.signature.clone(),
            page_capacity: capacity,
            transaction_count: ledger.len(),
        };
        self.write(&index_key(owner, ticker)?, &index)?;

        debug!(
            owner = %owner.short(),
            ticker,
            transactions = ledger.len(),
            pages_written = shelf.pages().len().saturating_sub(first_dirty),
            "ledger saved"
        );
        Ok(())
    }

    /// A locator only counts once the index that covers it is written; a
    /// locator left behind by a failed save resolves to `None`.
    fn find_transaction(&self, hash: &str) -> StoreResult<Option<Transaction>> {
        let key = match tx_key(hash) {
            Ok(key) => key,
            Err(StoreError::InvalidKey(_)) => return Ok(None),
            Err(err) => return Err(err),
        };
        let Some(locator) = self.read::<TxLocator>(&key)? else {
            return Ok(None);
        };
        let Some(index) = self.load_index(&locator.owner, &locator.ticker)? else {
            debug!(hash, "locator without a committed ledger");
            return Ok(None);
        };
        let position = locator
            .page
            .saturating_mul(index.page_capacity)
            .saturating_add(locator.slot);
        if locator.slot >= index.page_capacity || position >= index.transaction_count {
            debug!(hash, position, committed = index.transaction_count, "uncommitted locator");
            return Ok(None);
        }

        let page = self
            .load_page(&locator.owner, &locator.ticker, locator.page)?
            .ok_or_else(|| StoreError::Corrupt {
                key: key.clone(),
                reason: format!("locator points at missing page {}", locator.page),
            })?;
        match page.transactions.into_iter().nth(locator.slot) {
            Some(tx) if tx.hash == hash => Ok(Some(tx)),
            Some(_) => {
                debug!(hash, "stale locator from a failed save");
                Ok(None)
            }
            None => Err(StoreError::Corrupt {
                key,
                reason: format!(
                    "slot {} of page {} is past the end of the page",
                    locator.slot, locator.page
                ),
            }),
        }
    }
}

fn segment(text: &str) -> StoreResult<&str> {
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(StoreError::InvalidKey(text.to_string()));
    }
    Ok(text)
}

fn account_key(address: &Address) -> StoreResult<String> {
    Ok(format!("accounts/{}.json.zst", segment(address.as_str())?))
}

fn ledger_dir(owner: &Address, ticker: &str) -> StoreResult<String> {
    if ticker.is_empty() {
        return Err(StoreError::InvalidKey(ticker.to_string()));
    }
    Ok(format!(
        "ledgers/{}/{}",
        segment(owner.as_str())?,
        hex::encode(ticker)
    ))
}

fn index_key(owner: &Address, ticker: &str) -> StoreResult<String> {
    Ok(format!("{}/index.json.zst", ledger_dir(owner, ticker)?))
}

fn page_key(owner: &Address, ticker: &str, number: usize) -> StoreResult<String> {
    Ok(format!("{}/page-{number}.json.zst", ledger_dir(owner, ticker)?))
}

fn tx_key(hash: &str) -> StoreResult<String> {
    Ok(format!("tx/{}.json.zst", segment(hash)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use argent_types::{Scheme, TxBody};

    fn owner() -> Address {
        Address::new("666OWNER999")
    }

    fn ledger(n: usize) -> LedgerRecord {
        let mut record = LedgerRecord::empty(owner(), Currency::native());
        for i in 0..n {
            let mut tx = Transaction::new(
                TxBody::Send {
                    balance: i as u64,
                    currency: Currency::native(),
                    origin: owner(),
                    destination: Address::new("999OTHER666"),
                },
                None,
            );
            tx.hash = format!("0{i:08x}");
            record.transactions.push(tx);
        }
        record.hash = format!("rolling-{n}");
        record
    }

    #[test]
    fn account_roundtrip() {
        let store = BlobLedgerStore::in_memory(50).unwrap();
        let mut account = Account::new(owner(), Scheme::Ec, vec![1; 64]);
        account.add_currency("ART");
        store.save_account(&account).unwrap();
        assert_eq!(store.load_account(&owner()).unwrap(), Some(account));
        assert_eq!(store.load_account(&Address::new("666NONE999")).unwrap(), None);
    }

    #[test]
    fn ledger_roundtrip_across_pages() {
        let store = BlobLedgerStore::in_memory(3).unwrap();
        let record = ledger(7);
        store.save_ledger(&record).unwrap();
        let loaded = store.load_ledger(&owner(), "ART").unwrap().unwrap();
        assert_eq!(loaded, record);
        let index = store.load_index(&owner(), "ART").unwrap().unwrap();
        assert_eq!(index.page_count(), 3);
        assert!(store.blobs().exists("ledgers/666OWNER999/415254/page-2.json.zst").unwrap());
    }

    #[test]
    fn incremental_saves_keep_earlier_pages() {
        let store = BlobLedgerStore::in_memory(2).unwrap();
        store.save_ledger(&ledger(3)).unwrap();
        let before = store.blobs().get("ledgers/666OWNER999/415254/page-0.json.zst").unwrap();
        store.save_ledger(&ledger(5)).unwrap();
        let after = store.blobs().get("ledgers/666OWNER999/415254/page-0.json.zst").unwrap();
        assert_eq!(before, after);
        assert_eq!(store.load_ledger(&owner(), "ART").unwrap().unwrap(), ledger(5));
    }

    #[test]
    fn find_transaction_across_pages() {
        let store = BlobLedgerStore::in_memory(2).unwrap();
        store.save_ledger(&ledger(5)).unwrap();
        let tx = store.find_transaction("000000003").unwrap().unwrap();
        assert_eq!(tx.balance(), Some(3));
        assert_eq!(store.find_transaction("0ffffffff").unwrap(), None);
    }

    #[test]
    fn empty_ledger_is_refused() {
        let store = BlobLedgerStore::in_memory(2).unwrap();
        let err = store.save_ledger(&ledger(0)).unwrap_err();
        assert!(matches!(err, StoreError::EmptyLedger { .. }));
        assert_eq!(store.load_ledger(&owner(), "ART").unwrap(), None);
    }

    #[test]
    fn missing_page_is_corrupt() {
        let store = BlobLedgerStore::in_memory(2).unwrap();
        store.save_ledger(&ledger(3)).unwrap();
        let blobs = InMemoryBlobStore::new();
        for key in store.blobs().keys_with_prefix("").unwrap() {
            if !key.ends_with("page-1.json.zst") {
                blobs.put(&key, &store.blobs().get(&key).unwrap().unwrap()).unwrap();
            }
        }
        let damaged = BlobLedgerStore::new(blobs, store.config().clone()).unwrap();
        assert!(matches!(
            damaged.load_ledger(&owner(), "ART"),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn path_like_identities_are_rejected() {
        let store = BlobLedgerStore::in_memory(2).unwrap();
        assert!(matches!(
            store.load_account(&Address::new("../etc")),
            Err(StoreError::InvalidKey(_))
        ));
        assert_eq!(store.find_transaction("0/../x").unwrap(), None);
    }

    /// Fails every put whose key ends with `suffix`.
    struct FailingPuts {
        inner: InMemoryBlobStore,
        suffix: &'static str,
    }

    impl BlobStore for FailingPuts {
        fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
            self.inner.get(key)
        }

        fn put(&self, key: &str, bytes: &[u8]) -> StoreResult<()> {
            if key.ends_with(self.suffix) {
                return Err(std::io::Error::other("disk full").into());
            }
            self.inner.put(key, bytes)
        }
    }

    #[test]
    fn locators_from_a_failed_save_are_not_found() {
        let memory = BlobLedgerStore::in_memory(2).unwrap();
        memory.save_ledger(&ledger(3)).unwrap();

        let blobs = FailingPuts {
            inner: InMemoryBlobStore::new(),
            suffix: "index.json.zst",
        };
        for key in memory.blobs().keys_with_prefix("").unwrap() {
            blobs
                .inner
                .put(&key, &memory.blobs().get(&key).unwrap().unwrap())
                .unwrap();
        }
        let store = BlobLedgerStore::new(blobs, memory.config().clone()).unwrap();

        assert!(store.save_ledger(&ledger(5)).is_err());
        assert!(store.blobs().inner.exists("tx/000000004.json.zst").unwrap());
        assert_eq!(store.find_transaction("000000004").unwrap(), None);
        assert_eq!(store.find_transaction("000000003").unwrap(), None);
        assert!(store.find_transaction("000000002").unwrap().is_some());
        assert_eq!(store.load_ledger(&owner(), "ART").unwrap().unwrap(), ledger(3));
    }

    #[test]
    fn locator_overwritten_by_another_save_is_stale() {
        let store = BlobLedgerStore::in_memory(2).unwrap();
        store.save_ledger(&ledger(3)).unwrap();
        let stale = TxLocator {
            owner: owner(),
            ticker: "ART".into(),
            page: 0,
            slot: 1,
        };
        store
            .write(&tx_key("0deadbeef").unwrap(), &stale)
            .unwrap();
        assert_eq!(store.find_transaction("0deadbeef").unwrap(), None);
    }

    #[test]
    fn filesystem_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::new(dir.path()).with_page_capacity(2);
        {
            let store = BlobLedgerStore::open(config.clone()).unwrap();
            store.save_ledger(&ledger(5)).unwrap();
        }
        let reopened = BlobLedgerStore::open(config).unwrap();
        assert_eq!(reopened.load_ledger(&owner(), "ART").unwrap().unwrap(), ledger(5));
        assert!(dir
            .path()
            .join("ledgers/666OWNER999/415254/index.json.zst")
            .is_file());
    }
}
