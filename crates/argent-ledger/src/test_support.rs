use std::sync::RwLock;

use argent_crypto::KeyPair;
use argent_store::{
    BlobLedgerStore, BlobStore, InMemoryBlobStore, LedgerStore, StoreConfig, StoreResult,
};
use argent_types::{Account, Scheme};

pub(crate) type MemoryStore = BlobLedgerStore<InMemoryBlobStore>;
pub(crate) type FaultyStore = BlobLedgerStore<FaultyBlobs>;

pub(crate) fn keypair(seed: u8) -> KeyPair {
    KeyPair::from_seed(Scheme::Ec, &[seed; 32]).unwrap()
}

pub(crate) fn store() -> MemoryStore {
    BlobLedgerStore::in_memory(4).unwrap()
}

pub(crate) fn faulty_store() -> FaultyStore {
    let config = StoreConfig::new("memory").with_page_capacity(4);
    BlobLedgerStore::new(FaultyBlobs::default(), config).unwrap()
}

pub(crate) fn register(store: &MemoryStore, kp: &KeyPair) -> Account {
    let account = Account::new(kp.address(), kp.scheme(), kp.public_key().to_vec());
    store.save_account(&account).unwrap();
    account
}

/// In-memory blobs whose puts fail while the key contains a chosen pattern.
#[derive(Default)]
pub(crate) struct FaultyBlobs {
    inner: InMemoryBlobStore,
    failing: RwLock<Option<&'static str>>,
}

impl FaultyBlobs {
    pub(crate) fn fail_puts_containing(&self, pattern: &'static str) {
        *self.failing.write().unwrap() = Some(pattern);
    }

    pub(crate) fn heal(&self) {
        *self.failing.write().unwrap() = None;
    }
}

impl BlobStore for FaultyBlobs {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn put(&self, key: &str, bytes: &[u8]) -> StoreResult<()> {
        if let Some(pattern) = *self.failing.read().unwrap() {
            if key.contains(pattern) {
                return Err(std::io::Error::other(format!("injected failure writing {key}")).into());
            }
        }
        self.inner.put(key, bytes)
    }
}
