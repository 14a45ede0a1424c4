/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization failure on write.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// zstd compression or decompression failed.
    #[error("compression error: {0}")]
    Compression(String),

    /// A stored record cannot be decoded or contradicts its index.
    #[error("corrupt record {key}: {reason}")]
    Corrupt { key: String, reason: String },

    /// A key segment would escape the storage layout.
    #[error("invalid storage key segment: {0:?}")]
    InvalidKey(String),

    /// Ledgers are only persisted once they hold their genesis.
    #[error("refusing to persist empty ledger {owner}/{ticker}")]
    EmptyLedger { owner: String, ticker: String },

    #[error("invalid store configuration: {0}")]
    InvalidConfig(String),

    /// Another thread panicked while holding a store lock.
    #[error("store lock poisoned")]
    LockPoisoned,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
