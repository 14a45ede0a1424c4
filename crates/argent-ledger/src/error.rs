use argent_crypto::CryptoError;
use argent_store::StoreError;
use argent_types::{SchemeError, TxKind};

/// Why a transaction or ledger operation was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("malformed address in {field}: {address:?}")]
    MalformedAddress { field: &'static str, address: String },

    #[error("native currency genesis must carry a zero balance, found {0}")]
    NativeBalanceNotZero(u64),

    #[error("token genesis must mint a non-zero supply")]
    TokenBalanceZero,

    #[error("ticker {0:?} is reserved for the native currency")]
    ReservedTicker(String),

    #[error("trust expired at {expiration} (now {now})")]
    TrustExpired { expiration: i64, now: i64 },

    #[error("trust expiration {0:?} is not a nanosecond timestamp")]
    MalformedExpiration(String),

    #[error("stored hash {found} does not match canonical hash {expected}")]
    HashMismatch { expected: String, found: String },

    #[error("transaction cannot be encoded canonically: {0}")]
    Unencodable(String),

    #[error("{0} transaction needs a previous hash")]
    MissingPreviousHash(TxKind),

    #[error("transaction is not signed")]
    MissingSignature,

    #[error("signature does not verify")]
    SignatureMismatch,

    #[error("no account known for signer {0:?}")]
    UnknownSigner(String),

    #[error("public key on record does not derive to {0}")]
    KeyBindingMismatch(String),

    #[error("transaction belongs to {found}, not ledger owner {expected}")]
    WrongOwner { expected: String, found: String },

    #[error("an empty ledger only accepts a create transaction, got {0}")]
    GenesisRequired(TxKind),

    #[error("ledger already has a genesis; create is not allowed")]
    UnexpectedCreate,

    #[error("previous hash {found:?} does not link to ledger head {expected}")]
    BrokenLink { expected: String, found: String },

    #[error("claimed transaction {0} not found")]
    MissingClaimReference(String),

    #[error("claimed transaction {hash} cannot be claimed here: {reason}")]
    InvalidClaimReference { hash: String, reason: String },

    #[error("transaction {0} is already claimed in this ledger")]
    AlreadyClaimed(String),

    #[error("ledger has no transactions")]
    EmptyLedger,

    #[error("currency {found} does not match ledger currency {expected}")]
    CurrencyMismatch { expected: String, found: String },

    #[error("expected a token create transaction")]
    NotTokenCreate,

    #[error("no account opened for {0}")]
    UnknownAccount(String),
}

/// Errors from ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("rejected: {0}")]
    Rejected(#[from] ValidationError),

    #[error(transparent)]
    Scheme(#[from] SchemeError),

    #[error("persistence failed: {0}")]
    Persistence(#[from] StoreError),

    #[error("crypto error: {0}")]
    Crypto(CryptoError),

    #[error("ledger lock poisoned")]
    LockPoisoned,
}

impl LedgerError {
    /// The validation failure, if this is a rejection.
    pub fn rejection(&self) -> Option<&ValidationError> {
        match self {
            Self::Rejected(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

impl From<CryptoError> for LedgerError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::InvalidSignature => Self::Rejected(ValidationError::SignatureMismatch),
            CryptoError::Scheme(e) => Self::Scheme(e),
            other => Self::Crypto(other),
        }
    }
}
