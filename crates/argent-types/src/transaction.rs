use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::currency::Currency;
use crate::error::TypeError;
use crate::scheme::Signature;

/// The four transaction kinds, with their numeric type tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
    Send,
    Claim,
    Create,
    Trust,
}

impl TxKind {
    /// Numeric tag used as the hash prefix and in the canonical projection.
    pub const fn tag(self) -> u8 {
        match self {
            Self::Send => 0,
            Self::Claim => 1,
            Self::Create => 2,
            Self::Trust => 3,
        }
    }

    pub fn from_tag(tag: u8) -> Result<Self, TypeError> {
        match tag {
            0 => Ok(Self::Send),
            1 => Ok(Self::Claim),
            2 => Ok(Self::Create),
            3 => Ok(Self::Trust),
            other => Err(TypeError::UnknownTxTag(other)),
        }
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Send => write!(f, "send"),
            Self::Claim => write!(f, "claim"),
            Self::Create => write!(f, "create"),
            Self::Trust => write!(f, "trust"),
        }
    }
}

/// Kind-specific transaction payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxBody {
    /// Genesis of a ledger. For the native currency the balance is zero; for a
    /// token it is the minted supply.
    Create {
        balance: u64,
        currency: Currency,
        origin: Address,
    },
    /// Value transfer. `balance` is the sender's balance after the transfer,
    /// not the transferred amount.
    Send {
        balance: u64,
        currency: Currency,
        origin: Address,
        destination: Address,
    },
    /// Claim of a Send addressed to `destination`. `origin` is the hash of the
    /// referenced Send, not an address.
    Claim {
        origin: String,
        destination: Address,
    },
    /// Time-bounded trust grant. `expiration` is a Unix timestamp in
    /// nanoseconds as decimal text; `"0"` never expires.
    Trust {
        origin: Address,
        destination: Address,
        expiration: String,
    },
}

/// A ledger transaction: common hash/link/signature fields plus a
/// kind-specific body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Canonical content hash: decimal type tag followed by hex digest.
    pub hash: String,
    /// Hash of the transaction this one follows in its ledger.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
    pub body: TxBody,
}

impl Transaction {
    /// An unhashed, unsigned transaction.
    pub fn new(body: TxBody, previous_hash: Option<String>) -> Self {
        Self {
            hash: String::new(),
            previous_hash,
            signature: None,
            body,
        }
    }

    pub fn kind(&self) -> TxKind {
        match &self.body {
            TxBody::Create { .. } => TxKind::Create,
            TxBody::Send { .. } => TxKind::Send,
            TxBody::Claim { .. } => TxKind::Claim,
            TxBody::Trust { .. } => TxKind::Trust,
        }
    }

    /// The origin field as text. For a Claim this is a transaction hash.
    pub fn origin(&self) -> &str {
        match &self.body {
            TxBody::Create { origin, .. }
            | TxBody::Send { origin, .. }
            | TxBody::Trust { origin, .. } => origin.as_str(),
            TxBody::Claim { origin, .. } => origin,
        }
    }

    pub fn destination(&self) -> Option<&Address> {
        match &self.body {
            TxBody::Create { .. } => None,
            TxBody::Send { destination, .. }
            | TxBody::Claim { destination, .. }
            | TxBody::Trust { destination, .. } => Some(destination),
        }
    }

    pub fn currency(&self) -> Option<&Currency> {
        match &self.body {
            TxBody::Create { currency, .. } | TxBody::Send { currency, .. } => Some(currency),
            TxBody::Claim { .. } | TxBody::Trust { .. } => None,
        }
    }

    pub fn balance(&self) -> Option<u64> {
        match &self.body {
            TxBody::Create { balance, .. } | TxBody::Send { balance, .. } => Some(*balance),
            TxBody::Claim { .. } | TxBody::Trust { .. } => None,
        }
    }

    /// The identity that must have signed this transaction.
    ///
    /// Origin for Send, Trust and native Create; the currency owner for a
    /// token Create; the destination for a Claim. Returns `None` for a token
    /// Create whose currency has no owner.
    pub fn signer(&self) -> Option<&str> {
        match &self.body {
            TxBody::Create {
                currency, origin, ..
            } => {
                if currency.is_native() {
                    Some(origin.as_str())
                } else {
                    currency.owner.as_ref().map(Address::as_str)
                }
            }
            TxBody::Send { origin, .. } | TxBody::Trust { origin, .. } => Some(origin.as_str()),
            TxBody::Claim { destination, .. } => Some(destination.as_str()),
        }
    }

    /// The ledger identity this transaction belongs to.
    ///
    /// Equal to [`Self::origin`] except for a Claim, whose origin is a
    /// transaction hash and which is recorded in the claimer's ledger.
    pub fn chain_identity(&self) -> &str {
        match &self.body {
            TxBody::Claim { destination, .. } => destination.as_str(),
            _ => self.origin(),
        }
    }

    /// Previous hash as text, empty when absent.
    pub fn previous_hash_str(&self) -> &str {
        self.previous_hash.as_deref().unwrap_or("")
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }
}
