use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::TypeError;
use crate::scheme::Scheme;

/// Identity record: an address, the key it was derived from, and the
/// currencies it keeps ledgers in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: Address,
    pub scheme: Scheme,
    #[serde(with = "hex_bytes")]
    pub public_key: Vec<u8>,
    #[serde(default)]
    pub currencies: BTreeSet<String>,
}

impl Account {
    pub fn new(address: Address, scheme: Scheme, public_key: Vec<u8>) -> Self {
        Self {
            address,
            scheme,
            public_key,
            currencies: BTreeSet::new(),
        }
    }

    /// Whether a ledger exists for `ticker`.
    pub fn has_ledger(&self, ticker: &str) -> bool {
        self.currencies.contains(ticker)
    }

    /// Record a ledger for `ticker`. Returns `true` if it was not known yet.
    pub fn add_currency(&mut self, ticker: impl Into<String>) -> bool {
        self.currencies.insert(ticker.into())
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(&self.public_key)
    }

    pub fn public_key_from_hex(text: &str) -> Result<Vec<u8>, TypeError> {
        hex::decode(text).map_err(|e| TypeError::InvalidHex(e.to_string()))
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        hex::decode(text).map_err(serde::de::Error::custom)
    }
}
