use serde::{Deserialize, Serialize};

use crate::address::Address;

/// A currency a ledger is kept in.
///
/// The native currency has no owner. Every other currency is a token minted
/// by its owner through a token `Create` transaction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency {
    pub name: String,
    pub ticker: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Address>,
}

impl Currency {
    pub const NATIVE_NAME: &'static str = "Argent";
    pub const NATIVE_TICKER: &'static str = "ART";

    /// A user-minted token.
    pub fn token(name: impl Into<String>, ticker: impl Into<String>, owner: Address) -> Self {
        Self {
            name: name.into(),
            ticker: ticker.into(),
            owner: Some(owner),
        }
    }

    /// The built-in currency.
    pub fn native() -> Self {
        Self {
            name: Self::NATIVE_NAME.into(),
            ticker: Self::NATIVE_TICKER.into(),
            owner: None,
        }
    }

    pub fn is_native(&self) -> bool {
        *self == Self::native()
    }

    /// Owner address text, empty for the native currency.
    pub fn owner_str(&self) -> &str {
        self.owner.as_ref().map(Address::as_str).unwrap_or("")
    }
}
