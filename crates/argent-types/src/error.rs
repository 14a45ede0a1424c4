use thiserror::Error;

use crate::scheme::Scheme;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("unknown transaction type tag: {0}")]
    UnknownTxTag(u8),
}

/// Disagreement about which signature scheme an identity uses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemeError {
    /// The address markers match neither scheme.
    #[error("address {0} does not carry a known scheme marker")]
    UnknownAddressScheme(String),

    /// The public key length matches neither scheme.
    #[error("public key of {0} bytes does not belong to a known scheme")]
    UnknownKeyScheme(usize),

    /// Address markers and public key length point at different schemes.
    #[error("address marks scheme {address} but public key is {key}")]
    Mismatch { address: Scheme, key: Scheme },

    /// A signature or record is tagged with a scheme other than the one expected.
    #[error("expected scheme {expected}, found {found}")]
    Unexpected { expected: Scheme, found: Scheme },
}
