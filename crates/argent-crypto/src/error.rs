use argent_types::SchemeError;

use crate::base32::Base32Error;

/// Errors from key handling, signing, and verification.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("malformed signature encoding: {0}")]
    MalformedSignature(String),

    #[error("invalid public key for scheme {0}")]
    InvalidKey(argent_types::Scheme),

    #[error("invalid key seed: {0}")]
    InvalidSeed(String),

    #[error("seeded key generation is not supported for scheme {0}")]
    SeededKeygenUnsupported(argent_types::Scheme),

    #[error("base32: {0}")]
    Encoding(#[from] Base32Error),

    #[error(transparent)]
    Scheme(#[from] SchemeError),
}

/// Result alias for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
