use std::fmt;

use serde::{Deserialize, Serialize};

/// Signature scheme an identity was created under.
///
/// The scheme is always carried explicitly next to keys and signatures; it is
/// never inferred from the length of a signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scheme {
    /// ECDSA over secp256k1.
    Ec,
    /// SPHINCS+ (SHA2-128f, simple).
    PostQuantum,
}

impl Scheme {
    /// Public key length in bytes (EC keys are uncompressed `X || Y`).
    pub const fn public_key_len(self) -> usize {
        match self {
            Self::Ec => 64,
            Self::PostQuantum => 32,
        }
    }

    /// Raw signature length in bytes, before text encoding.
    pub const fn signature_len(self) -> usize {
        match self {
            Self::Ec => 64,
            Self::PostQuantum => 17_088,
        }
    }

    /// Both schemes, EC first.
    pub const ALL: [Scheme; 2] = [Self::Ec, Self::PostQuantum];
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ec => write!(f, "ec"),
            Self::PostQuantum => write!(f, "post-quantum"),
        }
    }
}

/// A signature in its text encoding, tagged with the scheme that produced it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub scheme: Scheme,
    /// Base64 of the raw signature bytes.
    pub value: String,
}

impl Signature {
    pub fn new(scheme: Scheme, value: impl Into<String>) -> Self {
        Self {
            scheme,
            value: value.into(),
        }
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.value.chars().take(12).collect();
        write!(f, "Signature({}, {prefix}...)", self.scheme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_lengths_are_distinct() {
        assert_ne!(
            Scheme::Ec.public_key_len(),
            Scheme::PostQuantum.public_key_len()
        );
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Scheme::PostQuantum).unwrap();
        assert_eq!(json, "\"post_quantum\"");
        let parsed: Scheme = serde_json::from_str("\"ec\"").unwrap();
        assert_eq!(parsed, Scheme::Ec);
    }

    #[test]
    fn debug_truncates_signature() {
        let sig = Signature::new(Scheme::Ec, "A".repeat(88));
        let debug = format!("{sig:?}");
        assert!(debug.len() < 40);
        assert!(debug.contains("ec"));
    }
}
