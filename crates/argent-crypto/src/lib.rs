//! Cryptographic primitives for the Argent ledger.
//!
//! Provides SHA-256 content hashing, the checksummed address codec, ECDSA
//! (secp256k1) and SPHINCS+ signing/verification behind a single provider,
//! and the rolling hash that seals a ledger.
//!
//! All signature crypto wraps established libraries.

pub mod address;
pub mod base32;
pub mod chain;
pub mod error;
pub mod hasher;
pub mod signer;

pub use address::{AddressCodec, AddressError, ParsedAddress};
pub use chain::{ChainError, HashLinked, LinkVerifier, RollingHash};
pub use error::{CryptoError, CryptoResult};
pub use hasher::ContentHasher;
pub use signer::{EcdsaBackend, KeyPair, SignatureBackend, SignatureProvider, SphincsBackend};
