use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::hasher::ContentHasher;

/// Separator written before every transaction hash.
pub const SEPARATOR: char = ':';

/// Cumulative ledger digest: double SHA-256 over `":" ‖ h₁ ‖ ":" ‖ h₂ …`,
/// base64 encoded.
pub struct RollingHash;

impl RollingHash {
    pub fn compute<'a, I>(hashes: I) -> String
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut joined = String::new();
        for hash in hashes {
            joined.push(SEPARATOR);
            joined.push_str(hash);
        }
        STANDARD.encode(ContentHasher::double_hash(joined.as_bytes()))
    }

    /// Whether `expected` is the rolling hash of `hashes`.
    pub fn matches<'a, I>(hashes: I, expected: &str) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self::compute(hashes) == expected
    }
}

/// An entry in a linear hash chain.
pub trait HashLinked {
    fn own_hash(&self) -> &str;
    /// `None` for the first entry.
    fn previous(&self) -> Option<&str>;
}

/// Link-level verification of a hash-chained sequence.
pub struct LinkVerifier;

impl LinkVerifier {
    /// Checks that the first entry has no predecessor and every later entry
    /// names the hash of the entry before it.
    pub fn verify_links<T: HashLinked>(entries: &[T]) -> Result<(), ChainError> {
        let Some(first) = entries.first() else {
            return Ok(());
        };
        if first.previous().is_some_and(|p| !p.is_empty()) {
            return Err(ChainError::GenesisHasPrevious);
        }
        for (index, pair) in entries.windows(2).enumerate() {
            match pair[1].previous() {
                Some(prev) if prev == pair[0].own_hash() => {}
                Some(_) => return Err(ChainError::BrokenLink { index: index + 1 }),
                None => return Err(ChainError::MissingPrevious { index: index + 1 }),
            }
        }
        Ok(())
    }
}

/// Errors from link verification.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("first entry names a previous hash")]
    GenesisHasPrevious,

    #[error("broken link at index {index}: previous hash does not match")]
    BrokenLink { index: usize },

    #[error("missing previous hash at index {index}")]
    MissingPrevious { index: usize },
}
