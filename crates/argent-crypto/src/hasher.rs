use sha2::{Digest, Sha256};

/// SHA-256 content hashing used by addresses, transactions, and ledgers.
pub struct ContentHasher;

impl ContentHasher {
    /// Single SHA-256.
    pub fn hash(data: &[u8]) -> [u8; 32] {
        Sha256::digest(data).into()
    }

    /// SHA-256 applied twice.
    pub fn double_hash(data: &[u8]) -> [u8; 32] {
        Self::hash(&Self::hash(data))
    }

    /// Lowercase hex of a single SHA-256.
    pub fn hash_hex(data: &[u8]) -> String {
        hex::encode(Self::hash(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_matches_known_vector() {
        assert_eq!(
            ContentHasher::hash_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn double_hash_is_hash_of_hash() {
        let once = ContentHasher::hash(b"argent");
        assert_eq!(ContentHasher::double_hash(b"argent"), ContentHasher::hash(&once));
        assert_ne!(ContentHasher::double_hash(b"argent"), once);
    }
}
