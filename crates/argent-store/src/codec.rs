//! Record encoding: JSON, then zstd.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{StoreError, StoreResult};

pub fn encode<T: Serialize>(value: &T, level: i32) -> StoreResult<Vec<u8>> {
    let json = serde_json::to_vec(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
    zstd::encode_all(json.as_slice(), level).map_err(|e| StoreError::Compression(e.to_string()))
}

/// Decode a record read from `key`; `key` only labels errors.
pub fn decode<T: DeserializeOwned>(bytes: &[u8], key: &str) -> StoreResult<T> {
    let json = zstd::decode_all(bytes).map_err(|e| StoreError::Compression(e.to_string()))?;
    serde_json::from_slice(&json).map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_records_are_compressed_json() {
        let value = serde_json::json!({"ticker": "ART", "n": [1, 2, 3]});
        let bytes = encode(&value, 3).unwrap();
        let raw = zstd::decode_all(bytes.as_slice()).unwrap();
        assert_eq!(serde_json::from_slice::<serde_json::Value>(&raw).unwrap(), value);
        let back: serde_json::Value = decode(&bytes, "k").unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn garbage_is_a_compression_error() {
        let err = decode::<serde_json::Value>(b"not zstd", "k").unwrap_err();
        assert!(matches!(err, StoreError::Compression(_)));
    }

    #[test]
    fn wrong_shape_is_corrupt() {
        let bytes = encode(&"just a string", 3).unwrap();
        let err = decode::<Vec<u64>>(&bytes, "page-0").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { key, .. } if key == "page-0"));
    }
}
