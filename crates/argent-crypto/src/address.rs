//! Checksummed textual addresses.
//!
//! Layout: `marker ‖ base32(SHA-256(pubkey) ‖ padding) ‖ base32(checksum) ‖ closing`,
//! where the checksum is the first five bytes of a double SHA-256 over the
//! encoded payload text. The two schemes use the same markers in swapped
//! order, so the scheme of an address is readable from its ends alone.

use argent_types::{Address, Scheme, SchemeError};

use crate::base32::{self, Base32Error};
use crate::hasher::ContentHasher;

const EC_OPEN: &str = "666";
const EC_CLOSE: &str = "999";
const PQ_OPEN: &str = "999";
const PQ_CLOSE: &str = "666";

const MARKER_LEN: usize = 3;
const PADDING_LEN: usize = 3;
const CHECKSUM_LEN: usize = 5;

/// Encoded length of `SHA-256(pubkey) ‖ padding`.
pub const PAYLOAD_CHARS: usize = 56;
/// Encoded length of the checksum.
pub const CHECKSUM_CHARS: usize = 8;
/// Total address length, identical for both schemes.
pub const ADDRESS_LEN: usize = MARKER_LEN + PAYLOAD_CHARS + CHECKSUM_CHARS + MARKER_LEN;

/// Why an address failed to parse.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("address has {0} characters, expected {ADDRESS_LEN}")]
    Length(usize),

    #[error("address markers do not match a known scheme")]
    Markers,

    #[error("payload: {0}")]
    Payload(#[from] Base32Error),

    #[error("payload padding does not belong to scheme {0}")]
    Padding(Scheme),

    #[error("checksum mismatch")]
    Checksum,
}

/// The decoded pieces of a valid address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAddress {
    pub scheme: Scheme,
    /// SHA-256 of the public key.
    pub key_hash: [u8; 32],
}

/// Derivation, validation and scheme classification of addresses.
pub struct AddressCodec;

impl AddressCodec {
    /// Derive the address of a public key under `scheme`.
    pub fn derive(public_key: &[u8], scheme: Scheme) -> Address {
        let mut payload = Vec::with_capacity(32 + PADDING_LEN);
        payload.extend_from_slice(&ContentHasher::hash(public_key));
        payload.extend_from_slice(&padding(scheme));

        let encoded = base32::encode(&payload);
        let checksum = checksum(&encoded);
        let (open, close) = markers(scheme);

        Address::new(format!("{open}{encoded}{checksum}{close}"))
    }

    /// Whether `address` is a well-formed address of either scheme.
    pub fn validate(address: &Address) -> bool {
        Self::parse(address).is_ok()
    }

    /// Parse an address into its scheme and key hash, checking markers,
    /// payload encoding, padding and checksum.
    pub fn parse(address: &Address) -> Result<ParsedAddress, AddressError> {
        let text = address.as_str();
        if text.len() != ADDRESS_LEN || !text.is_ascii() {
            return Err(AddressError::Length(text.chars().count()));
        }
        let scheme = Self::scheme_of_address(address).ok_or(AddressError::Markers)?;

        let body = &text[MARKER_LEN..ADDRESS_LEN - MARKER_LEN];
        let (encoded, given) = body.split_at(PAYLOAD_CHARS);

        let payload = base32::decode(encoded)?;
        // A checksum with a foreign symbol can never match; report it as such.
        base32::decode(given)?;

        let (key_hash, pad) = payload.split_at(32);
        if pad != padding(scheme) {
            return Err(AddressError::Padding(scheme));
        }
        if checksum(encoded) != given {
            return Err(AddressError::Checksum);
        }

        let mut hash = [0u8; 32];
        hash.copy_from_slice(key_hash);
        Ok(ParsedAddress {
            scheme,
            key_hash: hash,
        })
    }

    /// Classify an address by its markers and length alone.
    pub fn scheme_of_address(address: &Address) -> Option<Scheme> {
        let text = address.as_str();
        if text.len() != ADDRESS_LEN || !text.is_ascii() {
            return None;
        }
        let open = &text[..MARKER_LEN];
        let close = &text[ADDRESS_LEN - MARKER_LEN..];

        let matches: Vec<Scheme> = Scheme::ALL
            .into_iter()
            .filter(|s| markers(*s) == (open, close))
            .collect();
        match matches.as_slice() {
            [one] => Some(*one),
            _ => None,
        }
    }

    /// Classify a public key by its byte length alone.
    pub fn scheme_of_public_key(public_key: &[u8]) -> Option<Scheme> {
        Scheme::ALL
            .into_iter()
            .find(|s| s.public_key_len() == public_key.len())
    }

    /// The scheme both the address and the key agree on.
    pub fn resolve_scheme(address: &Address, public_key: &[u8]) -> Result<Scheme, SchemeError> {
        let by_address = Self::scheme_of_address(address)
            .ok_or_else(|| SchemeError::UnknownAddressScheme(address.to_string()))?;
        let by_key = Self::scheme_of_public_key(public_key)
            .ok_or(SchemeError::UnknownKeyScheme(public_key.len()))?;
        if by_address != by_key {
            return Err(SchemeError::Mismatch {
                address: by_address,
                key: by_key,
            });
        }
        Ok(by_address)
    }

    /// Whether `public_key` derives to exactly `address`.
    pub fn matches_public_key(address: &Address, public_key: &[u8]) -> bool {
        match Self::scheme_of_address(address) {
            Some(scheme) => Self::derive(public_key, scheme) == *address,
            None => false,
        }
    }
}

fn markers(scheme: Scheme) -> (&'static str, &'static str) {
    match scheme {
        Scheme::Ec => (EC_OPEN, EC_CLOSE),
        Scheme::PostQuantum => (PQ_OPEN, PQ_CLOSE),
    }
}

fn padding(scheme: Scheme) -> [u8; PADDING_LEN] {
    match scheme {
        Scheme::Ec => [0, 0, 0],
        Scheme::PostQuantum => [0, 0, 1],
    }
}

fn checksum(encoded_payload: &str) -> String {
    let digest = ContentHasher::double_hash(encoded_payload.as_bytes());
    base32::encode(&digest[..CHECKSUM_LEN])
}
