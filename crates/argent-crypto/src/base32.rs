//! Base32 with the address alphabet.
//!
//! Bits are consumed most-significant first, five at a time, as in RFC 4648,
//! but with an alphabet that drops the visually ambiguous `0`, `1`, `I` and
//! `O`. No `=` padding is ever emitted; addresses size their payloads to a
//! multiple of five bytes instead.

/// Symbol table, indexed by 5-bit value.
pub const ALPHABET: &[u8; 32] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum Base32Error {
    #[error("invalid character {ch:?} at position {position}")]
    InvalidCharacter { position: usize, ch: char },

    #[error("input of {0} characters is not a valid encoded length")]
    InvalidLength(usize),

    #[error("trailing bits are not zero")]
    NonCanonical,
}

/// Encode bytes.
pub fn encode(data: &[u8]) -> String {
    let mut out = String::with_capacity((data.len() * 8).div_ceil(5));
    let mut buffer: u16 = 0;
    let mut bits: u32 = 0;

    for &byte in data {
        buffer = (buffer << 8) | u16::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(symbol((buffer >> bits) & 0x1f));
        }
        buffer &= (1 << bits) - 1;
    }

    if bits > 0 {
        out.push(symbol((buffer << (5 - bits)) & 0x1f));
    }
    out
}

/// Decode text produced by [`encode`]. Rejects unknown symbols and
/// non-zero leftover bits, so every byte string has exactly one encoding.
pub fn decode(text: &str) -> Result<Vec<u8>, Base32Error> {
    let mut out = Vec::with_capacity(text.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;

    for (position, ch) in text.chars().enumerate() {
        let value = value_of(ch).ok_or(Base32Error::InvalidCharacter { position, ch })?;
        buffer = (buffer << 5) | value;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((buffer >> bits) as u8);
            buffer &= (1 << bits) - 1;
        }
    }

    if bits >= 5 {
        return Err(Base32Error::InvalidLength(text.chars().count()));
    }
    if buffer != 0 {
        return Err(Base32Error::NonCanonical);
    }
    Ok(out)
}

/// Whether `ch` belongs to the alphabet.
pub fn is_symbol(ch: char) -> bool {
    value_of(ch).is_some()
}

fn symbol(value: u16) -> char {
    ALPHABET[value as usize] as char
}

fn value_of(ch: char) -> Option<u32> {
    if !ch.is_ascii() {
        return None;
    }
    ALPHABET
        .iter()
        .position(|&s| s == ch as u8)
        .map(|p| p as u32)
}
