use std::fmt;

use serde::{Deserialize, Serialize};

/// Textual identity of an account.
///
/// An `Address` is carried as text exactly as the user supplied it. Holding
/// one does not imply it is well-formed: validation against its checksum and
/// scheme markers is done by `argent_crypto::AddressCodec`.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Abbreviated form for logs: first and last eight characters.
    pub fn short(&self) -> String {
        if self.0.len() <= 16 || !self.0.is_ascii() {
            return self.0.clone();
        }
        format!("{}..{}", &self.0[..8], &self.0[self.0.len() - 8..])
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.short())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Address {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
