use serde::{Deserialize, Serialize};

/// Append rules that can be relaxed for replaying foreign data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Every non-genesis transaction must name the current head as its
    /// previous hash.
    pub require_previous_link: bool,
    /// A claim must reference a stored send addressed to the ledger owner.
    pub require_claim_reference: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            require_previous_link: true,
            require_claim_reference: true,
        }
    }
}

impl LedgerConfig {
    /// Only signature, hash and ownership rules; no link or claim lookups.
    pub fn relaxed() -> Self {
        Self {
            require_previous_link: false,
            require_claim_reference: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_to_strict() {
        let config: LedgerConfig = serde_json::from_str(r#"{"require_claim_reference": false}"#).unwrap();
        assert!(config.require_previous_link);
        assert!(!config.require_claim_reference);
    }
}
