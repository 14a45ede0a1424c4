use argent_crypto::{AddressCodec, SignatureProvider};
use argent_types::{Address, SchemeError, Transaction};

use crate::error::{LedgerError, ValidationError};
use crate::verifier::stage::{VerifierStage, VerifyContext};

/// The transaction's signer must have an account whose key derives to its
/// address under an agreeing scheme, and the signature over the stored hash
/// must verify with that key.
pub struct SignatureStage;

impl VerifierStage for SignatureStage {
    fn name(&self) -> &'static str {
        "signature"
    }

    fn check(&self, tx: &Transaction, context: &VerifyContext<'_>) -> Result<(), LedgerError> {
        let signer = tx
            .signer()
            .ok_or_else(|| ValidationError::UnknownSigner(String::new()))?;
        let signature = tx
            .signature
            .as_ref()
            .ok_or(ValidationError::MissingSignature)?;

        let address = Address::new(signer);
        let account = context
            .keys
            .account(&address)?
            .ok_or_else(|| ValidationError::UnknownSigner(signer.to_string()))?;

        if account.address != address
            || !AddressCodec::matches_public_key(&address, &account.public_key)
        {
            return Err(ValidationError::KeyBindingMismatch(signer.to_string()).into());
        }
        let scheme = AddressCodec::resolve_scheme(&address, &account.public_key)?;
        if account.scheme != scheme {
            return Err(SchemeError::Unexpected {
                expected: scheme,
                found: account.scheme,
            }
            .into());
        }

        SignatureProvider::verify(signature, tx.hash.as_bytes(), &account.public_key, scheme)?;
        Ok(())
    }
}
