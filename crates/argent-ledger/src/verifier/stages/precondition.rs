use argent_crypto::AddressCodec;
use argent_types::{Address, Currency, Transaction, TxBody};

use crate::error::{LedgerError, ValidationError};
use crate::verifier::stage::{VerifierStage, VerifyContext};

/// Kind-specific field rules: well-formed addresses, balance rules for
/// genesis, trust expiry.
pub struct PreconditionStage;

fn require_address(field: &'static str, address: &Address) -> Result<(), ValidationError> {
    if AddressCodec::validate(address) {
        Ok(())
    } else {
        Err(ValidationError::MalformedAddress {
            field,
            address: address.to_string(),
        })
    }
}

impl VerifierStage for PreconditionStage {
    fn name(&self) -> &'static str {
        "precondition"
    }

    fn check(&self, tx: &Transaction, context: &VerifyContext<'_>) -> Result<(), LedgerError> {
        match &tx.body {
            TxBody::Send {
                origin,
                destination,
                ..
            } => {
                require_address("origin", origin)?;
                require_address("destination", destination)?;
            }
            TxBody::Claim { destination, .. } => {
                require_address("destination", destination)?;
            }
            TxBody::Create {
                balance,
                currency,
                origin,
            } => {
                if currency.is_native() {
                    if *balance != 0 {
                        return Err(ValidationError::NativeBalanceNotZero(*balance).into());
                    }
                    require_address("origin", origin)?;
                } else {
                    if *balance == 0 {
                        return Err(ValidationError::TokenBalanceZero.into());
                    }
                    if currency.ticker == Currency::NATIVE_TICKER {
                        return Err(ValidationError::ReservedTicker(currency.ticker.clone()).into());
                    }
                    let owner = currency.owner.clone().unwrap_or_default();
                    require_address("currency owner", &owner)?;
                }
            }
            TxBody::Trust {
                origin,
                destination,
                expiration,
            } => {
                let expires: i64 = expiration
                    .parse()
                    .map_err(|_| ValidationError::MalformedExpiration(expiration.clone()))?;
                if expires != 0 && expires < context.now {
                    return Err(ValidationError::TrustExpired {
                        expiration: expires,
                        now: context.now,
                    }
                    .into());
                }
                require_address("origin", origin)?;
                require_address("destination", destination)?;
            }
        }
        Ok(())
    }
}
