//! Constructors for the four transaction kinds. Each returns a transaction
//! with its canonical hash filled in; sign it with [`sign_with`].

use argent_crypto::{CryptoResult, KeyPair, SignatureProvider};
use argent_types::{Address, Currency, Transaction, TxBody};

use crate::canonical::Canonicalizer;
use crate::error::ValidationError;

fn sealed(body: TxBody, previous: Option<String>) -> Result<Transaction, ValidationError> {
    let mut tx = Transaction::new(body, previous);
    Canonicalizer::seal(&mut tx)?;
    Ok(tx)
}

/// Genesis of a native-currency ledger.
pub fn create_native(owner: &Address) -> Result<Transaction, ValidationError> {
    sealed(
        TxBody::Create {
            balance: 0,
            currency: Currency::native(),
            origin: owner.clone(),
        },
        None,
    )
}

/// Genesis of a token ledger held by `holder`, minting `supply`. Signed by
/// the currency owner.
pub fn create_token(
    holder: &Address,
    currency: Currency,
    supply: u64,
) -> Result<Transaction, ValidationError> {
    sealed(
        TxBody::Create {
            balance: supply,
            currency,
            origin: holder.clone(),
        },
        None,
    )
}

/// Transfer out of `origin`'s ledger. `balance` is what remains afterwards.
pub fn send(
    origin: &Address,
    previous: &str,
    destination: &Address,
    balance: u64,
    currency: Currency,
) -> Result<Transaction, ValidationError> {
    sealed(
        TxBody::Send {
            balance,
            currency,
            origin: origin.clone(),
            destination: destination.clone(),
        },
        Some(previous.to_string()),
    )
}

/// Claim of the send `send_hash` into `claimer`'s ledger.
pub fn claim(
    claimer: &Address,
    previous: &str,
    send_hash: &str,
) -> Result<Transaction, ValidationError> {
    sealed(
        TxBody::Claim {
            origin: send_hash.to_string(),
            destination: claimer.clone(),
        },
        Some(previous.to_string()),
    )
}

/// Trust grant from `origin` to `destination`, expiring at `expiration`
/// Unix nanoseconds (`0` never expires).
pub fn trust(
    origin: &Address,
    previous: &str,
    destination: &Address,
    expiration: i64,
) -> Result<Transaction, ValidationError> {
    sealed(
        TxBody::Trust {
            origin: origin.clone(),
            destination: destination.clone(),
            expiration: expiration.to_string(),
        },
        Some(previous.to_string()),
    )
}

/// Sign the stored hash with `keypair`.
pub fn sign_with(mut tx: Transaction, keypair: &KeyPair) -> CryptoResult<Transaction> {
    tx.signature = Some(SignatureProvider::sign(keypair, tx.hash.as_bytes())?);
    Ok(tx)
}
