//! Signing and verification for both schemes.
//!
//! Each scheme sits behind a [`SignatureBackend`]; [`SignatureProvider`]
//! dispatches on the scheme the caller names, never on signature length.

use argent_types::{Address, Scheme, SchemeError, Signature};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use k256::ecdsa::signature::{Signer, Verifier};
use pqcrypto_sphincsplus::sphincssha2128fsimple as sphincs;
use pqcrypto_traits::sign::{DetachedSignature as _, PublicKey as _, SecretKey as _};

use crate::address::AddressCodec;
use crate::error::{CryptoError, CryptoResult};

/// Raw signing and verification for one scheme.
pub trait SignatureBackend: Send + Sync {
    fn scheme(&self) -> Scheme;

    /// Generate fresh key material: `(secret, public)`.
    fn generate(&self) -> CryptoResult<(Vec<u8>, Vec<u8>)>;

    /// Derive key material from 32 bytes of entropy.
    fn from_seed(&self, seed: &[u8; 32]) -> CryptoResult<(Vec<u8>, Vec<u8>)>;

    /// Produce raw signature bytes over `message`.
    fn sign(&self, secret: &[u8], message: &[u8]) -> CryptoResult<Vec<u8>>;

    /// Check raw signature bytes against `message` and `public_key`.
    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> CryptoResult<()>;
}

/// ECDSA over secp256k1 with a SHA-256 message digest. Public keys are the
/// uncompressed point without its SEC1 tag; signatures are `r ‖ s`.
pub struct EcdsaBackend;

impl EcdsaBackend {
    fn public_of(key: &k256::ecdsa::SigningKey) -> Vec<u8> {
        let point = key.verifying_key().to_encoded_point(false);
        point.as_bytes()[1..].to_vec()
    }

    fn verifying_key(public_key: &[u8]) -> CryptoResult<k256::ecdsa::VerifyingKey> {
        if public_key.len() != Scheme::Ec.public_key_len() {
            return Err(CryptoError::InvalidKey(Scheme::Ec));
        }
        let mut sec1 = Vec::with_capacity(65);
        sec1.push(0x04);
        sec1.extend_from_slice(public_key);
        k256::ecdsa::VerifyingKey::from_sec1_bytes(&sec1)
            .map_err(|_| CryptoError::InvalidKey(Scheme::Ec))
    }
}

impl SignatureBackend for EcdsaBackend {
    fn scheme(&self) -> Scheme {
        Scheme::Ec
    }

    fn generate(&self) -> CryptoResult<(Vec<u8>, Vec<u8>)> {
        let key = k256::ecdsa::SigningKey::random(&mut rand::thread_rng());
        let public = Self::public_of(&key);
        Ok((key.to_bytes().to_vec(), public))
    }

    fn from_seed(&self, seed: &[u8; 32]) -> CryptoResult<(Vec<u8>, Vec<u8>)> {
        let key = k256::ecdsa::SigningKey::from_slice(seed)
            .map_err(|_| CryptoError::InvalidSeed("not a valid secp256k1 scalar".into()))?;
        let public = Self::public_of(&key);
        Ok((key.to_bytes().to_vec(), public))
    }

    fn sign(&self, secret: &[u8], message: &[u8]) -> CryptoResult<Vec<u8>> {
        let key = k256::ecdsa::SigningKey::from_slice(secret)
            .map_err(|_| CryptoError::InvalidKey(Scheme::Ec))?;
        let signature: k256::ecdsa::Signature = key
            .try_sign(message)
            .map_err(|_| CryptoError::InvalidSignature)?;
        Ok(signature.to_bytes().to_vec())
    }

    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> CryptoResult<()> {
        let key = Self::verifying_key(public_key)?;
        let signature = k256::ecdsa::Signature::from_slice(signature)
            .map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;
        key.verify(message, &signature)
            .map_err(|_| CryptoError::InvalidSignature)
    }
}

/// SPHINCS+-SHA2-128f-simple detached signatures.
pub struct SphincsBackend;

impl SignatureBackend for SphincsBackend {
    fn scheme(&self) -> Scheme {
        Scheme::PostQuantum
    }

    fn generate(&self) -> CryptoResult<(Vec<u8>, Vec<u8>)> {
        let (public, secret) = sphincs::keypair();
        Ok((secret.as_bytes().to_vec(), public.as_bytes().to_vec()))
    }

    fn from_seed(&self, _seed: &[u8; 32]) -> CryptoResult<(Vec<u8>, Vec<u8>)> {
        Err(CryptoError::SeededKeygenUnsupported(Scheme::PostQuantum))
    }

    fn sign(&self, secret: &[u8], message: &[u8]) -> CryptoResult<Vec<u8>> {
        let secret = sphincs::SecretKey::from_bytes(secret)
            .map_err(|_| CryptoError::InvalidKey(Scheme::PostQuantum))?;
        Ok(sphincs::detached_sign(message, &secret).as_bytes().to_vec())
    }

    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> CryptoResult<()> {
        let public = sphincs::PublicKey::from_bytes(public_key)
            .map_err(|_| CryptoError::InvalidKey(Scheme::PostQuantum))?;
        let signature = sphincs::DetachedSignature::from_bytes(signature).map_err(|_| {
            CryptoError::MalformedSignature("wrong SPHINCS+ signature length".into())
        })?;
        sphincs::verify_detached_signature(&signature, message, &public)
            .map_err(|_| CryptoError::InvalidSignature)
    }
}

static EC_BACKEND: EcdsaBackend = EcdsaBackend;
static PQ_BACKEND: SphincsBackend = SphincsBackend;

/// A key pair under one scheme. The secret half never leaves this struct
/// except through [`SignatureProvider::sign`].
#[derive(Clone)]
pub struct KeyPair {
    scheme: Scheme,
    secret: Vec<u8>,
    public_key: Vec<u8>,
}

impl KeyPair {
    /// Fresh random key pair.
    pub fn generate(scheme: Scheme) -> CryptoResult<Self> {
        let (secret, public_key) = SignatureProvider::backend(scheme).generate()?;
        Ok(Self {
            scheme,
            secret,
            public_key,
        })
    }

    /// Deterministic key pair from 32 bytes of entropy. EC only.
    pub fn from_seed(scheme: Scheme, seed: &[u8; 32]) -> CryptoResult<Self> {
        let (secret, public_key) = SignatureProvider::backend(scheme).from_seed(seed)?;
        Ok(Self {
            scheme,
            secret,
            public_key,
        })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    pub fn address(&self) -> Address {
        AddressCodec::derive(&self.public_key, self.scheme)
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "KeyPair({}, public={}, secret=<redacted>)",
            self.scheme,
            hex::encode(&self.public_key[..self.public_key.len().min(8)])
        )
    }
}

/// Scheme-dispatching signer and verifier working on base64 signature text.
pub struct SignatureProvider;

impl SignatureProvider {
    pub fn backend(scheme: Scheme) -> &'static dyn SignatureBackend {
        match scheme {
            Scheme::Ec => &EC_BACKEND,
            Scheme::PostQuantum => &PQ_BACKEND,
        }
    }

    /// Sign `message` with the private half of `keypair`.
    pub fn sign(keypair: &KeyPair, message: &[u8]) -> CryptoResult<Signature> {
        let raw = Self::backend(keypair.scheme).sign(&keypair.secret, message)?;
        Ok(Signature::new(keypair.scheme, STANDARD.encode(raw)))
    }

    /// Verify `signature` over `message` under an explicitly named scheme.
    pub fn verify(
        signature: &Signature,
        message: &[u8],
        public_key: &[u8],
        scheme: Scheme,
    ) -> CryptoResult<()> {
        if signature.scheme != scheme {
            return Err(SchemeError::Unexpected {
                expected: scheme,
                found: signature.scheme,
            }
            .into());
        }
        if public_key.len() != scheme.public_key_len() {
            return Err(CryptoError::InvalidKey(scheme));
        }
        let raw = STANDARD
            .decode(signature.value.as_bytes())
            .map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;
        if raw.len() != scheme.signature_len() {
            return Err(CryptoError::MalformedSignature(format!(
                "{} bytes, expected {}",
                raw.len(),
                scheme.signature_len()
            )));
        }
        Self::backend(scheme).verify(public_key, message, &raw)
    }
}
