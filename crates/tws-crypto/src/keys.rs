use std::fmt;

use ed25519_dalek::Signer;
use thiserror::Error;

/// Length of a detached Ed25519 package signature.
pub const SIGNATURE_LEN: usize = 64;

/// Length of an Ed25519 public key.
pub const KEY_LEN: usize = 32;

/// Errors from parsing keys and signatures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("malformed public key: {0}")]
    MalformedKey(String),
    #[error("signature must be {SIGNATURE_LEN} bytes, got {0}")]
    SignatureLength(usize),
}

/// A publisher's private signing key.
///
/// Clients never sign; this exists for publishing tools and fixtures.
pub struct PublisherKey(ed25519_dalek::SigningKey);

impl PublisherKey {
    pub fn generate() -> Self {
        Self(ed25519_dalek::SigningKey::generate(&mut rand::thread_rng()))
    }

    /// Deterministic key from a 32-byte seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self(ed25519_dalek::SigningKey::from_bytes(&seed))
    }

    pub fn trusted_key(&self) -> TrustedKey {
        TrustedKey(self.0.verifying_key())
    }

    /// Detached signature over a package payload.
    pub fn sign_package(&self, bin: &[u8]) -> PackageSignature {
        PackageSignature(self.0.sign(bin))
    }
}

impl fmt::Debug for PublisherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublisherKey({})", self.trusted_key().fingerprint())
    }
}

/// A public key a client trusts to sign packages.
#[derive(Clone, PartialEq, Eq)]
pub struct TrustedKey(ed25519_dalek::VerifyingKey);

impl TrustedKey {
    pub fn from_bytes(bytes: &[u8; KEY_LEN]) -> Result<Self, CryptoError> {
        ed25519_dalek::VerifyingKey::from_bytes(bytes)
            .map(Self)
            .map_err(|e| CryptoError::MalformedKey(e.to_string()))
    }

    /// Parse a hex-encoded key as found in configuration files.
    pub fn from_hex(text: &str) -> Result<Self, CryptoError> {
        let text = text.trim();
        let bytes = hex::decode(text).map_err(|e| CryptoError::MalformedKey(e.to_string()))?;
        let bytes: [u8; KEY_LEN] = bytes.try_into().map_err(|b: Vec<u8>| {
            CryptoError::MalformedKey(format!("expected {KEY_LEN} bytes, got {}", b.len()))
        })?;
        Self::from_bytes(&bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0.as_bytes())
    }

    /// Short prefix for logs.
    pub fn fingerprint(&self) -> String {
        hex::encode(&self.0.as_bytes()[..4])
    }

    /// Returns `true` if `signature` was made over `bin` by this key.
    ///
    /// Uses strict verification, rejecting malleable signatures.
    pub fn accepts(&self, bin: &[u8], signature: &PackageSignature) -> bool {
        self.0.verify_strict(bin, &signature.0).is_ok()
    }
}

impl fmt::Debug for TrustedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TrustedKey({})", self.fingerprint())
    }
}

/// A detached signature as delivered alongside a package payload.
#[derive(Clone, PartialEq, Eq)]
pub struct PackageSignature(ed25519_dalek::Signature);

impl PackageSignature {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; SIGNATURE_LEN] = bytes
            .try_into()
            .map_err(|_| CryptoError::SignatureLength(bytes.len()))?;
        Ok(Self(ed25519_dalek::Signature::from_bytes(&bytes)))
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_bytes().to_vec()
    }
}

impl fmt::Debug for PackageSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PackageSignature({}..)", hex::encode(&self.0.to_bytes()[..6]))
    }
}
