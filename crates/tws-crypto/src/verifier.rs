use tracing::debug;

use crate::keys::{CryptoError, PackageSignature, TrustedKey};

/// Checks a package payload against its detached signature.
///
/// Implementations are pure: the same bytes always produce the same answer.
pub trait PackageVerifier: Send + Sync {
    /// Returns `true` only if `signature` is a valid signature over `bin`.
    fn verify(&self, bin: &[u8], signature: &[u8]) -> bool;
}

/// Ed25519 verifier over a set of trusted publisher keys.
///
/// A signature is accepted if any trusted key validates it.
#[derive(Clone, Debug)]
pub struct Ed25519PackageVerifier {
    trusted: Vec<TrustedKey>,
}

impl Ed25519PackageVerifier {
    pub fn new(trusted: Vec<TrustedKey>) -> Self {
        Self { trusted }
    }

    /// Build from hex-encoded public keys.
    pub fn from_hex_keys<S: AsRef<str>>(keys: &[S]) -> Result<Self, CryptoError> {
        let trusted = keys
            .iter()
            .map(|k| TrustedKey::from_hex(k.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(trusted))
    }

    pub fn trusted_keys(&self) -> &[TrustedKey] {
        &self.trusted
    }
}

impl PackageVerifier for Ed25519PackageVerifier {
    fn verify(&self, bin: &[u8], signature: &[u8]) -> bool {
        let signature = match PackageSignature::from_slice(signature) {
            Ok(sig) => sig,
            Err(e) => {
                debug!(error = %e, "rejecting malformed package signature");
                return false;
            }
        };
        match self.trusted.iter().find(|key| key.accepts(bin, &signature)) {
            Some(key) => {
                debug!(key = %key.fingerprint(), "package signature accepted");
                true
            }
            None => false,
        }
    }
}
