//! Signature verification for trace warning packages.
//!
//! Every package the server publishes carries a detached Ed25519 signature
//! over its payload. A package that fails verification is never persisted.

pub mod keys;
pub mod verifier;

pub use keys::{CryptoError, PackageSignature, PublisherKey, TrustedKey, KEY_LEN, SIGNATURE_LEN};
pub use verifier::{Ed25519PackageVerifier, PackageVerifier};
