//! The cryptographic capability layer.
//!
//! The verification core never calls a primitive crate directly; everything
//! flows through the [`CryptoProvider`] trait so the validator, identifier
//! deriver, and commitment digester stay testable against fake algorithms.
//! [`StandardProvider`] is the batteries-included implementation. Providers
//! are plain values handed to the components that need them, never
//! process-wide singletons.

pub mod digest;
pub mod material;
pub mod sign;

use crate::error::{Error, Result};
pub use digest::{Digest, DigestAlgo};
pub use material::MaterialCode;
pub use sign::{KeyPair, PublicKey, Signature, SignatureAlgo};

/// The capability contract the core consumes: compute digests, verify
/// signatures. Implementations must be pure and thread-safe.
pub trait CryptoProvider {
    /// Digest `data` under `algo`.
    fn digest(&self, algo: DigestAlgo, data: &[u8]) -> Result<Digest>;

    /// Verify a detached signature. Returns `Ok(())` only when the
    /// signature verifies; a failed verification is an error, not a bool.
    fn verify(&self, key: &PublicKey, signature: &Signature, data: &[u8]) -> Result<()>;
}

/// Provider backed by the real primitive crates: blake3, sha2, sha3 for
/// digests and ed25519-consensus for signatures.
#[derive(Debug, Clone, Default)]
pub struct StandardProvider;

impl StandardProvider {
    pub fn new() -> Self {
        Self
    }
}

impl CryptoProvider for StandardProvider {
    fn digest(&self, algo: DigestAlgo, data: &[u8]) -> Result<Digest> {
        let bytes: [u8; 32] = match algo {
            DigestAlgo::Blake3_256 => *blake3::hash(data).as_bytes(),
            DigestAlgo::Sha3_256 => {
                use sha3::Digest as _;
                sha3::Sha3_256::digest(data).into()
            }
            DigestAlgo::Sha2_256 => {
                use sha2::Digest as _;
                sha2::Sha256::digest(data).into()
            }
        };
        Ok(Digest::new(algo, bytes))
    }

    fn verify(&self, key: &PublicKey, signature: &Signature, data: &[u8]) -> Result<()> {
        match (key.algo(), signature.algo()) {
            (SignatureAlgo::Ed25519, SignatureAlgo::Ed25519) => {
                let key_bytes: [u8; 32] = key.as_bytes().try_into().map_err(|_| Error::BadLength)?;
                let vk = ed25519_consensus::VerificationKey::try_from(key_bytes)
                    .map_err(|_| Error::CryptoSignatureVerificationFailed)?;
                let sig_bytes: [u8; 64] = signature.as_bytes().try_into().map_err(|_| Error::BadLength)?;
                let sig = ed25519_consensus::Signature::from(sig_bytes);
                vk.verify(&sig, data)
                    .map_err(|_| Error::CryptoSignatureVerificationFailed)?;
                Ok(())
            }
        }
    }
}
