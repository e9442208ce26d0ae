//! Signing keys, public keys, and signatures.
//!
//! The core only ever *verifies*; signing lives here so event builders and
//! tests can mint material, but nothing in this crate stores keys at rest.

use crate::{
    crypto::material::{self, MaterialCode},
    error::{Error, Result},
};
use rand::{CryptoRng, RngCore};
use std::fmt;

/// Signature algorithms. One entry today; the enum keeps the wire codes and
/// validator honest about which algorithm produced what.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureAlgo {
    /// Ed25519
    Ed25519,
}

impl SignatureAlgo {
    /// Material code for a verification key under this algorithm.
    pub fn key_code(&self) -> MaterialCode {
        match self {
            Self::Ed25519 => MaterialCode::Ed25519PublicKey,
        }
    }

    /// Material code for a basic (non-transferable) identifier wrapping a
    /// key under this algorithm.
    pub fn basic_code(&self) -> MaterialCode {
        match self {
            Self::Ed25519 => MaterialCode::BasicEd25519,
        }
    }

    /// Material code for a signature under this algorithm.
    pub fn signature_code(&self) -> MaterialCode {
        match self {
            Self::Ed25519 => MaterialCode::Ed25519Signature,
        }
    }

    /// Raw signature length in bytes.
    pub fn signature_len(&self) -> usize {
        match self {
            Self::Ed25519 => 64,
        }
    }
}

/// A verification (public) key. Equality is by algorithm and key bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PublicKey {
    algo: SignatureAlgo,
    bytes: [u8; 32],
}

impl PublicKey {
    pub fn new(algo: SignatureAlgo, bytes: [u8; 32]) -> Self {
        Self { algo, bytes }
    }

    pub fn algo(&self) -> SignatureAlgo {
        self.algo
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Qualified text form as a key-list entry.
    pub fn qualified(&self) -> String {
        material::qualify(self.algo.key_code(), &self.bytes)
    }
}

impl TryFrom<&str> for PublicKey {
    type Error = Error;

    fn try_from(string: &str) -> std::result::Result<Self, Self::Error> {
        let (code, raw) = material::dequalify(string)?;
        let algo = match code {
            MaterialCode::Ed25519PublicKey | MaterialCode::BasicEd25519 => SignatureAlgo::Ed25519,
            _ => Err(Error::UnknownMaterialCode(string.into()))?,
        };
        let bytes: [u8; 32] = raw.as_slice().try_into().map_err(|_| Error::BadLength)?;
        Ok(Self { algo, bytes })
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified())
    }
}

/// A detached signature. Equality is by algorithm and signature bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    algo: SignatureAlgo,
    bytes: [u8; 64],
}

impl Signature {
    pub fn new(algo: SignatureAlgo, bytes: [u8; 64]) -> Self {
        Self { algo, bytes }
    }

    pub fn algo(&self) -> SignatureAlgo {
        self.algo
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Qualified text form.
    pub fn qualified(&self) -> String {
        material::qualify(self.algo.signature_code(), &self.bytes)
    }
}

impl TryFrom<&str> for Signature {
    type Error = Error;

    fn try_from(string: &str) -> std::result::Result<Self, Self::Error> {
        let (code, raw) = material::dequalify(string)?;
        let algo = match code {
            MaterialCode::Ed25519Signature => SignatureAlgo::Ed25519,
            _ => Err(Error::UnknownMaterialCode(string.into()))?,
        };
        let bytes: [u8; 64] = raw.as_slice().try_into().map_err(|_| Error::BadLength)?;
        Ok(Self { algo, bytes })
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified())
    }
}

/// An in-memory signing keypair. Event builders use this to sign canonical
/// bytes and to self-sign inception statements.
pub struct KeyPair {
    public: PublicKey,
    secret: ed25519_consensus::SigningKey,
}

impl KeyPair {
    fn from_signing_key(secret: ed25519_consensus::SigningKey) -> Self {
        let public = PublicKey::new(SignatureAlgo::Ed25519, secret.verification_key().to_bytes());
        Self { public, secret }
    }

    /// Create a new ed25519 keypair
    pub fn new_ed25519<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut randbuf = [0u8; 32];
        rng.fill_bytes(&mut randbuf);
        Self::from_signing_key(ed25519_consensus::SigningKey::from(randbuf))
    }

    /// Create a new ed25519 keypair from a cryptographic seed
    pub fn new_ed25519_from_bytes(seed: [u8; 32]) -> Self {
        Self::from_signing_key(ed25519_consensus::SigningKey::from(seed))
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Sign a byte sequence with this keypair.
    pub fn sign(&self, data: &[u8]) -> Signature {
        Signature::new(SignatureAlgo::Ed25519, self.secret.sign(data).to_bytes())
    }
}

impl Clone for KeyPair {
    fn clone(&self) -> Self {
        Self {
            public: self.public.clone(),
            secret: ed25519_consensus::SigningKey::from(self.secret.to_bytes()),
        }
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair").field("public", &self.public).finish()
    }
}
