//! Digest algorithms and the `Digest` type that carries their output.
//!
//! A digest always knows which algorithm produced it, so a verifier can
//! recompute under exactly that algorithm. There is deliberately no
//! re-hash-under-alternate-algorithms fallback here.

use crate::{
    crypto::material::{self, MaterialCode},
    error::{Error, Result},
};
use std::fmt;

/// The digest algorithms this crate can speak. Adding a variant means adding
/// a material code and a provider arm, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DigestAlgo {
    /// Blake3, 256-bit output
    Blake3_256,
    /// SHA3-256
    Sha3_256,
    /// SHA2-256
    Sha2_256,
}

impl DigestAlgo {
    /// The qualified-material code prefix for digests under this algorithm.
    pub fn code(&self) -> MaterialCode {
        match self {
            Self::Blake3_256 => MaterialCode::Blake3_256Digest,
            Self::Sha3_256 => MaterialCode::Sha3_256Digest,
            Self::Sha2_256 => MaterialCode::Sha2_256Digest,
        }
    }

    /// Raw output length in bytes.
    pub fn raw_len(&self) -> usize {
        32
    }

    /// Length of the qualified text form of a digest under this algorithm.
    pub fn qualified_len(&self) -> usize {
        material::qualified_len(self.code(), self.raw_len())
    }
}

/// A digest: algorithm tag plus output bytes. Equality is by both, so two
/// digests of the same bytes under different algorithms never compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Digest {
    algo: DigestAlgo,
    bytes: [u8; 32],
}

impl Digest {
    pub fn new(algo: DigestAlgo, bytes: [u8; 32]) -> Self {
        Self { algo, bytes }
    }

    pub(crate) fn from_slice(algo: DigestAlgo, slice: &[u8]) -> Result<Self> {
        let bytes: [u8; 32] = slice.try_into().map_err(|_| Error::BadLength)?;
        Ok(Self { algo, bytes })
    }

    pub fn algo(&self) -> DigestAlgo {
        self.algo
    }

    /// Return the byte slice representing this digest.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The qualified text form: code prefix + base64 of the raw bytes.
    pub fn qualified(&self) -> String {
        material::qualify(self.algo.code(), &self.bytes)
    }
}

impl TryFrom<&str> for Digest {
    type Error = Error;

    fn try_from(string: &str) -> std::result::Result<Self, Self::Error> {
        let (code, raw) = material::dequalify(string)?;
        let algo = match code {
            MaterialCode::Blake3_256Digest => DigestAlgo::Blake3_256,
            MaterialCode::Sha3_256Digest => DigestAlgo::Sha3_256,
            MaterialCode::Sha2_256Digest => DigestAlgo::Sha2_256,
            _ => Err(Error::UnknownMaterialCode(string.into()))?,
        };
        Digest::from_slice(algo, &raw)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified())
    }
}
