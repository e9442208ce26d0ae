//! Qualified compact encoding for cryptographic material.
//!
//! Every key, digest, and signature that appears inside an event travels as
//! text: a short code prefix naming the algorithm and material kind,
//! concatenated with the URL-safe unpadded base64 of the raw bytes. Decoding
//! dispatches purely on the prefix.
//!
//! The code table also answers a sizing question the identifier deriver
//! depends on: how long will the qualified form of a piece of material be,
//! given only its algorithm? That length is a function of the code and the
//! algorithm's fixed output size, never of any particular value, which is
//! what makes placeholder-based self-referential serialization sound.

use crate::{
    error::{Error, Result},
    util::ser,
};

/// Code prefixes for the material kinds this crate produces or consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialCode {
    /// Ed25519 public key serving as a non-transferable basic identifier
    BasicEd25519,
    /// Ed25519 verification key (entries of an event's key list)
    Ed25519PublicKey,
    /// Blake3-256 digest
    Blake3_256Digest,
    /// SHA3-256 digest
    Sha3_256Digest,
    /// SHA2-256 digest
    Sha2_256Digest,
    /// Ed25519 signature
    Ed25519Signature,
}

impl MaterialCode {
    /// The text prefix for this code.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::BasicEd25519 => "B",
            Self::Ed25519PublicKey => "D",
            Self::Blake3_256Digest => "E",
            Self::Sha3_256Digest => "F",
            Self::Sha2_256Digest => "G",
            Self::Ed25519Signature => "0B",
        }
    }

    /// Expected raw byte length of material carrying this code.
    pub fn raw_len(&self) -> usize {
        match self {
            Self::BasicEd25519 | Self::Ed25519PublicKey => 32,
            Self::Blake3_256Digest | Self::Sha3_256Digest | Self::Sha2_256Digest => 32,
            Self::Ed25519Signature => 64,
        }
    }

    fn from_prefix(text: &str) -> Option<Self> {
        // two-character codes start with a digit, so try those first
        let two = text.get(0..2);
        if two == Some("0B") {
            return Some(Self::Ed25519Signature);
        }
        match text.get(0..1)? {
            "B" => Some(Self::BasicEd25519),
            "D" => Some(Self::Ed25519PublicKey),
            "E" => Some(Self::Blake3_256Digest),
            "F" => Some(Self::Sha3_256Digest),
            "G" => Some(Self::Sha2_256Digest),
            _ => None,
        }
    }
}

/// Qualify raw bytes under a code: prefix + base64.
pub(crate) fn qualify(code: MaterialCode, raw: &[u8]) -> String {
    format!("{}{}", code.prefix(), ser::base64_encode(raw))
}

/// Split a qualified string back into its code and raw bytes, dispatching on
/// the prefix alone.
pub(crate) fn dequalify(text: &str) -> Result<(MaterialCode, Vec<u8>)> {
    let code = MaterialCode::from_prefix(text).ok_or_else(|| Error::UnknownMaterialCode(text.into()))?;
    let raw = ser::base64_decode(&text[code.prefix().len()..])?;
    if raw.len() != code.raw_len() {
        Err(Error::BadLength)?;
    }
    Ok((code, raw))
}

/// The length of the qualified form for material of `raw_len` bytes under
/// `code`. Depends only on the algorithm, never on a value.
pub(crate) fn qualified_len(code: MaterialCode, raw_len: usize) -> usize {
    code.prefix().len() + ser::base64_len(raw_len)
}

/// A placeholder occupying exactly the space the real qualified material
/// will: `#` repeated to the qualified length.
pub(crate) fn placeholder(len: usize) -> String {
    "#".repeat(len)
}
