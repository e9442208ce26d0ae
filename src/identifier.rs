//! Identifiers and how they are derived.
//!
//! An identifier is self-certifying: nobody issues it, it falls out of key
//! material or out of the inception event itself. Three variants exist. A
//! Basic identifier wraps a public key verbatim and can never rotate. A
//! SelfAddressing identifier wraps a digest of its own inception event, and
//! a SelfSigning identifier wraps a signature over that event by the sole
//! inception key; both of those are transferable.
//!
//! The self-reference knot (an inception event that contains the
//! identifier which is a function of the event's bytes) is cut with
//! placeholders: the derivation computes over bytes in which the identifier
//! field holds `#` characters of exactly the final qualified length. That
//! length comes from the algorithm's fixed output size, so it is known
//! before any value is.

use crate::{
    crypto::{material, CryptoProvider, Digest, DigestAlgo, PublicKey, Signature},
    error::{Error, Result},
};
use std::fmt;

/// A non-transferable identifier: the public key itself is the identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BasicIdentifier {
    key: PublicKey,
}

impl BasicIdentifier {
    /// Basic derivation: the supplied public key, verbatim. Exactly one key
    /// may be supplied at inception.
    pub fn derive(keys: &[PublicKey]) -> Result<Self> {
        match keys {
            [key] => Ok(Self { key: key.clone() }),
            _ => Err(Error::IdentifierKeyCount),
        }
    }

    pub fn new(key: PublicKey) -> Self {
        Self { key }
    }

    pub fn key(&self) -> &PublicKey {
        &self.key
    }

    pub fn qualified(&self) -> String {
        material::qualify(self.key.algo().basic_code(), self.key.as_bytes())
    }
}

impl fmt::Display for BasicIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified())
    }
}

/// A transferable identifier addressing its own inception event by digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelfAddressingIdentifier {
    digest: Digest,
}

impl SelfAddressingIdentifier {
    /// SelfAddressing derivation: digest the placeholder-bearing inception
    /// bytes under the configured algorithm.
    pub fn derive(algo: DigestAlgo, placeholder_bytes: &[u8], provider: &dyn CryptoProvider) -> Result<Self> {
        Ok(Self {
            digest: provider.digest(algo, placeholder_bytes)?,
        })
    }

    pub fn new(digest: Digest) -> Self {
        Self { digest }
    }

    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    pub fn qualified(&self) -> String {
        self.digest.qualified()
    }
}

/// A transferable identifier carrying the initial key's signature over its
/// own inception event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelfSigningIdentifier {
    signature: Signature,
}

impl SelfSigningIdentifier {
    pub fn new(signature: Signature) -> Self {
        Self { signature }
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn qualified(&self) -> String {
        self.signature.qualified()
    }
}

/// The identifier sum type. Equality is defined per-variant by the wrapped
/// cryptographic material.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    Basic(BasicIdentifier),
    SelfAddressing(SelfAddressingIdentifier),
    SelfSigning(SelfSigningIdentifier),
}

impl Identifier {
    /// Whether this identifier variant permits rotation at all. Whether a
    /// particular key state can actually rotate also requires a standing
    /// next-key commitment; see `KeyState::transferable`.
    pub fn transferable(&self) -> bool {
        !matches!(self, Self::Basic(..))
    }

    /// Qualified text form of this identifier.
    pub fn qualified(&self) -> String {
        match self {
            Self::Basic(basic) => basic.qualified(),
            Self::SelfAddressing(sa) => sa.qualified(),
            Self::SelfSigning(ss) => ss.qualified(),
        }
    }
}

impl TryFrom<&str> for Identifier {
    type Error = Error;

    fn try_from(string: &str) -> std::result::Result<Self, Self::Error> {
        use crate::crypto::MaterialCode;
        let (code, _) = material::dequalify(string)?;
        match code {
            MaterialCode::BasicEd25519 => Ok(Self::Basic(BasicIdentifier::new(PublicKey::try_from(string)?))),
            MaterialCode::Blake3_256Digest | MaterialCode::Sha3_256Digest | MaterialCode::Sha2_256Digest => Ok(
                Self::SelfAddressing(SelfAddressingIdentifier::new(Digest::try_from(string)?)),
            ),
            MaterialCode::Ed25519Signature => Ok(Self::SelfSigning(SelfSigningIdentifier::new(
                Signature::try_from(string)?,
            ))),
            _ => Err(Error::UnknownMaterialCode(string.into())),
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified())
    }
}

/// Which derivation an inception wants, chosen before the event exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierDerivation {
    /// Identifier = the single public key, verbatim
    Basic,
    /// Identifier = digest of the inception bytes under this algorithm
    SelfAddressing(DigestAlgo),
    /// Identifier = the single key's signature over the inception bytes
    SelfSigning,
}

impl IdentifierDerivation {
    /// The exact length the qualified identifier will occupy, computed from
    /// the algorithm alone. This is what the serializer substitutes `#`
    /// characters for while the identifier is still unknown.
    pub fn placeholder_len(&self, keys: &[PublicKey]) -> Result<usize> {
        match self {
            Self::Basic => match keys {
                [key] => Ok(material::qualified_len(key.algo().basic_code(), key.as_bytes().len())),
                _ => Err(Error::IdentifierKeyCount),
            },
            Self::SelfAddressing(algo) => Ok(algo.qualified_len()),
            Self::SelfSigning => match keys {
                [key] => Ok(material::qualified_len(
                    key.algo().signature_code(),
                    key.algo().signature_len(),
                )),
                _ => Err(Error::IdentifierKeyCount),
            },
        }
    }
}
