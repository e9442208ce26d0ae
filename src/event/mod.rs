//! The key event data model.
//!
//! A `KeyEvent` is one node of an identifier's append-only log. Its
//! canonical bytes are produced once by the [`wire`] serializer and carried
//! with the event; digests and signatures are always computed over those
//! bytes, never over a re-serialization. The event kinds form a tagged
//! union so the validator's per-kind rules are checked for exhaustiveness
//! at compile time.

pub mod builder;
pub mod wire;

use crate::{
    commitment::KeyConfigurationDigest,
    crypto::{CryptoProvider, Digest, DigestAlgo, KeyPair, PublicKey, Signature},
    error::{Error, Result},
    identifier::{BasicIdentifier, Identifier},
    threshold::SigningThreshold,
};
use getset::Getters;
use std::collections::{BTreeMap, BTreeSet};

pub use wire::Format;

/// Configuration traits an identifier can declare at inception.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfigurationTrait {
    /// Only establishment events may ever appear in this log.
    EstablishmentOnly,
    /// This identifier must not act as a delegator.
    DoNotDelegate,
}

impl ConfigurationTrait {
    pub fn code(&self) -> &'static str {
        match self {
            Self::EstablishmentOnly => "EO",
            Self::DoNotDelegate => "DND",
        }
    }

    pub fn from_code(code: &str) -> Result<Self> {
        match code {
            "EO" => Ok(Self::EstablishmentOnly),
            "DND" => Ok(Self::DoNotDelegate),
            _ => Err(Error::UnknownConfigurationTrait(code.into())),
        }
    }
}

/// The canonical address of one logged event: who, where in the log, and a
/// digest of the exact bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Getters)]
#[getset(get = "pub")]
pub struct KeyEventCoordinates {
    /// The identifier whose log contains the event
    identifier: Identifier,
    /// Position in that identifier's log
    sequence_number: u64,
    /// Digest of the event's canonical bytes
    digest: Digest,
}

impl KeyEventCoordinates {
    pub fn new(identifier: Identifier, sequence_number: u64, digest: Digest) -> Self {
        Self {
            identifier,
            sequence_number,
            digest,
        }
    }
}

/// Where in a delegator's log the approval seal for a delegated event
/// lives. This is a location, not full coordinates: the delegating event
/// seals the delegated event's digest, so carrying the delegating event's
/// digest here would make each event's bytes depend on the other's.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Getters)]
#[getset(get = "pub")]
pub struct DelegatingLocation {
    /// The delegating identifier
    identifier: Identifier,
    /// Position of the approving event in the delegator's log
    sequence_number: u64,
}

impl DelegatingLocation {
    pub fn new(identifier: Identifier, sequence_number: u64) -> Self {
        Self {
            identifier,
            sequence_number,
        }
    }
}

/// An anchor embedding an external commitment into the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seal {
    /// A bare digest of some external datum
    Digest { digest: Digest },
    /// A reference to an event in some (possibly other) identifier's log
    Coordinates(KeyEventCoordinates),
    /// The root of a Merkle tree of external data
    MerkleRoot { root: Digest },
}

/// Payload of an inception (or delegated inception) event.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct InceptionData {
    signing_threshold: SigningThreshold,
    keys: Vec<PublicKey>,
    next_key_commitment: Option<KeyConfigurationDigest>,
    witness_threshold: u32,
    witnesses: Vec<BasicIdentifier>,
    config_traits: BTreeSet<ConfigurationTrait>,
}

impl InceptionData {
    pub fn new(
        signing_threshold: SigningThreshold,
        keys: Vec<PublicKey>,
        next_key_commitment: Option<KeyConfigurationDigest>,
        witness_threshold: u32,
        witnesses: Vec<BasicIdentifier>,
        config_traits: BTreeSet<ConfigurationTrait>,
    ) -> Self {
        Self {
            signing_threshold,
            keys,
            next_key_commitment,
            witness_threshold,
            witnesses,
            config_traits,
        }
    }
}

/// Payload of a rotation (or delegated rotation) event.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct RotationData {
    signing_threshold: SigningThreshold,
    keys: Vec<PublicKey>,
    next_key_commitment: Option<KeyConfigurationDigest>,
    witness_threshold: u32,
    removed_witnesses: Vec<BasicIdentifier>,
    added_witnesses: Vec<BasicIdentifier>,
    seals: Vec<Seal>,
}

impl RotationData {
    pub fn new(
        signing_threshold: SigningThreshold,
        keys: Vec<PublicKey>,
        next_key_commitment: Option<KeyConfigurationDigest>,
        witness_threshold: u32,
        removed_witnesses: Vec<BasicIdentifier>,
        added_witnesses: Vec<BasicIdentifier>,
        seals: Vec<Seal>,
    ) -> Self {
        Self {
            signing_threshold,
            keys,
            next_key_commitment,
            witness_threshold,
            removed_witnesses,
            added_witnesses,
            seals,
        }
    }
}

/// Payload of an interaction event: anchors only, no authority change.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct InteractionData {
    seals: Vec<Seal>,
}

impl InteractionData {
    pub fn new(seals: Vec<Seal>) -> Self {
        Self { seals }
    }
}

/// Payload of a witness receipt: which event is being corroborated.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct ReceiptData {
    receipted: KeyEventCoordinates,
}

impl ReceiptData {
    pub fn new(receipted: KeyEventCoordinates) -> Self {
        Self { receipted }
    }
}

/// Payload of a receipt issued by a transferable identifier: the receipted
/// event plus the issuer's establishment event, whose keys verify the
/// attached signature.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct ValidatorReceiptData {
    receipted: KeyEventCoordinates,
    validator: KeyEventCoordinates,
}

impl ValidatorReceiptData {
    pub fn new(receipted: KeyEventCoordinates, validator: KeyEventCoordinates) -> Self {
        Self { receipted, validator }
    }
}

/// Everything a key event can be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventBody {
    Inception(InceptionData),
    Rotation(RotationData),
    Interaction(InteractionData),
    DelegatedInception {
        data: InceptionData,
        /// Where in the delegator's log the approval seal lives
        delegating: DelegatingLocation,
    },
    DelegatedRotation {
        data: RotationData,
        delegating: DelegatingLocation,
    },
    Receipt(ReceiptData),
    ValidatorReceipt(ValidatorReceiptData),
}

/// The three-letter wire codes for each event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Inception,
    Rotation,
    Interaction,
    DelegatedInception,
    DelegatedRotation,
    Receipt,
    ValidatorReceipt,
}

impl EventType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Inception => "icp",
            Self::Rotation => "rot",
            Self::Interaction => "ixn",
            Self::DelegatedInception => "dip",
            Self::DelegatedRotation => "drt",
            Self::Receipt => "rct",
            Self::ValidatorReceipt => "vrc",
        }
    }

    pub fn from_code(code: &str) -> Result<Self> {
        match code {
            "icp" => Ok(Self::Inception),
            "rot" => Ok(Self::Rotation),
            "ixn" => Ok(Self::Interaction),
            "dip" => Ok(Self::DelegatedInception),
            "drt" => Ok(Self::DelegatedRotation),
            "rct" => Ok(Self::Receipt),
            "vrc" => Ok(Self::ValidatorReceipt),
            _ => Err(Error::UnknownEventType(code.into())),
        }
    }
}

impl EventBody {
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Inception(..) => EventType::Inception,
            Self::Rotation(..) => EventType::Rotation,
            Self::Interaction(..) => EventType::Interaction,
            Self::DelegatedInception { .. } => EventType::DelegatedInception,
            Self::DelegatedRotation { .. } => EventType::DelegatedRotation,
            Self::Receipt(..) => EventType::Receipt,
            Self::ValidatorReceipt(..) => EventType::ValidatorReceipt,
        }
    }

    /// Establishment events are the only place signing authority changes.
    pub fn is_establishment(&self) -> bool {
        matches!(
            self,
            Self::Inception(..) | Self::Rotation(..) | Self::DelegatedInception { .. } | Self::DelegatedRotation { .. }
        )
    }
}

/// One signed, canonically serialized key event.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct KeyEvent {
    /// The identifier whose log this event belongs to
    identifier: Identifier,
    /// Position in the log, starting at zero
    sequence_number: u64,
    /// Coordinates of the immediately prior event; `None` only at inception
    previous: Option<KeyEventCoordinates>,
    /// The typed payload
    body: EventBody,
    /// Which serialization backend produced `bytes`
    format: Format,
    /// The exact canonical bytes that were (or will be) signed
    bytes: Vec<u8>,
    /// Digest of `bytes`, computed eagerly at construction
    digest: Digest,
    /// Attached signatures, key index → signature
    signatures: BTreeMap<u32, Signature>,
}

impl KeyEvent {
    /// Assemble an event from its parts. The digest over the canonical
    /// bytes is computed here, once; for a self-addressing identifier it
    /// uses the identifier's own algorithm so the event's address and its
    /// identifier agree on a hash function.
    pub(crate) fn new(
        identifier: Identifier,
        sequence_number: u64,
        previous: Option<KeyEventCoordinates>,
        body: EventBody,
        format: Format,
        bytes: Vec<u8>,
        provider: &dyn CryptoProvider,
    ) -> Result<Self> {
        let algo = match &identifier {
            Identifier::SelfAddressing(sa) => sa.digest().algo(),
            _ => DigestAlgo::Blake3_256,
        };
        let digest = provider.digest(algo, &bytes)?;
        Ok(Self {
            identifier,
            sequence_number,
            previous,
            body,
            format,
            bytes,
            digest,
            signatures: BTreeMap::new(),
        })
    }

    /// The canonical address of this event.
    pub fn coordinates(&self) -> KeyEventCoordinates {
        KeyEventCoordinates::new(self.identifier.clone(), self.sequence_number, self.digest.clone())
    }

    /// Sign this event's canonical bytes as the key at `index`. Consumes
    /// the event and returns it with the signature attached.
    pub fn sign(self, index: u32, keypair: &KeyPair) -> Result<Self> {
        let signature = keypair.sign(&self.bytes);
        self.with_signature(index, signature)
    }

    /// Attach an externally produced signature for the key at `index`.
    pub fn with_signature(mut self, index: u32, signature: Signature) -> Result<Self> {
        if self.signatures.contains_key(&index) {
            Err(Error::DuplicateSignature)?;
        }
        self.signatures.insert(index, signature);
        Ok(self)
    }

    pub fn is_establishment(&self) -> bool {
        self.body.is_establishment()
    }

    /// The signing threshold this event declares, if it is an
    /// establishment event.
    pub fn signing_threshold(&self) -> Option<&SigningThreshold> {
        match &self.body {
            EventBody::Inception(data) | EventBody::DelegatedInception { data, .. } => Some(data.signing_threshold()),
            EventBody::Rotation(data) | EventBody::DelegatedRotation { data, .. } => Some(data.signing_threshold()),
            _ => None,
        }
    }

    /// The key list this event declares, if it is an establishment event.
    pub fn current_keys(&self) -> Option<&[PublicKey]> {
        match &self.body {
            EventBody::Inception(data) | EventBody::DelegatedInception { data, .. } => Some(data.keys()),
            EventBody::Rotation(data) | EventBody::DelegatedRotation { data, .. } => Some(data.keys()),
            _ => None,
        }
    }

    /// The next-key commitment this event publishes, if any.
    pub fn next_key_commitment(&self) -> Option<&KeyConfigurationDigest> {
        match &self.body {
            EventBody::Inception(data) | EventBody::DelegatedInception { data, .. } => data.next_key_commitment().as_ref(),
            EventBody::Rotation(data) | EventBody::DelegatedRotation { data, .. } => data.next_key_commitment().as_ref(),
            _ => None,
        }
    }

    /// The seals anchored by this event.
    pub fn seals(&self) -> &[Seal] {
        match &self.body {
            EventBody::Rotation(data) | EventBody::DelegatedRotation { data, .. } => data.seals(),
            EventBody::Interaction(data) => data.seals(),
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test;

    #[test]
    fn event_type_codes_round_trip() {
        for ty in [
            EventType::Inception,
            EventType::Rotation,
            EventType::Interaction,
            EventType::DelegatedInception,
            EventType::DelegatedRotation,
            EventType::Receipt,
            EventType::ValidatorReceipt,
        ] {
            assert_eq!(EventType::from_code(ty.code()).unwrap(), ty);
        }
        assert_eq!(
            EventType::from_code("zzz").err(),
            Some(Error::UnknownEventType("zzz".into()))
        );
    }

    #[test]
    fn config_trait_codes_round_trip() {
        for t in [ConfigurationTrait::EstablishmentOnly, ConfigurationTrait::DoNotDelegate] {
            assert_eq!(ConfigurationTrait::from_code(t.code()).unwrap(), t);
        }
        assert_eq!(
            ConfigurationTrait::from_code("XX").err(),
            Some(Error::UnknownConfigurationTrait("XX".into()))
        );
    }

    #[test]
    fn duplicate_signature_rejected() {
        let keypair = test::keypair(1);
        let event = test::simple_inception(&[&keypair]);
        let signed = event.sign(0, &keypair).unwrap();
        assert_eq!(signed.signatures().len(), 1);
        let res = signed.sign(0, &keypair);
        assert_eq!(res.err(), Some(Error::DuplicateSignature));
    }

    #[test]
    fn coordinates_address_the_bytes() {
        let keypair = test::keypair(2);
        let event = test::simple_inception(&[&keypair]);
        let coords = event.coordinates();
        assert_eq!(coords.identifier(), event.identifier());
        assert_eq!(*coords.sequence_number(), 0);
        assert_eq!(coords.digest(), event.digest());
    }
}
