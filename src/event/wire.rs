//! Canonical event serialization.
//!
//! Every event has exactly one byte form per format backend, and that form
//! is what gets digested and signed. Field order is fixed by the wire
//! structs below (serde keeps struct field order in all three backends),
//! and the version string at the head carries a fixed-width size field that
//! is zeroed during the first serialization pass and patched in place once
//! the true length is known.
//!
//! The same machinery serves identifier derivation: serializing with a `#`
//! placeholder in the identifier field yields bytes of exactly the length
//! the real event will have, because the placeholder's length is computed
//! from the identifier algorithm rather than from any value.

use crate::{
    commitment::KeyConfigurationDigest,
    crypto::{CryptoProvider, Digest},
    error::{Error, Result},
    event::{
        ConfigurationTrait, DelegatingLocation, EventBody, EventType, InceptionData, InteractionData, KeyEvent,
        KeyEventCoordinates, ReceiptData, RotationData, Seal, ValidatorReceiptData,
    },
    identifier::{BasicIdentifier, Identifier},
    threshold::{SigningThreshold, Weight},
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_derive::Deserialize;
use std::collections::BTreeSet;
use std::str::FromStr;

/// The interchangeable serialization backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Json,
    Cbor,
    MessagePack,
}

impl Format {
    /// The four-letter code embedded in the version string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Cbor => "CBOR",
            Self::MessagePack => "MGPK",
        }
    }

    pub fn from_code(code: &str) -> Result<Self> {
        match code {
            "JSON" => Ok(Self::Json),
            "CBOR" => Ok(Self::Cbor),
            "MGPK" => Ok(Self::MessagePack),
            _ => Err(Error::UnknownFormat(code.into())),
        }
    }
}

/// `KERI10<FMT4><size6>_`, seventeen ASCII characters, always.
pub(crate) fn version_string(format: Format, size: usize) -> String {
    format!("KERI10{}{:06x}_", format.code(), size)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct VersionInfo {
    pub(crate) format: Format,
    pub(crate) size: usize,
}

fn parse_version(text: &str) -> Result<VersionInfo> {
    if text.len() != 17 || !text.starts_with("KERI10") || !text.ends_with('_') {
        Err(Error::VersionMalformed)?;
    }
    let format = Format::from_code(&text[6..10])?;
    let size = usize::from_str_radix(&text[10..16], 16).map_err(|_| Error::VersionMalformed)?;
    Ok(VersionInfo { format, size })
}

/// Find and parse the version string in the leading bytes of a serialized
/// event, whatever the format. The version value is plain ASCII in all
/// three backends, so a byte scan is format-agnostic.
pub(crate) fn sniff_version(bytes: &[u8]) -> Result<VersionInfo> {
    let window = &bytes[..bytes.len().min(64)];
    let pos = window
        .windows(6)
        .position(|w| w == b"KERI10")
        .ok_or(Error::VersionMalformed)?;
    let raw = window.get(pos..pos + 17).ok_or(Error::VersionMalformed)?;
    let text = std::str::from_utf8(raw).map_err(|_| Error::VersionMalformed)?;
    parse_version(text)
}

fn hex(value: u64) -> String {
    format!("{:x}", value)
}

fn parse_hex(text: &str) -> Result<u64> {
    u64::from_str_radix(text, 16).map_err(|_| Error::SequenceMalformed(text.into()))
}

fn parse_hex_u32(text: &str) -> Result<u32> {
    u32::from_str_radix(text, 16).map_err(|_| Error::SequenceMalformed(text.into()))
}

// ---------------------------------------------------------------------------
// wire structs: field declaration order IS the canonical field order
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum ThresholdWire {
    Count(String),
    Weighted(Vec<Vec<String>>),
}

impl ThresholdWire {
    fn from_threshold(threshold: &SigningThreshold) -> Self {
        match threshold {
            SigningThreshold::Unweighted { threshold } => Self::Count(hex(*threshold as u64)),
            SigningThreshold::Weighted { clauses } => Self::Weighted(
                clauses
                    .iter()
                    .map(|clause| clause.iter().map(|w| w.to_string()).collect())
                    .collect(),
            ),
        }
    }

    fn into_threshold(self) -> Result<SigningThreshold> {
        match self {
            Self::Count(text) => Ok(SigningThreshold::unweighted(parse_hex_u32(&text)?)),
            Self::Weighted(clauses) => {
                let parsed = clauses
                    .into_iter()
                    .map(|clause| clause.iter().map(|w| Weight::from_str(w)).collect::<Result<Vec<_>>>())
                    .collect::<Result<Vec<_>>>()?;
                SigningThreshold::weighted(parsed)
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CoordinatesWire {
    i: String,
    s: String,
    d: String,
}

impl CoordinatesWire {
    fn from_coordinates(coordinates: &KeyEventCoordinates) -> Self {
        Self {
            i: coordinates.identifier().qualified(),
            s: hex(*coordinates.sequence_number()),
            d: coordinates.digest().qualified(),
        }
    }

    fn into_coordinates(self) -> Result<KeyEventCoordinates> {
        Ok(KeyEventCoordinates::new(
            Identifier::try_from(self.i.as_str())?,
            parse_hex(&self.s)?,
            Digest::try_from(self.d.as_str())?,
        ))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LocationWire {
    i: String,
    s: String,
}

impl LocationWire {
    fn from_location(location: &DelegatingLocation) -> Self {
        Self {
            i: location.identifier().qualified(),
            s: hex(*location.sequence_number()),
        }
    }

    fn into_location(self) -> Result<DelegatingLocation> {
        Ok(DelegatingLocation::new(
            Identifier::try_from(self.i.as_str())?,
            parse_hex(&self.s)?,
        ))
    }
}

// Coordinates must be tried first: untagged matching ignores unknown
// fields, so a bare-digest variant would otherwise swallow {i, s, d} maps.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum SealWire {
    Coordinates { i: String, s: String, d: String },
    Digest { d: String },
    MerkleRoot { rd: String },
}

impl SealWire {
    fn from_seal(seal: &Seal) -> Self {
        match seal {
            Seal::Coordinates(coordinates) => {
                let wire = CoordinatesWire::from_coordinates(coordinates);
                Self::Coordinates {
                    i: wire.i,
                    s: wire.s,
                    d: wire.d,
                }
            }
            Seal::Digest { digest } => Self::Digest { d: digest.qualified() },
            Seal::MerkleRoot { root } => Self::MerkleRoot { rd: root.qualified() },
        }
    }

    fn into_seal(self) -> Result<Seal> {
        match self {
            Self::Coordinates { i, s, d } => Ok(Seal::Coordinates(CoordinatesWire { i, s, d }.into_coordinates()?)),
            Self::Digest { d } => Ok(Seal::Digest {
                digest: Digest::try_from(d.as_str())?,
            }),
            Self::MerkleRoot { rd } => Ok(Seal::MerkleRoot {
                root: Digest::try_from(rd.as_str())?,
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct InceptionWire {
    v: String,
    i: String,
    s: String,
    t: &'static str,
    kt: ThresholdWire,
    k: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    n: Option<String>,
    wt: String,
    w: Vec<String>,
    c: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    da: Option<LocationWire>,
}

#[derive(Debug, Serialize)]
struct RotationWire {
    v: String,
    i: String,
    s: String,
    t: &'static str,
    p: String,
    kt: ThresholdWire,
    k: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    n: Option<String>,
    wt: String,
    wr: Vec<String>,
    wa: Vec<String>,
    a: Vec<SealWire>,
    #[serde(skip_serializing_if = "Option::is_none")]
    da: Option<LocationWire>,
}

#[derive(Debug, Serialize)]
struct InteractionWire {
    v: String,
    i: String,
    s: String,
    t: &'static str,
    p: String,
    a: Vec<SealWire>,
}

#[derive(Debug, Serialize)]
struct ReceiptWire {
    v: String,
    i: String,
    s: String,
    t: &'static str,
    d: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    a: Option<CoordinatesWire>,
}

/// The permissive parse target: every optional field tolerated, then the
/// event type decides which ones were actually required.
#[derive(Debug, Deserialize)]
struct WireEvent {
    #[allow(dead_code)]
    v: String,
    i: String,
    s: String,
    t: String,
    #[serde(default)]
    p: Option<String>,
    #[serde(default)]
    kt: Option<ThresholdWire>,
    #[serde(default)]
    k: Option<Vec<String>>,
    #[serde(default)]
    n: Option<String>,
    #[serde(default)]
    wt: Option<String>,
    #[serde(default)]
    w: Option<Vec<String>>,
    #[serde(default)]
    wr: Option<Vec<String>>,
    #[serde(default)]
    wa: Option<Vec<String>>,
    #[serde(default)]
    c: Option<Vec<String>>,
    #[serde(default)]
    a: Option<AnchorsWire>,
    #[serde(default)]
    d: Option<String>,
    #[serde(default)]
    da: Option<LocationWire>,
}

// `a` holds a seal list on rotation/interaction but a single coordinates
// seal on a validator receipt.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AnchorsWire {
    Seals(Vec<SealWire>),
    Seal(CoordinatesWire),
}

// ---------------------------------------------------------------------------
// encoding backends
// ---------------------------------------------------------------------------

fn encode<T: Serialize>(value: &T, format: Format) -> Result<Vec<u8>> {
    match format {
        Format::Json => Ok(serde_json::to_vec(value)?),
        Format::Cbor => Ok(serde_cbor::to_vec(value)?),
        Format::MessagePack => Ok(rmp_serde::to_vec_named(value)?),
    }
}

fn decode<T: DeserializeOwned>(bytes: &[u8], format: Format) -> Result<T> {
    match format {
        Format::Json => Ok(serde_json::from_slice(bytes)?),
        Format::Cbor => Ok(serde_cbor::from_slice(bytes)?),
        Format::MessagePack => Ok(rmp_serde::from_slice(bytes)?),
    }
}

/// Overwrite the zeroed size field with the true byte length. The patched
/// string has the same width, so the length it reports stays correct.
fn patch_size(mut buf: Vec<u8>, format: Format) -> Result<Vec<u8>> {
    let zeroed = version_string(format, 0);
    let needle = zeroed.as_bytes();
    let pos = buf
        .windows(needle.len())
        .position(|window| window == needle)
        .ok_or(Error::VersionMalformed)?;
    let real = version_string(format, buf.len());
    buf[pos..pos + needle.len()].copy_from_slice(real.as_bytes());
    Ok(buf)
}

fn qualified_keys(keys: &[crate::crypto::PublicKey]) -> Vec<String> {
    keys.iter().map(|k| k.qualified()).collect()
}

fn qualified_witnesses(witnesses: &[BasicIdentifier]) -> Vec<String> {
    witnesses.iter().map(|w| w.qualified()).collect()
}

/// Serialize an event body to its canonical bytes, with `identifier_field`
/// occupying the `i` slot. Callers pass either the real qualified
/// identifier or a placeholder of identical length; the output length is
/// the same either way, which is what keeps the patched size honest.
pub(crate) fn serialize_with_identifier(
    identifier_field: &str,
    sequence_number: u64,
    previous: Option<&Digest>,
    body: &EventBody,
    format: Format,
) -> Result<Vec<u8>> {
    let v = version_string(format, 0);
    let i = identifier_field.to_string();
    let s = hex(sequence_number);
    let t = body.event_type().code();
    let previous_field = || {
        previous
            .map(|digest| digest.qualified())
            .ok_or(Error::EventFieldMissing("p"))
    };
    let buf = match body {
        EventBody::Inception(data) | EventBody::DelegatedInception { data, .. } => {
            let delegating = match body {
                EventBody::DelegatedInception { delegating, .. } => Some(LocationWire::from_location(delegating)),
                _ => None,
            };
            encode(
                &InceptionWire {
                    v,
                    i,
                    s,
                    t,
                    kt: ThresholdWire::from_threshold(data.signing_threshold()),
                    k: qualified_keys(data.keys()),
                    n: data.next_key_commitment().as_ref().map(|c| c.qualified()),
                    wt: hex(*data.witness_threshold() as u64),
                    w: qualified_witnesses(data.witnesses()),
                    c: data.config_traits().iter().map(|t| t.code().to_string()).collect(),
                    da: delegating,
                },
                format,
            )?
        }
        EventBody::Rotation(data) | EventBody::DelegatedRotation { data, .. } => {
            let delegating = match body {
                EventBody::DelegatedRotation { delegating, .. } => Some(LocationWire::from_location(delegating)),
                _ => None,
            };
            encode(
                &RotationWire {
                    v,
                    i,
                    s,
                    t,
                    p: previous_field()?,
                    kt: ThresholdWire::from_threshold(data.signing_threshold()),
                    k: qualified_keys(data.keys()),
                    n: data.next_key_commitment().as_ref().map(|c| c.qualified()),
                    wt: hex(*data.witness_threshold() as u64),
                    wr: qualified_witnesses(data.removed_witnesses()),
                    wa: qualified_witnesses(data.added_witnesses()),
                    a: data.seals().iter().map(SealWire::from_seal).collect(),
                    da: delegating,
                },
                format,
            )?
        }
        EventBody::Interaction(data) => encode(
            &InteractionWire {
                v,
                i,
                s,
                t,
                p: previous_field()?,
                a: data.seals().iter().map(SealWire::from_seal).collect(),
            },
            format,
        )?,
        EventBody::Receipt(data) => encode(
            &ReceiptWire {
                v,
                i,
                s,
                t,
                d: data.receipted().digest().qualified(),
                a: None,
            },
            format,
        )?,
        EventBody::ValidatorReceipt(data) => encode(
            &ReceiptWire {
                v,
                i,
                s,
                t,
                d: data.receipted().digest().qualified(),
                a: Some(CoordinatesWire::from_coordinates(data.validator())),
            },
            format,
        )?,
    };
    patch_size(buf, format)
}

// ---------------------------------------------------------------------------
// deserialization
// ---------------------------------------------------------------------------

fn require<T>(field: Option<T>, name: &'static str) -> Result<T> {
    field.ok_or(Error::EventFieldMissing(name))
}

fn parse_witnesses(entries: Vec<String>) -> Result<Vec<BasicIdentifier>> {
    entries
        .iter()
        .map(|text| match Identifier::try_from(text.as_str())? {
            Identifier::Basic(basic) => Ok(basic),
            _ => Err(Error::UnknownMaterialCode(text.clone())),
        })
        .collect()
}

fn parse_inception_data(wire: &mut WireEvent) -> Result<InceptionData> {
    let config_traits = wire
        .c
        .take()
        .unwrap_or_default()
        .iter()
        .map(|code| ConfigurationTrait::from_code(code))
        .collect::<Result<BTreeSet<_>>>()?;
    Ok(InceptionData::new(
        require(wire.kt.take(), "kt")?.into_threshold()?,
        require(wire.k.take(), "k")?
            .iter()
            .map(|k| crate::crypto::PublicKey::try_from(k.as_str()))
            .collect::<Result<Vec<_>>>()?,
        wire.n
            .take()
            .map(|n| KeyConfigurationDigest::try_from(n.as_str()))
            .transpose()?,
        parse_hex_u32(&require(wire.wt.take(), "wt")?)?,
        parse_witnesses(wire.w.take().unwrap_or_default())?,
        config_traits,
    ))
}

fn parse_rotation_data(wire: &mut WireEvent) -> Result<RotationData> {
    let seals = match wire.a.take() {
        Some(AnchorsWire::Seals(seals)) => seals.into_iter().map(SealWire::into_seal).collect::<Result<Vec<_>>>()?,
        Some(AnchorsWire::Seal(..)) => Err(Error::EventFieldMissing("a"))?,
        None => Vec::new(),
    };
    Ok(RotationData::new(
        require(wire.kt.take(), "kt")?.into_threshold()?,
        require(wire.k.take(), "k")?
            .iter()
            .map(|k| crate::crypto::PublicKey::try_from(k.as_str()))
            .collect::<Result<Vec<_>>>()?,
        wire.n
            .take()
            .map(|n| KeyConfigurationDigest::try_from(n.as_str()))
            .transpose()?,
        parse_hex_u32(&require(wire.wt.take(), "wt")?)?,
        parse_witnesses(wire.wr.take().unwrap_or_default())?,
        parse_witnesses(wire.wa.take().unwrap_or_default())?,
        seals,
    ))
}

/// Parse canonical bytes back into a typed event. The embedded size must
/// match the buffer exactly; signatures travel outside the canonical bytes
/// and are attached separately by the caller.
pub fn deserialize(bytes: &[u8], provider: &dyn CryptoProvider) -> Result<KeyEvent> {
    let version = sniff_version(bytes)?;
    if version.size != bytes.len() {
        Err(Error::EventSizeMismatch {
            declared: version.size,
            actual: bytes.len(),
        })?;
    }
    let mut wire: WireEvent = decode(bytes, version.format)?;
    let identifier = Identifier::try_from(wire.i.as_str())?;
    let sequence_number = parse_hex(&wire.s)?;
    let event_type = EventType::from_code(&wire.t)?;

    // `p` reconstructs the prior event's coordinates: same log, one back
    let previous = wire
        .p
        .take()
        .map(|p| -> Result<KeyEventCoordinates> {
            let prior_sequence = sequence_number
                .checked_sub(1)
                .ok_or_else(|| Error::SequenceMalformed(wire.s.clone()))?;
            Ok(KeyEventCoordinates::new(
                identifier.clone(),
                prior_sequence,
                Digest::try_from(p.as_str())?,
            ))
        })
        .transpose()?;

    let body = match event_type {
        EventType::Inception => EventBody::Inception(parse_inception_data(&mut wire)?),
        EventType::DelegatedInception => EventBody::DelegatedInception {
            data: parse_inception_data(&mut wire)?,
            delegating: require(wire.da.take(), "da")?.into_location()?,
        },
        EventType::Rotation => EventBody::Rotation(parse_rotation_data(&mut wire)?),
        EventType::DelegatedRotation => EventBody::DelegatedRotation {
            data: parse_rotation_data(&mut wire)?,
            delegating: require(wire.da.take(), "da")?.into_location()?,
        },
        EventType::Interaction => {
            let seals = match wire.a.take() {
                Some(AnchorsWire::Seals(seals)) => {
                    seals.into_iter().map(SealWire::into_seal).collect::<Result<Vec<_>>>()?
                }
                Some(AnchorsWire::Seal(..)) => Err(Error::EventFieldMissing("a"))?,
                None => Vec::new(),
            };
            EventBody::Interaction(InteractionData::new(seals))
        }
        EventType::Receipt => {
            let digest = Digest::try_from(require(wire.d.take(), "d")?.as_str())?;
            EventBody::Receipt(ReceiptData::new(KeyEventCoordinates::new(
                identifier.clone(),
                sequence_number,
                digest,
            )))
        }
        EventType::ValidatorReceipt => {
            let digest = Digest::try_from(require(wire.d.take(), "d")?.as_str())?;
            let validator = match require(wire.a.take(), "a")? {
                AnchorsWire::Seal(coordinates) => coordinates.into_coordinates()?,
                AnchorsWire::Seals(..) => Err(Error::EventFieldMissing("a"))?,
            };
            EventBody::ValidatorReceipt(ValidatorReceiptData::new(
                KeyEventCoordinates::new(identifier.clone(), sequence_number, digest),
                validator,
            ))
        }
    };

    KeyEvent::new(
        identifier,
        sequence_number,
        previous,
        body,
        version.format,
        bytes.to_vec(),
        provider,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::StandardProvider;
    use crate::event::builder;
    use crate::util::test;

    const ALL_FORMATS: [Format; 3] = [Format::Json, Format::Cbor, Format::MessagePack];

    #[test]
    fn version_string_shape() {
        let vs = version_string(Format::Json, 0x1a3);
        assert_eq!(vs, "KERI10JSON0001a3_");
        assert_eq!(vs.len(), 17);
        let parsed = parse_version(&vs).unwrap();
        assert_eq!(parsed.format, Format::Json);
        assert_eq!(parsed.size, 0x1a3);
    }

    #[test]
    fn format_codes_round_trip() {
        for format in ALL_FORMATS {
            assert_eq!(Format::from_code(format.code()).unwrap(), format);
        }
        assert_eq!(Format::from_code("YAML").err(), Some(Error::UnknownFormat("YAML".into())));
    }

    #[test]
    fn round_trip_every_event_type_every_format() {
        let provider = StandardProvider::new();
        for format in ALL_FORMATS {
            for event in test::one_of_each_event_type(format) {
                let parsed = deserialize(event.bytes(), &provider).unwrap();
                assert_eq!(&parsed, &event, "round trip failed for {:?}/{:?}", event.body().event_type(), format);
            }
        }
    }

    #[test]
    fn size_field_equals_true_length() {
        for format in ALL_FORMATS {
            for event in test::one_of_each_event_type(format) {
                let version = sniff_version(event.bytes()).unwrap();
                assert_eq!(version.size, event.bytes().len());
                assert_eq!(version.format, format);
            }
        }
    }

    #[test]
    fn size_mismatch_is_rejected() {
        let provider = StandardProvider::new();
        let keypair = test::keypair(1);
        let event = test::simple_inception(&[&keypair]);
        let mut bytes = event.bytes().clone();
        bytes.push(b' ');
        let res = deserialize(&bytes, &provider);
        assert_eq!(
            res.err(),
            Some(Error::EventSizeMismatch {
                declared: bytes.len() - 1,
                actual: bytes.len(),
            })
        );
    }

    #[test]
    fn placeholder_and_real_identifier_serialize_to_equal_lengths() {
        use crate::crypto::material;
        let provider = StandardProvider::new();
        let keypair = test::keypair(3);
        let event = test::simple_inception(&[&keypair]);
        let qualified = event.identifier().qualified();
        let placeholder = material::placeholder(qualified.len());

        let with_real = serialize_with_identifier(&qualified, 0, None, event.body(), *event.format()).unwrap();
        let with_placeholder =
            serialize_with_identifier(&placeholder, 0, None, event.body(), *event.format()).unwrap();
        assert_eq!(with_real.len(), with_placeholder.len());
        assert_eq!(with_real, *event.bytes());
        // the placeholder bytes are what the identifier digest covers
        let derived = provider
            .digest(crate::crypto::DigestAlgo::Blake3_256, &with_placeholder)
            .unwrap();
        match event.identifier() {
            Identifier::SelfAddressing(sa) => assert_eq!(sa.digest(), &derived),
            other => panic!("expected self-addressing identifier, got {:?}", other),
        }
    }

    #[test]
    fn garbage_is_rejected() {
        let provider = StandardProvider::new();
        assert_eq!(deserialize(b"not an event at all", &provider).err(), Some(Error::VersionMalformed));
    }

    #[test]
    fn unknown_event_type_is_rejected() {
        let provider = StandardProvider::new();
        let keypair = test::keypair(4);
        let event = test::simple_inception(&[&keypair]);
        let text = String::from_utf8(event.bytes().clone()).unwrap();
        let forged = text.replace("\"t\":\"icp\"", "\"t\":\"zzz\"");
        assert_eq!(forged.len(), text.len());
        let res = deserialize(forged.as_bytes(), &provider);
        assert_eq!(res.err(), Some(Error::UnknownEventType("zzz".into())));
    }

    #[test]
    fn builder_and_wire_agree_on_interaction_previous() {
        let provider = StandardProvider::new();
        let keypair = test::keypair(5);
        let icp = test::simple_inception(&[&keypair]);
        let ixn = builder::interact(
            icp.identifier().clone(),
            1,
            icp.coordinates(),
            vec![Seal::Digest {
                digest: provider.digest(crate::crypto::DigestAlgo::Blake3_256, b"anchored").unwrap(),
            }],
            Format::Json,
            &provider,
        )
        .unwrap();
        let parsed = deserialize(ixn.bytes(), &provider).unwrap();
        assert_eq!(parsed.previous().as_ref().unwrap().digest(), icp.digest());
        assert_eq!(*parsed.previous().as_ref().unwrap().sequence_number(), 0);
    }
}
