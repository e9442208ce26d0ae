//! Constructors for each event kind.
//!
//! These produce canonical bytes once, up front, and hand back an immutable
//! [`KeyEvent`] ready to be signed. Inception is the interesting one: the
//! identifier is derived over placeholder-bearing bytes and the event is
//! then re-serialized with the real identifier in place, which cannot
//! change the byte length because the placeholder was sized from the
//! algorithm.

use crate::{
    crypto::{material, CryptoProvider, KeyPair},
    error::{Error, Result},
    event::{
        wire, DelegatingLocation, EventBody, Format, InceptionData, InteractionData, KeyEvent, KeyEventCoordinates,
        ReceiptData, RotationData, Seal, ValidatorReceiptData,
    },
    identifier::{BasicIdentifier, Identifier, IdentifierDerivation, SelfAddressingIdentifier, SelfSigningIdentifier},
};

fn derive_identifier(
    derivation: IdentifierDerivation,
    data: &InceptionData,
    placeholder_bytes: &[u8],
    signer: Option<&KeyPair>,
    provider: &dyn CryptoProvider,
) -> Result<Identifier> {
    match derivation {
        IdentifierDerivation::Basic => Ok(Identifier::Basic(BasicIdentifier::derive(data.keys())?)),
        IdentifierDerivation::SelfAddressing(algo) => Ok(Identifier::SelfAddressing(SelfAddressingIdentifier::derive(
            algo,
            placeholder_bytes,
            provider,
        )?)),
        IdentifierDerivation::SelfSigning => {
            let signer = signer.ok_or(Error::SignerMissing)?;
            match data.keys().as_slice() {
                [key] if key == signer.public_key() => Ok(Identifier::SelfSigning(SelfSigningIdentifier::new(
                    signer.sign(placeholder_bytes),
                ))),
                [_] => Err(Error::SignerMismatch),
                _ => Err(Error::IdentifierKeyCount),
            }
        }
    }
}

fn incept_body(
    body: EventBody,
    data_placeholder_len: usize,
    derivation: IdentifierDerivation,
    format: Format,
    signer: Option<&KeyPair>,
    provider: &dyn CryptoProvider,
) -> Result<KeyEvent> {
    let placeholder = material::placeholder(data_placeholder_len);
    let placeholder_bytes = wire::serialize_with_identifier(&placeholder, 0, None, &body, format)?;
    let data = match &body {
        EventBody::Inception(data) | EventBody::DelegatedInception { data, .. } => data,
        _ => unreachable!("inception builder only builds inception bodies"),
    };
    let identifier = derive_identifier(derivation, data, &placeholder_bytes, signer, provider)?;
    let bytes = wire::serialize_with_identifier(&identifier.qualified(), 0, None, &body, format)?;
    KeyEvent::new(identifier, 0, None, body, format, bytes, provider)
}

/// Build an inception event, deriving the identifier from the event's own
/// placeholder-bearing bytes. `signer` is only needed for self-signing
/// derivation.
pub fn incept(
    data: InceptionData,
    derivation: IdentifierDerivation,
    format: Format,
    signer: Option<&KeyPair>,
    provider: &dyn CryptoProvider,
) -> Result<KeyEvent> {
    let placeholder_len = derivation.placeholder_len(data.keys())?;
    incept_body(EventBody::Inception(data), placeholder_len, derivation, format, signer, provider)
}

/// Build a delegated inception event: an inception whose authority is
/// anchored by a seal in the delegator's log at `delegating`.
pub fn delegated_incept(
    data: InceptionData,
    delegating: DelegatingLocation,
    derivation: IdentifierDerivation,
    format: Format,
    signer: Option<&KeyPair>,
    provider: &dyn CryptoProvider,
) -> Result<KeyEvent> {
    let placeholder_len = derivation.placeholder_len(data.keys())?;
    incept_body(
        EventBody::DelegatedInception { data, delegating },
        placeholder_len,
        derivation,
        format,
        signer,
        provider,
    )
}

/// Build a rotation event on top of `previous`.
pub fn rotate(
    identifier: Identifier,
    sequence_number: u64,
    previous: KeyEventCoordinates,
    data: RotationData,
    format: Format,
    provider: &dyn CryptoProvider,
) -> Result<KeyEvent> {
    let body = EventBody::Rotation(data);
    let bytes = wire::serialize_with_identifier(
        &identifier.qualified(),
        sequence_number,
        Some(previous.digest()),
        &body,
        format,
    )?;
    KeyEvent::new(identifier, sequence_number, Some(previous), body, format, bytes, provider)
}

/// Build a delegated rotation event.
pub fn delegated_rotate(
    identifier: Identifier,
    sequence_number: u64,
    previous: KeyEventCoordinates,
    data: RotationData,
    delegating: DelegatingLocation,
    format: Format,
    provider: &dyn CryptoProvider,
) -> Result<KeyEvent> {
    let body = EventBody::DelegatedRotation { data, delegating };
    let bytes = wire::serialize_with_identifier(
        &identifier.qualified(),
        sequence_number,
        Some(previous.digest()),
        &body,
        format,
    )?;
    KeyEvent::new(identifier, sequence_number, Some(previous), body, format, bytes, provider)
}

/// Build an interaction event anchoring `seals`.
pub fn interact(
    identifier: Identifier,
    sequence_number: u64,
    previous: KeyEventCoordinates,
    seals: Vec<Seal>,
    format: Format,
    provider: &dyn CryptoProvider,
) -> Result<KeyEvent> {
    let body = EventBody::Interaction(InteractionData::new(seals));
    let bytes = wire::serialize_with_identifier(
        &identifier.qualified(),
        sequence_number,
        Some(previous.digest()),
        &body,
        format,
    )?;
    KeyEvent::new(identifier, sequence_number, Some(previous), body, format, bytes, provider)
}

/// Build a witness receipt for the event at `receipted`. Witness signatures
/// are attached afterward, indexed by the witness's position in the
/// receipted event's witness list.
pub fn receipt(receipted: KeyEventCoordinates, format: Format, provider: &dyn CryptoProvider) -> Result<KeyEvent> {
    let identifier = receipted.identifier().clone();
    let sequence_number = *receipted.sequence_number();
    let body = EventBody::Receipt(ReceiptData::new(receipted));
    let bytes = wire::serialize_with_identifier(&identifier.qualified(), sequence_number, None, &body, format)?;
    KeyEvent::new(identifier, sequence_number, None, body, format, bytes, provider)
}

/// Build a receipt issued by a transferable identifier, carrying the
/// coordinates of the issuer's establishment event whose keys sign it.
pub fn validator_receipt(
    receipted: KeyEventCoordinates,
    validator: KeyEventCoordinates,
    format: Format,
    provider: &dyn CryptoProvider,
) -> Result<KeyEvent> {
    let identifier = receipted.identifier().clone();
    let sequence_number = *receipted.sequence_number();
    let body = EventBody::ValidatorReceipt(ValidatorReceiptData::new(receipted, validator));
    let bytes = wire::serialize_with_identifier(&identifier.qualified(), sequence_number, None, &body, format)?;
    KeyEvent::new(identifier, sequence_number, None, body, format, bytes, provider)
}
