//! The event validator: the rule engine deciding whether a candidate event
//! is an admissible transition from a prior key state.
//!
//! Validation is pure. It reads the prior state, the candidate event, and
//! (for delegated events) the already-resolved delegating event; it never
//! touches a store and never mutates anything. Every failure is a distinct
//! [`Violation`], so the orchestrating processor can tell "wait for more
//! information" apart from "drop this forever" by matching on data instead
//! of catching error subclasses.

use crate::{
    crypto::{material, CryptoProvider, PublicKey},
    event::{wire, ConfigurationTrait, DelegatingLocation, EventBody, InceptionData, KeyEvent, KeyEventCoordinates, RotationData, Seal},
    identifier::{BasicIdentifier, Identifier},
    state::KeyState,
    threshold::SigningThreshold,
};
use thiserror::Error;

/// Every way a key event can fail validation, one named variant per rule.
///
/// Three of these mark *deferred* conditions, where the event may become
/// valid once more information arrives, and the processor escrows rather
/// than drops on them: [`Violation::MissingPriorState`],
/// [`Violation::MissingPriorEvent`], [`Violation::MissingDelegatingEvent`].
/// Unmet thresholds are likewise distinguished from structural breakage so
/// orchestration policy can choose to wait for more signatures or receipts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// A non-inception event arrived for an identifier with no state yet.
    #[error("no prior key state exists for this identifier")]
    MissingPriorState,

    /// The event's sequence number is ahead of the log; the gap may fill.
    #[error("event sequence {found} is ahead of the expected {expected}")]
    MissingPriorEvent { expected: u64, found: u64 },

    /// An inception event arrived for an identifier that already has state.
    #[error("key state already exists for this identifier")]
    StateAlreadyExists,

    /// The event names a different identifier than the state it was
    /// validated against.
    #[error("event identifier does not match the key state identifier")]
    IdentifierMismatch,

    /// The event's sequence number falls at or before the latest accepted
    /// event; it can never become valid.
    #[error("event sequence {found} is stale, log is already at {expected}")]
    StaleSequence { expected: u64, found: u64 },

    /// A non-inception event carries no previous-event digest.
    #[error("non-inception event carries no previous-event digest")]
    PreviousMissing,

    /// The previous-event digest does not match the prior event's bytes.
    #[error("previous-event digest does not match the prior event")]
    PreviousDigestMismatch,

    /// An inception event with a nonzero sequence number.
    #[error("inception events must have sequence number zero")]
    InceptionSequenceNonZero,

    /// An inception event carrying a previous-event digest.
    #[error("inception events cannot reference a previous event")]
    InceptionWithPrevious,

    /// The identifier does not derive from the event under its variant's
    /// rule.
    #[error("identifier does not derive from the inception event")]
    DerivationMismatch,

    /// An attached signature's key index is outside the key list.
    #[error("signature key index {index} is out of bounds")]
    SignatureIndexOutOfBounds { index: u32 },

    /// An attached signature failed cryptographic verification.
    #[error("signature at key index {index} does not verify")]
    SignatureInvalid { index: u32 },

    /// All attached signatures verify but the signing threshold is not met.
    #[error("attached signatures do not satisfy the signing threshold")]
    SignatureThresholdUnmet,

    /// Fewer witness receipts are on file than the witness threshold asks.
    #[error("witness receipts on file ({have}) do not satisfy the witness threshold ({required})")]
    WitnessThresholdUnmet { have: usize, required: u32 },

    /// The signing threshold does not fit the key list.
    #[error("signing threshold does not fit the key list")]
    SigningThresholdOutOfBounds,

    /// A non-transferable identifier published a next-key commitment.
    #[error("non-transferable identifiers cannot commit to next keys")]
    NonTransferableCommitment,

    /// Witness threshold must be zero without witnesses, else within the
    /// witness list.
    #[error("witness threshold does not fit the witness list")]
    WitnessThresholdOutOfBounds,

    /// The witness list contains the same witness twice.
    #[error("duplicate witness in witness list")]
    DuplicateWitness,

    /// A rotation was attempted on a non-transferable identifier.
    #[error("this identifier cannot rotate")]
    NotTransferable,

    /// A rotation arrived but the prior establishment event committed to no
    /// next keys.
    #[error("prior establishment event published no next-key commitment")]
    NoPriorCommitment,

    /// Recomputing the pre-rotation commitment over the rotation's declared
    /// threshold and keys does not reproduce the published digest.
    #[error("rotation does not match the pre-rotation commitment")]
    CommitmentMismatch,

    /// Added and removed witness sets intersect.
    #[error("added and removed witness sets overlap")]
    WitnessSetsOverlap,

    /// A removed witness is not in the current witness set.
    #[error("removed witness is not a current witness")]
    RemovedWitnessAbsent,

    /// An added witness is already in the current witness set.
    #[error("added witness is already a current witness")]
    AddedWitnessPresent,

    /// The delegating event could not be resolved; retry when it arrives.
    #[error("delegating event is not available")]
    MissingDelegatingEvent,

    /// The delegating event anchors no seal matching this event.
    #[error("delegating event carries no matching delegation seal")]
    DelegationSealMissing,

    /// The delegating identifier does not match what the state (or the
    /// event's delegation reference) records.
    #[error("delegating identifier mismatch")]
    DelegatorMismatch,

    /// The delegator's configuration forbids delegating.
    #[error("the delegating identifier is configured not to delegate")]
    DelegationForbidden,

    /// An interaction event on an establishment-only identifier.
    #[error("this identifier only accepts establishment events")]
    EstablishmentOnly,

    /// A receipt's digest of the receipted event does not match its bytes.
    #[error("receipt digest does not match the receipted event")]
    ReceiptDigestMismatch,

    /// A receipt signature's witness index is outside the witness list.
    #[error("witness index {index} is out of bounds")]
    WitnessIndexOutOfBounds { index: u32 },

    /// The validator-receipt seal does not resolve to the issuer's
    /// establishment event.
    #[error("validator receipt seal does not match the issuer's establishment event")]
    ValidatorSealMismatch,

    /// A receipt was handed to the key-event validator.
    #[error("receipts are not key events")]
    UnexpectedReceipt,

    /// An algorithm named by the event is not available in the provider.
    #[error("event names an unsupported algorithm")]
    UnsupportedAlgorithm,
}

type Check = std::result::Result<(), Violation>;

/// Decide whether `event` is an admissible next event given `prior` state.
/// For delegated events the caller resolves and passes the delegating
/// event; `None` there yields the deferrable
/// [`Violation::MissingDelegatingEvent`].
pub fn validate(
    prior: Option<&KeyState>,
    event: &KeyEvent,
    delegating: Option<&KeyEvent>,
    provider: &dyn CryptoProvider,
) -> Check {
    match event.body() {
        EventBody::Inception(data) => validate_inception(prior, event, data, None, provider),
        EventBody::DelegatedInception { data, delegating: reference } => {
            validate_inception(prior, event, data, Some((reference, delegating)), provider)
        }
        EventBody::Rotation(data) => validate_rotation(prior, event, data, None, provider),
        EventBody::DelegatedRotation { data, delegating: reference } => {
            validate_rotation(prior, event, data, Some((reference, delegating)), provider)
        }
        EventBody::Interaction(..) => validate_interaction(prior, event, provider),
        EventBody::Receipt(..) | EventBody::ValidatorReceipt(..) => Err(Violation::UnexpectedReceipt),
    }
}

/// The universal rules every non-inception event must satisfy against its
/// prior state: identity, contiguous sequencing, and the hash chain.
/// Returns the prior state so callers don't re-unwrap the option.
fn universal_checks<'a>(
    prior: Option<&'a KeyState>,
    event: &KeyEvent,
    provider: &dyn CryptoProvider,
) -> std::result::Result<&'a KeyState, Violation> {
    let prior = prior.ok_or(Violation::MissingPriorState)?;
    if event.identifier() != prior.identifier() {
        Err(Violation::IdentifierMismatch)?;
    }
    let expected = prior.last_event().sequence_number() + 1;
    let found = *event.sequence_number();
    if found < expected {
        Err(Violation::StaleSequence { expected, found })?;
    }
    if found > expected {
        Err(Violation::MissingPriorEvent { expected, found })?;
    }
    let previous = event.previous().as_ref().ok_or(Violation::PreviousMissing)?;
    let recomputed = provider
        .digest(previous.digest().algo(), prior.last_event().bytes())
        .map_err(|_| Violation::UnsupportedAlgorithm)?;
    if &recomputed != previous.digest() {
        Err(Violation::PreviousDigestMismatch)?;
    }
    Ok(prior)
}

/// Verify every attached signature against `keys` by index, then check the
/// set of signing indices against the threshold. A bad signature is
/// forgery evidence and rejects the event outright; a short set is the
/// distinct unmet-threshold condition.
fn verify_signatures(
    event: &KeyEvent,
    keys: &[PublicKey],
    threshold: &SigningThreshold,
    provider: &dyn CryptoProvider,
) -> Check {
    let mut indices = Vec::with_capacity(event.signatures().len());
    for (&index, signature) in event.signatures() {
        let key = keys
            .get(index as usize)
            .ok_or(Violation::SignatureIndexOutOfBounds { index })?;
        provider
            .verify(key, signature, event.bytes())
            .map_err(|_| Violation::SignatureInvalid { index })?;
        indices.push(index as usize);
    }
    if !threshold.is_met(&indices) {
        Err(Violation::SignatureThresholdUnmet)?;
    }
    Ok(())
}

fn witness_bounds(witness_threshold: u32, witnesses: &[BasicIdentifier]) -> Check {
    if witnesses.is_empty() {
        if witness_threshold != 0 {
            Err(Violation::WitnessThresholdOutOfBounds)?;
        }
    } else if witness_threshold < 1 || witness_threshold as usize > witnesses.len() {
        Err(Violation::WitnessThresholdOutOfBounds)?;
    }
    Ok(())
}

fn no_duplicate_witnesses(witnesses: &[BasicIdentifier]) -> Check {
    for (position, witness) in witnesses.iter().enumerate() {
        if witnesses[..position].contains(witness) {
            Err(Violation::DuplicateWitness)?;
        }
    }
    Ok(())
}

/// Re-derive the identifier from the placeholder-bearing form of the event
/// and require it to match, per the identifier variant's rule.
fn check_derivation(event: &KeyEvent, keys: &[PublicKey], provider: &dyn CryptoProvider) -> Check {
    let placeholder = material::placeholder(event.identifier().qualified().len());
    let placeholder_bytes = wire::serialize_with_identifier(&placeholder, 0, None, event.body(), *event.format())
        .map_err(|_| Violation::DerivationMismatch)?;
    match event.identifier() {
        Identifier::Basic(basic) => match keys {
            [key] if key == basic.key() => Ok(()),
            _ => Err(Violation::DerivationMismatch),
        },
        Identifier::SelfAddressing(sa) => {
            let recomputed = provider
                .digest(sa.digest().algo(), &placeholder_bytes)
                .map_err(|_| Violation::UnsupportedAlgorithm)?;
            if &recomputed == sa.digest() {
                Ok(())
            } else {
                Err(Violation::DerivationMismatch)
            }
        }
        Identifier::SelfSigning(ss) => match keys {
            [key] => provider
                .verify(key, ss.signature(), &placeholder_bytes)
                .map_err(|_| Violation::DerivationMismatch),
            _ => Err(Violation::DerivationMismatch),
        },
    }
}

/// The delegation rule shared by delegated inception and rotation: the
/// delegating event (resolved by the orchestrator) must actually live at
/// the referenced location in the delegator's log and must anchor a
/// coordinates seal naming this event's identifier, sequence, and digest.
fn check_delegation(
    event: &KeyEvent,
    reference: &DelegatingLocation,
    delegating: Option<&KeyEvent>,
    provider: &dyn CryptoProvider,
) -> Check {
    let delegating = delegating.ok_or(Violation::MissingDelegatingEvent)?;
    if delegating.identifier() != reference.identifier()
        || delegating.sequence_number() != reference.sequence_number()
    {
        Err(Violation::DelegatorMismatch)?;
    }
    for seal in delegating.seals() {
        if let Seal::Coordinates(coordinates) = seal {
            if coordinates.identifier() != event.identifier()
                || coordinates.sequence_number() != event.sequence_number()
            {
                continue;
            }
            let sealed_digest = provider
                .digest(coordinates.digest().algo(), event.bytes())
                .map_err(|_| Violation::UnsupportedAlgorithm)?;
            if &sealed_digest == coordinates.digest() {
                return Ok(());
            }
        }
    }
    Err(Violation::DelegationSealMissing)
}

type DelegationRef<'a> = (&'a DelegatingLocation, Option<&'a KeyEvent>);

fn validate_inception(
    prior: Option<&KeyState>,
    event: &KeyEvent,
    data: &InceptionData,
    delegation: Option<DelegationRef<'_>>,
    provider: &dyn CryptoProvider,
) -> Check {
    if prior.is_some() {
        Err(Violation::StateAlreadyExists)?;
    }
    if *event.sequence_number() != 0 {
        Err(Violation::InceptionSequenceNonZero)?;
    }
    if event.previous().is_some() {
        Err(Violation::InceptionWithPrevious)?;
    }
    if !data.signing_threshold().fits_key_count(data.keys().len()) {
        Err(Violation::SigningThresholdOutOfBounds)?;
    }
    if !event.identifier().transferable() && data.next_key_commitment().is_some() {
        Err(Violation::NonTransferableCommitment)?;
    }
    witness_bounds(*data.witness_threshold(), data.witnesses())?;
    no_duplicate_witnesses(data.witnesses())?;
    check_derivation(event, data.keys(), provider)?;
    verify_signatures(event, data.keys(), data.signing_threshold(), provider)?;
    if let Some((reference, delegating)) = delegation {
        check_delegation(event, reference, delegating, provider)?;
    }
    Ok(())
}

fn validate_rotation(
    prior: Option<&KeyState>,
    event: &KeyEvent,
    data: &RotationData,
    delegation: Option<DelegationRef<'_>>,
    provider: &dyn CryptoProvider,
) -> Check {
    let prior = universal_checks(prior, event, provider)?;
    if !event.identifier().transferable() {
        Err(Violation::NotTransferable)?;
    }
    let commitment = prior.next_key_commitment().as_ref().ok_or(Violation::NoPriorCommitment)?;
    let matches = commitment
        .matches(data.signing_threshold(), data.keys(), provider)
        .map_err(|_| Violation::UnsupportedAlgorithm)?;
    if !matches {
        Err(Violation::CommitmentMismatch)?;
    }
    if !data.signing_threshold().fits_key_count(data.keys().len()) {
        Err(Violation::SigningThresholdOutOfBounds)?;
    }

    no_duplicate_witnesses(data.removed_witnesses())?;
    no_duplicate_witnesses(data.added_witnesses())?;
    if data
        .removed_witnesses()
        .iter()
        .any(|witness| data.added_witnesses().contains(witness))
    {
        Err(Violation::WitnessSetsOverlap)?;
    }
    if data
        .removed_witnesses()
        .iter()
        .any(|witness| !prior.witnesses().contains(witness))
    {
        Err(Violation::RemovedWitnessAbsent)?;
    }
    if data
        .added_witnesses()
        .iter()
        .any(|witness| prior.witnesses().contains(witness))
    {
        Err(Violation::AddedWitnessPresent)?;
    }
    let resulting: Vec<BasicIdentifier> = prior
        .witnesses()
        .iter()
        .filter(|witness| !data.removed_witnesses().contains(*witness))
        .chain(data.added_witnesses().iter())
        .cloned()
        .collect();
    witness_bounds(*data.witness_threshold(), &resulting)?;

    verify_signatures(event, data.keys(), data.signing_threshold(), provider)?;

    if let Some((reference, delegating)) = delegation {
        match prior.delegator() {
            Some(delegator) if delegator == reference.identifier() => {}
            _ => Err(Violation::DelegatorMismatch)?,
        }
        check_delegation(event, reference, delegating, provider)?;
    }
    Ok(())
}

fn validate_interaction(prior: Option<&KeyState>, event: &KeyEvent, provider: &dyn CryptoProvider) -> Check {
    let prior = universal_checks(prior, event, provider)?;
    if prior.config_traits().contains(&ConfigurationTrait::EstablishmentOnly) {
        Err(Violation::EstablishmentOnly)?;
    }
    // interaction events cannot alter key material, so their signatures
    // verify against the last establishment event's key set
    verify_signatures(event, prior.keys(), prior.signing_threshold(), provider)
}

/// Validate a witness receipt against the event it corroborates.
/// `witnesses` is the receipted event's witness list as of its own key
/// state; receipt signatures index into it.
pub fn validate_witness_receipt(
    receipt: &KeyEvent,
    receipted: &KeyEvent,
    witnesses: &[BasicIdentifier],
    provider: &dyn CryptoProvider,
) -> Check {
    let data = match receipt.body() {
        EventBody::Receipt(data) => data,
        _ => Err(Violation::UnexpectedReceipt)?,
    };
    check_receipted_digest(data.receipted(), receipted, provider)?;
    for (&index, signature) in receipt.signatures() {
        let witness = witnesses
            .get(index as usize)
            .ok_or(Violation::WitnessIndexOutOfBounds { index })?;
        provider
            .verify(witness.key(), signature, receipted.bytes())
            .map_err(|_| Violation::SignatureInvalid { index })?;
    }
    Ok(())
}

/// Validate a receipt from a transferable identifier: its seal must
/// resolve to the issuer's establishment event, whose keys and threshold
/// the attached signatures must satisfy.
pub fn validate_validator_receipt(
    receipt: &KeyEvent,
    receipted: &KeyEvent,
    validator_event: &KeyEvent,
    provider: &dyn CryptoProvider,
) -> Check {
    let data = match receipt.body() {
        EventBody::ValidatorReceipt(data) => data,
        _ => Err(Violation::UnexpectedReceipt)?,
    };
    check_receipted_digest(data.receipted(), receipted, provider)?;

    let seal = data.validator();
    if validator_event.identifier() != seal.identifier() || validator_event.sequence_number() != seal.sequence_number() {
        Err(Violation::ValidatorSealMismatch)?;
    }
    let recomputed = provider
        .digest(seal.digest().algo(), validator_event.bytes())
        .map_err(|_| Violation::UnsupportedAlgorithm)?;
    if &recomputed != seal.digest() {
        Err(Violation::ValidatorSealMismatch)?;
    }

    let keys = validator_event.current_keys().ok_or(Violation::ValidatorSealMismatch)?;
    let threshold = validator_event
        .signing_threshold()
        .ok_or(Violation::ValidatorSealMismatch)?;
    let mut indices = Vec::with_capacity(receipt.signatures().len());
    for (&index, signature) in receipt.signatures() {
        let key = keys
            .get(index as usize)
            .ok_or(Violation::SignatureIndexOutOfBounds { index })?;
        provider
            .verify(key, signature, receipted.bytes())
            .map_err(|_| Violation::SignatureInvalid { index })?;
        indices.push(index as usize);
    }
    if !threshold.is_met(&indices) {
        Err(Violation::SignatureThresholdUnmet)?;
    }
    Ok(())
}

fn check_receipted_digest(
    claimed: &KeyEventCoordinates,
    receipted: &KeyEvent,
    provider: &dyn CryptoProvider,
) -> Check {
    if claimed.identifier() != receipted.identifier() || claimed.sequence_number() != receipted.sequence_number() {
        Err(Violation::ReceiptDigestMismatch)?;
    }
    let recomputed = provider
        .digest(claimed.digest().algo(), receipted.bytes())
        .map_err(|_| Violation::UnsupportedAlgorithm)?;
    if &recomputed != claimed.digest() {
        Err(Violation::ReceiptDigestMismatch)?;
    }
    Ok(())
}
