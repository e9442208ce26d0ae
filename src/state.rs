//! Key state and the fold that produces it.
//!
//! A `KeyState` is the materialized result of replaying one identifier's
//! log. It is immutable: applying an accepted event produces a fresh state,
//! so any point in history can be reconstructed and states compare by
//! structural equality. `apply` is a total function over validator-accepted
//! input and performs no validation of its own; never feed it an event
//! the validator has not passed.

use crate::{
    commitment::KeyConfigurationDigest,
    crypto::{CryptoProvider, PublicKey},
    error::{Error, Result},
    event::{ConfigurationTrait, EventBody, KeyEvent},
    identifier::{BasicIdentifier, Identifier},
    threshold::SigningThreshold,
    validate,
};
use getset::Getters;
use std::collections::BTreeSet;

/// The current authority picture for one identifier.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct KeyState {
    identifier: Identifier,
    signing_threshold: SigningThreshold,
    keys: Vec<PublicKey>,
    next_key_commitment: Option<KeyConfigurationDigest>,
    witness_threshold: u32,
    witnesses: Vec<BasicIdentifier>,
    config_traits: BTreeSet<ConfigurationTrait>,
    /// The most recent accepted event of any kind
    last_event: KeyEvent,
    /// The most recent establishment event; interaction signatures verify
    /// against this event's key set
    last_establishment_event: KeyEvent,
    delegator: Option<Identifier>,
}

impl KeyState {
    /// Whether this state can still rotate: the identifier variant must
    /// permit it AND a next-key commitment must be standing.
    pub fn transferable(&self) -> bool {
        self.identifier.transferable() && self.next_key_commitment.is_some()
    }
}

/// Fold one event into the prior state. Inception expects no prior state,
/// everything else requires one; receipts never come here.
pub fn apply(prior: Option<&KeyState>, event: &KeyEvent) -> Result<KeyState> {
    match event.body() {
        EventBody::Inception(data) | EventBody::DelegatedInception { data, .. } => {
            if prior.is_some() {
                Err(Error::PriorStateExists)?;
            }
            let delegator = match event.body() {
                EventBody::DelegatedInception { delegating, .. } => Some(delegating.identifier().clone()),
                _ => None,
            };
            Ok(KeyState {
                identifier: event.identifier().clone(),
                signing_threshold: data.signing_threshold().clone(),
                keys: data.keys().clone(),
                next_key_commitment: data.next_key_commitment().clone(),
                witness_threshold: *data.witness_threshold(),
                witnesses: data.witnesses().clone(),
                config_traits: data.config_traits().clone(),
                last_event: event.clone(),
                last_establishment_event: event.clone(),
                delegator,
            })
        }
        EventBody::Rotation(data) | EventBody::DelegatedRotation { data, .. } => {
            let prior = prior.ok_or(Error::PriorStateMissing)?;
            let witnesses = prior
                .witnesses
                .iter()
                .filter(|witness| !data.removed_witnesses().contains(*witness))
                .chain(data.added_witnesses().iter())
                .cloned()
                .collect();
            Ok(KeyState {
                identifier: prior.identifier.clone(),
                signing_threshold: data.signing_threshold().clone(),
                keys: data.keys().clone(),
                next_key_commitment: data.next_key_commitment().clone(),
                witness_threshold: *data.witness_threshold(),
                witnesses,
                config_traits: prior.config_traits.clone(),
                last_event: event.clone(),
                last_establishment_event: event.clone(),
                delegator: prior.delegator.clone(),
            })
        }
        EventBody::Interaction(..) => {
            let prior = prior.ok_or(Error::PriorStateMissing)?;
            let mut state = prior.clone();
            state.last_event = event.clone();
            Ok(state)
        }
        EventBody::Receipt(..) | EventBody::ValidatorReceipt(..) => Err(Error::ReceiptHasNoState),
    }
}

/// Validate and fold an ordered log into its final state. Delegated events
/// need their delegating events resolved from a store, which a bare replay
/// cannot do, so logs containing them go through the event processor
/// instead.
pub fn replay<'a, I>(events: I, provider: &dyn CryptoProvider) -> Result<KeyState>
where
    I: IntoIterator<Item = &'a KeyEvent>,
{
    let mut state: Option<KeyState> = None;
    for event in events {
        validate::validate(state.as_ref(), event, None, provider)?;
        state = Some(apply(state.as_ref(), event)?);
    }
    state.ok_or(Error::PriorStateMissing)
}
