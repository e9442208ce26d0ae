//! The event processor: the one component that sequences validation, state
//! derivation, and storage, and the only one that decides retry vs. drop
//! vs. escrow.
//!
//! Out-of-order arrival is not an error here. An event whose prior event,
//! delegating event, or receipted event has not arrived yet is parked in an
//! escrow keyed by the missing dependency and re-attempted whenever an
//! accepted event could resolve it: retry on trigger, never on a timer.
//! The store is mutated only on a fully validated transition.

use crate::{
    crypto::CryptoProvider,
    error::Result,
    event::{ConfigurationTrait, EventBody, EventType, KeyEvent, KeyEventCoordinates},
    identifier::Identifier,
    state::{self, KeyState},
    store::EventStore,
    validate::{self, Violation},
};
use std::collections::HashMap;
use tracing::{debug, warn};

/// What processing one event produced. Deferred events have been escrowed;
/// rejected events are dropped and never touch the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The event was validated, applied, and appended; here is the state
    /// it produced (for receipts: the unchanged state of the receipted
    /// identifier).
    Accepted(KeyState),
    /// A dependency is missing; the event waits in escrow for it.
    Deferred(Dependency),
    /// The event violates an invariant and has been dropped.
    Rejected(Violation),
}

/// The piece of missing information a deferred event is waiting on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dependency {
    /// The event at this position of the identifier's own log.
    Prior { identifier: Identifier, sequence_number: u64 },
    /// The delegating event at this position of the delegator's log.
    Delegating { identifier: Identifier, sequence_number: u64 },
    /// The event a receipt corroborates (or the issuer's establishment
    /// event it references).
    Receipted(KeyEventCoordinates),
}

/// Orchestrates the validator, the state processor, and a store.
pub struct EventProcessor<S, C> {
    store: S,
    crypto: C,
    escrow: HashMap<Dependency, Vec<KeyEvent>>,
}

impl<S: EventStore, C: CryptoProvider> EventProcessor<S, C> {
    pub fn new(store: S, crypto: C) -> Self {
        Self {
            store,
            crypto,
            escrow: HashMap::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Number of events currently parked in escrow.
    pub fn escrowed(&self) -> usize {
        self.escrow.values().map(Vec::len).sum()
    }

    /// Process one incoming event. On acceptance of a key event, any
    /// escrowed events waiting on it are re-attempted, transitively.
    pub fn process(&mut self, event: KeyEvent) -> Result<Outcome> {
        let is_key_event = !matches!(event.body(), EventBody::Receipt(..) | EventBody::ValidatorReceipt(..));
        let accepted_at = is_key_event.then(|| event.coordinates());
        let outcome = self.attempt(event)?;
        if let (Outcome::Accepted(..), Some(coordinates)) = (&outcome, accepted_at) {
            self.drain(coordinates)?;
        }
        Ok(outcome)
    }

    /// Re-attempt everything escrowed on the just-accepted event, looping
    /// while acceptances keep resolving further dependencies.
    fn drain(&mut self, accepted: KeyEventCoordinates) -> Result<()> {
        let mut queue = vec![accepted];
        while let Some(coordinates) = queue.pop() {
            let triggers = [
                Dependency::Prior {
                    identifier: coordinates.identifier().clone(),
                    sequence_number: *coordinates.sequence_number(),
                },
                Dependency::Delegating {
                    identifier: coordinates.identifier().clone(),
                    sequence_number: *coordinates.sequence_number(),
                },
                Dependency::Receipted(coordinates.clone()),
            ];
            for trigger in triggers {
                let Some(waiting) = self.escrow.remove(&trigger) else {
                    continue;
                };
                debug!(count = waiting.len(), "retrying escrowed events");
                for event in waiting {
                    let is_key_event =
                        !matches!(event.body(), EventBody::Receipt(..) | EventBody::ValidatorReceipt(..));
                    let retried_at = is_key_event.then(|| event.coordinates());
                    if let (Outcome::Accepted(..), Some(next)) = (self.attempt(event)?, retried_at) {
                        queue.push(next);
                    }
                }
            }
        }
        Ok(())
    }

    fn attempt(&mut self, event: KeyEvent) -> Result<Outcome> {
        match event.body() {
            EventBody::Receipt(..) | EventBody::ValidatorReceipt(..) => self.attempt_receipt(event),
            _ => self.attempt_key_event(event),
        }
    }

    fn defer(&mut self, dependency: Dependency, event: KeyEvent) -> Outcome {
        debug!(
            identifier = %event.identifier(),
            sequence = *event.sequence_number(),
            ?dependency,
            "escrowing event on missing dependency"
        );
        self.escrow.entry(dependency.clone()).or_default().push(event);
        Outcome::Deferred(dependency)
    }

    fn reject(&self, event: &KeyEvent, violation: Violation) -> Outcome {
        warn!(
            identifier = %event.identifier(),
            sequence = *event.sequence_number(),
            %violation,
            "rejecting invalid key event"
        );
        Outcome::Rejected(violation)
    }

    fn attempt_key_event(&mut self, event: KeyEvent) -> Result<Outcome> {
        let prior = self.store.key_state(event.identifier())?;

        let delegating = match event.body() {
            EventBody::DelegatedInception { delegating, .. } | EventBody::DelegatedRotation { delegating, .. } => {
                match self
                    .store
                    .event_at_sequence(delegating.identifier(), *delegating.sequence_number())?
                {
                    Some(delegating_event) => {
                        // the delegator must not be configured against
                        // delegating
                        if let Some(delegator_state) = self.store.key_state(delegating.identifier())? {
                            if delegator_state.config_traits().contains(&ConfigurationTrait::DoNotDelegate) {
                                return Ok(self.reject(&event, Violation::DelegationForbidden));
                            }
                        }
                        Some(delegating_event)
                    }
                    None => {
                        let dependency = Dependency::Delegating {
                            identifier: delegating.identifier().clone(),
                            sequence_number: *delegating.sequence_number(),
                        };
                        return Ok(self.defer(dependency, event));
                    }
                }
            }
            _ => None,
        };

        match validate::validate(prior.as_ref(), &event, delegating.as_ref(), &self.crypto) {
            Ok(()) => {
                let new_state = state::apply(prior.as_ref(), &event)?;
                debug!(
                    identifier = %event.identifier(),
                    sequence = *event.sequence_number(),
                    kind = event.body().event_type().code(),
                    "accepted key event"
                );
                self.store.append(event, new_state.clone())?;
                Ok(Outcome::Accepted(new_state))
            }
            Err(Violation::MissingPriorState) | Err(Violation::MissingPriorEvent { .. }) => {
                let dependency = Dependency::Prior {
                    identifier: event.identifier().clone(),
                    sequence_number: event.sequence_number().saturating_sub(1),
                };
                Ok(self.defer(dependency, event))
            }
            Err(violation) => Ok(self.reject(&event, violation)),
        }
    }

    fn attempt_receipt(&mut self, event: KeyEvent) -> Result<Outcome> {
        match event.body().event_type() {
            EventType::Receipt => {
                let receipted = match event.body() {
                    EventBody::Receipt(data) => data.receipted().clone(),
                    _ => unreachable!("matched on event type"),
                };
                let Some(subject_event) = self.store.event_at(&receipted)? else {
                    return Ok(self.defer(Dependency::Receipted(receipted), event));
                };
                let Some(subject_state) = self.store.key_state_at(&receipted)? else {
                    return Ok(self.defer(Dependency::Receipted(receipted), event));
                };
                if let Err(violation) =
                    validate::validate_witness_receipt(&event, &subject_event, subject_state.witnesses(), &self.crypto)
                {
                    return Ok(self.reject(&event, violation));
                }
                for (&index, signature) in event.signatures() {
                    let issuer = Identifier::Basic(subject_state.witnesses()[index as usize].clone());
                    self.store.append_receipt(&receipted, &issuer, signature.clone())?;
                }
                debug!(identifier = %receipted.identifier(), sequence = *receipted.sequence_number(), "accepted witness receipt");
                Ok(Outcome::Accepted(subject_state))
            }
            EventType::ValidatorReceipt => {
                let (receipted, validator) = match event.body() {
                    EventBody::ValidatorReceipt(data) => (data.receipted().clone(), data.validator().clone()),
                    _ => unreachable!("matched on event type"),
                };
                let Some(subject_event) = self.store.event_at(&receipted)? else {
                    return Ok(self.defer(Dependency::Receipted(receipted), event));
                };
                let Some(subject_state) = self.store.key_state_at(&receipted)? else {
                    return Ok(self.defer(Dependency::Receipted(receipted), event));
                };
                let Some(validator_event) = self.store.event_at(&validator)? else {
                    return Ok(self.defer(Dependency::Receipted(validator), event));
                };
                if let Err(violation) =
                    validate::validate_validator_receipt(&event, &subject_event, &validator_event, &self.crypto)
                {
                    return Ok(self.reject(&event, violation));
                }
                for signature in event.signatures().values() {
                    self.store
                        .append_receipt(&receipted, validator.identifier(), signature.clone())?;
                }
                debug!(identifier = %receipted.identifier(), sequence = *receipted.sequence_number(), "accepted validator receipt");
                Ok(Outcome::Accepted(subject_state))
            }
            _ => unreachable!("attempt_receipt only sees receipts"),
        }
    }

    /// Tally stored witness receipts for `identifier`'s latest state
    /// against its witness threshold. Reports the distinct unmet-threshold
    /// condition; whether to wait for more receipts is the caller's
    /// policy; the processor never retries this on its own.
    pub fn witness_threshold_status(&self, identifier: &Identifier) -> Result<std::result::Result<(), Violation>> {
        let Some(state) = self.store.key_state(identifier)? else {
            return Ok(Err(Violation::MissingPriorState));
        };
        let mut have = 0usize;
        for witness in state.witnesses() {
            let issuer = Identifier::Basic(witness.clone());
            if self.store.latest_receipt(identifier, &issuer)?.is_some() {
                have += 1;
            }
        }
        let required = *state.witness_threshold();
        if have >= required as usize {
            Ok(Ok(()))
        } else {
            Ok(Err(Violation::WitnessThresholdUnmet { have, required }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{DigestAlgo, StandardProvider};
    use crate::event::{builder, DelegatingLocation, Format, InceptionData, Seal};
    use crate::identifier::IdentifierDerivation;
    use crate::store::MemoryStore;
    use crate::threshold::SigningThreshold;
    use crate::util::test;
    use std::collections::BTreeSet;

    fn processor() -> EventProcessor<MemoryStore, StandardProvider> {
        EventProcessor::new(MemoryStore::new(), StandardProvider::new())
    }

    #[test]
    fn accepts_a_simple_chain() {
        let mut processor = processor();
        let k0 = test::keypair(1);
        let k1 = test::keypair(2);
        let k2 = test::keypair(3);
        let icp = test::inception_with_next(&k0, &k1);
        let rot = test::rotation_with_next(&icp, &k1, Some(&k2));

        match processor.process(icp.clone()).unwrap() {
            Outcome::Accepted(state) => assert_eq!(*state.last_event().sequence_number(), 0),
            other => panic!("inception not accepted: {:?}", other),
        }
        match processor.process(rot).unwrap() {
            Outcome::Accepted(state) => {
                assert_eq!(*state.last_event().sequence_number(), 1);
                assert_eq!(state.keys().as_slice(), &[k1.public_key().clone()]);
            }
            other => panic!("rotation not accepted: {:?}", other),
        }
        assert_eq!(processor.escrowed(), 0);
    }

    #[test]
    fn out_of_order_chain_resolves_through_escrow() {
        let mut processor = processor();
        let k0 = test::keypair(1);
        let k1 = test::keypair(2);
        let k2 = test::keypair(3);
        let icp = test::inception_with_next(&k0, &k1);
        let rot = test::rotation_with_next(&icp, &k1, Some(&k2));
        let provider = StandardProvider::new();
        let ixn = builder::interact(
            icp.identifier().clone(),
            2,
            rot.coordinates(),
            vec![],
            Format::Json,
            &provider,
        )
        .unwrap()
        .sign(0, &k1)
        .unwrap();

        // deliver backwards: 2, 1, 0
        match processor.process(ixn).unwrap() {
            Outcome::Deferred(Dependency::Prior { sequence_number, .. }) => assert_eq!(sequence_number, 1),
            other => panic!("expected deferral, got {:?}", other),
        }
        match processor.process(rot).unwrap() {
            Outcome::Deferred(Dependency::Prior { sequence_number, .. }) => assert_eq!(sequence_number, 0),
            other => panic!("expected deferral, got {:?}", other),
        }
        assert_eq!(processor.escrowed(), 2);

        // inception unlocks the whole chain
        match processor.process(icp.clone()).unwrap() {
            Outcome::Accepted(..) => {}
            other => panic!("inception not accepted: {:?}", other),
        }
        assert_eq!(processor.escrowed(), 0);
        let state = processor.store().key_state(icp.identifier()).unwrap().unwrap();
        assert_eq!(*state.last_event().sequence_number(), 2);
    }

    #[test]
    fn interaction_before_inception_defers_then_lands() {
        let mut processor = processor();
        let k0 = test::keypair(1);
        let k1 = test::keypair(2);
        let icp = test::inception_with_next(&k0, &k1);
        let provider = StandardProvider::new();
        let ixn = builder::interact(
            icp.identifier().clone(),
            1,
            icp.coordinates(),
            vec![],
            Format::Json,
            &provider,
        )
        .unwrap()
        .sign(0, &k0)
        .unwrap();

        // not silently accepted: deferred on the missing prior state
        match processor.process(ixn).unwrap() {
            Outcome::Deferred(Dependency::Prior { identifier, sequence_number }) => {
                assert_eq!(&identifier, icp.identifier());
                assert_eq!(sequence_number, 0);
            }
            other => panic!("expected deferral, got {:?}", other),
        }
        assert!(processor.store().key_state(icp.identifier()).unwrap().is_none());

        processor.process(icp.clone()).unwrap();
        let state = processor.store().key_state(icp.identifier()).unwrap().unwrap();
        assert_eq!(*state.last_event().sequence_number(), 1);
    }

    #[test]
    fn forged_rotation_is_rejected_and_never_stored() {
        let mut processor = processor();
        let k0 = test::keypair(1);
        let k1 = test::keypair(2);
        let icp = test::inception_with_next(&k0, &k1);
        processor.process(icp.clone()).unwrap();

        // k9 was never committed to; this rotation is a forgery
        let forged = test::rotation_with_next(&icp, &test::keypair(9), None);
        match processor.process(forged).unwrap() {
            Outcome::Rejected(Violation::CommitmentMismatch) => {}
            other => panic!("expected commitment mismatch, got {:?}", other),
        }
        let state = processor.store().key_state(icp.identifier()).unwrap().unwrap();
        assert_eq!(*state.last_event().sequence_number(), 0);
    }

    #[test]
    fn delegated_inception_waits_for_its_anchor() {
        let mut processor = processor();
        let p = StandardProvider::new();
        let d0 = test::keypair(30);
        let k0 = test::keypair(31);

        let delegator_icp = test::inception_with_next(&d0, &test::keypair(32));
        let dip = builder::delegated_incept(
            InceptionData::new(
                SigningThreshold::unweighted(1),
                vec![k0.public_key().clone()],
                None,
                0,
                vec![],
                BTreeSet::new(),
            ),
            DelegatingLocation::new(delegator_icp.identifier().clone(), 1),
            IdentifierDerivation::SelfAddressing(DigestAlgo::Blake3_256),
            Format::Json,
            None,
            &p,
        )
        .unwrap()
        .sign(0, &k0)
        .unwrap();
        let anchoring = builder::interact(
            delegator_icp.identifier().clone(),
            1,
            delegator_icp.coordinates(),
            vec![Seal::Coordinates(dip.coordinates())],
            Format::Json,
            &p,
        )
        .unwrap()
        .sign(0, &d0)
        .unwrap();

        // the delegated inception arrives before its anchor exists
        match processor.process(dip.clone()).unwrap() {
            Outcome::Deferred(Dependency::Delegating { sequence_number, .. }) => assert_eq!(sequence_number, 1),
            other => panic!("expected deferral, got {:?}", other),
        }

        processor.process(delegator_icp.clone()).unwrap();
        // still waiting: the anchoring event itself hasn't arrived
        assert!(processor.store().key_state(dip.identifier()).unwrap().is_none());

        processor.process(anchoring).unwrap();
        let state = processor.store().key_state(dip.identifier()).unwrap().unwrap();
        assert_eq!(state.delegator().as_ref(), Some(delegator_icp.identifier()));
    }

    #[test]
    fn receipt_before_event_is_escrowed() {
        let mut processor = processor();
        let p = StandardProvider::new();
        let k0 = test::keypair(1);
        let w0 = test::keypair(40);
        let witness = crate::identifier::BasicIdentifier::new(w0.public_key().clone());
        let icp = builder::incept(
            InceptionData::new(
                SigningThreshold::unweighted(1),
                vec![k0.public_key().clone()],
                None,
                1,
                vec![witness.clone()],
                BTreeSet::new(),
            ),
            IdentifierDerivation::SelfAddressing(DigestAlgo::Blake3_256),
            Format::Json,
            None,
            &p,
        )
        .unwrap()
        .sign(0, &k0)
        .unwrap();
        let rct = builder::receipt(icp.coordinates(), Format::Json, &p)
            .unwrap()
            .with_signature(0, w0.sign(icp.bytes()))
            .unwrap();

        match processor.process(rct).unwrap() {
            Outcome::Deferred(Dependency::Receipted(coordinates)) => {
                assert_eq!(coordinates, icp.coordinates());
            }
            other => panic!("expected deferral, got {:?}", other),
        }
        assert_eq!(processor.witness_threshold_status(icp.identifier()).unwrap(), Err(Violation::MissingPriorState));

        processor.process(icp.clone()).unwrap();
        // the escrowed receipt was replayed on acceptance
        assert_eq!(processor.escrowed(), 0);
        assert_eq!(processor.witness_threshold_status(icp.identifier()).unwrap(), Ok(()));
        let issuer = Identifier::Basic(witness);
        assert!(processor
            .store()
            .latest_receipt(icp.identifier(), &issuer)
            .unwrap()
            .is_some());
    }

    #[test]
    fn witness_threshold_status_reports_shortfall() {
        let mut processor = processor();
        let p = StandardProvider::new();
        let k0 = test::keypair(1);
        let w0 = test::keypair(40);
        let w1 = test::keypair(41);
        let witnesses = vec![
            crate::identifier::BasicIdentifier::new(w0.public_key().clone()),
            crate::identifier::BasicIdentifier::new(w1.public_key().clone()),
        ];
        let icp = builder::incept(
            InceptionData::new(
                SigningThreshold::unweighted(1),
                vec![k0.public_key().clone()],
                None,
                2,
                witnesses,
                BTreeSet::new(),
            ),
            IdentifierDerivation::SelfAddressing(DigestAlgo::Blake3_256),
            Format::Json,
            None,
            &p,
        )
        .unwrap()
        .sign(0, &k0)
        .unwrap();
        processor.process(icp.clone()).unwrap();
        assert_eq!(
            processor.witness_threshold_status(icp.identifier()).unwrap(),
            Err(Violation::WitnessThresholdUnmet { have: 0, required: 2 })
        );

        let rct = builder::receipt(icp.coordinates(), Format::Json, &p)
            .unwrap()
            .with_signature(0, w0.sign(icp.bytes()))
            .unwrap();
        processor.process(rct).unwrap();
        assert_eq!(
            processor.witness_threshold_status(icp.identifier()).unwrap(),
            Err(Violation::WitnessThresholdUnmet { have: 1, required: 2 })
        );
    }
}
