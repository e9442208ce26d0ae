//! The event store contract the core consumes, plus an in-memory
//! implementation for tests and embedding.
//!
//! The store is the only shared mutable resource in the system. Its one
//! hard obligation: appends for a given identifier must be serialized, so
//! the sequence-number and previous-digest invariants are checked against
//! a single totally ordered log. Different identifiers' logs are
//! independent.

use crate::{
    crypto::Signature,
    error::{Error, Result},
    event::{KeyEvent, KeyEventCoordinates},
    identifier::Identifier,
    state::KeyState,
};
use std::collections::HashMap;

/// The narrow query/append interface the processor drives.
pub trait EventStore {
    /// Append a validated event together with the state it produced. The
    /// event must land exactly at the tail of its identifier's log.
    fn append(&mut self, event: KeyEvent, state: KeyState) -> Result<()>;

    /// The latest key state for an identifier, if any.
    fn key_state(&self, identifier: &Identifier) -> Result<Option<KeyState>>;

    /// The key state as of the event at the given coordinates.
    fn key_state_at(&self, coordinates: &KeyEventCoordinates) -> Result<Option<KeyState>>;

    /// The event at a given position in an identifier's log.
    fn event_at_sequence(&self, identifier: &Identifier, sequence_number: u64) -> Result<Option<KeyEvent>>;

    /// The event at the given coordinates. The stored event's digest must
    /// equal the requested one exactly, same algorithm and same bytes;
    /// there is no re-hash-under-alternate-algorithms fallback.
    fn event_at(&self, coordinates: &KeyEventCoordinates) -> Result<Option<KeyEvent>> {
        Ok(self
            .event_at_sequence(coordinates.identifier(), *coordinates.sequence_number())?
            .filter(|event| event.digest() == coordinates.digest()))
    }

    /// The ordered events of an identifier's log from `from_sequence` on.
    fn events(&self, identifier: &Identifier, from_sequence: u64) -> Result<Vec<KeyEvent>>;

    /// Record a verified receipt signature from `issuer` over the event at
    /// `receipted`.
    fn append_receipt(&mut self, receipted: &KeyEventCoordinates, issuer: &Identifier, signature: Signature)
        -> Result<()>;

    /// The most recent receipt signature `issuer` has produced over any of
    /// `subject`'s events.
    fn latest_receipt(&self, subject: &Identifier, issuer: &Identifier) -> Result<Option<Signature>>;
}

/// A HashMap-backed store. Fine for tests and single-process embedding;
/// persistence engines implement [`EventStore`] themselves.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    logs: HashMap<Identifier, Vec<(KeyEvent, KeyState)>>,
    receipts: HashMap<(Identifier, Identifier), Vec<(KeyEventCoordinates, Signature)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventStore for MemoryStore {
    fn append(&mut self, event: KeyEvent, state: KeyState) -> Result<()> {
        let log = self.logs.entry(event.identifier().clone()).or_default();
        if *event.sequence_number() != log.len() as u64 {
            Err(Error::AppendOutOfOrder)?;
        }
        log.push((event, state));
        Ok(())
    }

    fn key_state(&self, identifier: &Identifier) -> Result<Option<KeyState>> {
        Ok(self
            .logs
            .get(identifier)
            .and_then(|log| log.last())
            .map(|(_, state)| state.clone()))
    }

    fn key_state_at(&self, coordinates: &KeyEventCoordinates) -> Result<Option<KeyState>> {
        Ok(self
            .logs
            .get(coordinates.identifier())
            .and_then(|log| log.get(*coordinates.sequence_number() as usize))
            .filter(|(event, _)| event.digest() == coordinates.digest())
            .map(|(_, state)| state.clone()))
    }

    fn event_at_sequence(&self, identifier: &Identifier, sequence_number: u64) -> Result<Option<KeyEvent>> {
        Ok(self
            .logs
            .get(identifier)
            .and_then(|log| log.get(sequence_number as usize))
            .map(|(event, _)| event.clone()))
    }

    fn events(&self, identifier: &Identifier, from_sequence: u64) -> Result<Vec<KeyEvent>> {
        Ok(self
            .logs
            .get(identifier)
            .map(|log| {
                log.iter()
                    .skip(from_sequence as usize)
                    .map(|(event, _)| event.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    fn append_receipt(
        &mut self,
        receipted: &KeyEventCoordinates,
        issuer: &Identifier,
        signature: Signature,
    ) -> Result<()> {
        self.receipts
            .entry((receipted.identifier().clone(), issuer.clone()))
            .or_default()
            .push((receipted.clone(), signature));
        Ok(())
    }

    fn latest_receipt(&self, subject: &Identifier, issuer: &Identifier) -> Result<Option<Signature>> {
        Ok(self
            .receipts
            .get(&(subject.clone(), issuer.clone()))
            .and_then(|receipts| receipts.last())
            .map(|(_, signature)| signature.clone()))
    }
}
