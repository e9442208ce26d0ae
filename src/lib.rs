//! Welcome to the Keric core, the verification engine of a KERI-style
//! self-certifying key-management protocol.
//!
//! Nobody issues a Keric identifier. It is derived from, and
//! cryptographically bound to, an append-only log of signed key events: the
//! identifier either *is* a public key, or it is a digest or signature of
//! its own inception event. From then on the only way to learn an
//! identifier's current keys is to replay its log, and the only way to
//! change those keys is to extend the log with an event that satisfies a
//! thicket of invariants: contiguous sequencing, digest chaining to the
//! prior event, threshold signatures by the current keys, and (for
//! rotations) a match against a digest commitment published *before* the
//! new keys were ever used. Together these make forgery and silent key
//! compromise detectable by any verifier holding the log.
//!
//! What lives here:
//!
//! 1. Identifier derivation and the self-referential canonical
//! serialization needed to hash or sign an event that embeds its own
//! identifier ([identifier], [event::wire]).
//! 1. The key-event-log state machine and its fold-to-state algorithm
//! ([state]).
//! 1. The event validator enforcing every transition invariant
//! ([validate]).
//! 1. Weighted and unweighted signing-threshold evaluation ([threshold]).
//! 1. The pre-rotation key-commitment digest scheme ([commitment]).
//! 1. The orchestrating event processor with its escrow for out-of-order
//! arrivals ([process]).
//!
//! What deliberately does not live here: raw digest/signature primitives
//! (consumed through [crypto::CryptoProvider]), wire transport, persistent
//! storage (consumed through [store::EventStore]), and consensus among
//! witnesses. The core is synchronous, pure where it can be, and safe to
//! call from many threads as long as the store serializes appends per
//! identifier.

pub mod error;
pub(crate) mod util;
pub mod crypto;
pub mod identifier;
pub mod threshold;
pub mod commitment;
pub mod event;
pub mod state;
pub mod validate;
pub mod process;
pub mod store;
