//! The main error enum for the project lives here, and documents the various
//! conditions that can arise while interacting with the system.

use thiserror::Error;

/// This is our error enum. It contains an entry for any part of the system in
/// which an expectation is not met or a problem occurs.
#[derive(Error, Debug)]
pub enum Error {
    /// Events can only be appended at the tail of an identifier's log.
    #[error("events must be appended in log order")]
    AppendOutOfOrder,

    /// An error while decoding base64 text.
    #[error("base64 decoding error")]
    Base64Decode(#[from] base64::DecodeError),

    /// A byte slice had the wrong length for the material it claims to hold.
    #[error("cryptographic material has an incorrect length")]
    BadLength,

    /// A signature failed to verify.
    #[error("the given signature/public key/data combo does not verify")]
    CryptoSignatureVerificationFailed,

    /// An error while deserializing CBOR.
    #[error("cbor serialization error")]
    Cbor(#[from] serde_cbor::Error),

    /// An error while deserializing msgpack.
    #[error("msgpack deserialization error")]
    DeserializeMsgPack(#[from] rmp_serde::decode::Error),

    /// A signature was attached twice for the same key index.
    #[error("a signature for this key index is already attached")]
    DuplicateSignature,

    /// The size embedded in an event's version string does not match the
    /// actual length of the received bytes.
    #[error("event size field says {declared} bytes but {actual} were received")]
    EventSizeMismatch {
        /// Size parsed out of the version string
        declared: usize,
        /// Actual length of the byte buffer
        actual: usize,
    },

    /// An event field required for its type is missing from the wire form.
    #[error("event is missing required field `{0}`")]
    EventFieldMissing(&'static str),

    /// A Basic or SelfSigning identifier was asked to derive from a key list
    /// that doesn't hold exactly one key.
    #[error("this identifier derivation requires exactly one key")]
    IdentifierKeyCount,

    /// A key event was rejected by the validator.
    #[error("invalid key event: {0}")]
    InvalidKeyEvent(#[from] crate::validate::Violation),

    /// An error while serializing JSON.
    #[error("json serialization error")]
    Json(#[from] serde_json::Error),

    /// Tried to apply a non-inception event without prior key state.
    #[error("prior key state is required to apply this event")]
    PriorStateMissing,

    /// Tried to apply an inception event on top of existing key state.
    #[error("inception cannot be applied to existing key state")]
    PriorStateExists,

    /// Receipts corroborate events; they never produce key state.
    #[error("receipt events do not produce key state")]
    ReceiptHasNoState,

    /// An error while serializing msgpack.
    #[error("msgpack serialization error")]
    SerializeMsgPack(#[from] rmp_serde::encode::Error),

    /// Self-signing derivation was requested without a signing keypair.
    #[error("a signing keypair is required for self-signing derivation")]
    SignerMissing,

    /// The supplied signing keypair does not match the inception key.
    #[error("the signing keypair does not match the inception key")]
    SignerMismatch,

    /// A sequence number field could not be parsed as lower-hex.
    #[error("sequence number `{0}` is not valid lower-hex")]
    SequenceMalformed(String),

    /// A signing-threshold clause can never be satisfied (its full weight
    /// sum is below one).
    #[error("weighted threshold clause sums below one and can never be met")]
    ThresholdUnsatisfiable,

    /// A threshold weight could not be parsed.
    #[error("threshold weight `{0}` is malformed")]
    WeightMalformed(String),

    /// A weight numerator or denominator of zero was supplied.
    #[error("threshold weights must be positive")]
    WeightZero,

    /// A configuration trait code we don't recognize.
    #[error("unknown configuration trait `{0}`")]
    UnknownConfigurationTrait(String),

    /// An event type code we don't recognize.
    #[error("unknown event type `{0}`")]
    UnknownEventType(String),

    /// A serialization format code we don't recognize.
    #[error("unknown serialization format `{0}`")]
    UnknownFormat(String),

    /// A qualified-material code prefix we don't recognize.
    #[error("unknown material code on `{0}`")]
    UnknownMaterialCode(String),

    /// The version string at the head of an event could not be parsed.
    #[error("event version string is malformed")]
    VersionMalformed,
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        // i'm sorry...
        //
        // TODO: implement a real PartialEq. cannot derive because the wrapped
        // serializer errors are not eq-able. tonight we dine in hell.
        format!("{:?}", self) == format!("{:?}", other)
    }
}

/// Wraps `std::result::Result` around our `Error` enum
pub type Result<T> = std::result::Result<T, Error>;
