//! Error types for the protocol layer.
//!
//! Each crate in Tripgate defines its own error enum. When you see a
//! `ProtocolError`, you know the problem is in the shape of the data
//! (encoding, decoding, unknown enum values), not in the network or in
//! session bookkeeping.

/// Errors that can occur in the protocol layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into text).
    #[error("encode failed: {0}")]
    Encode(String),

    /// Deserialization failed (turning text into a Rust type).
    ///
    /// Common causes: malformed JSON, missing required fields, or data
    /// written by another application under the same storage key.
    #[error("decode failed: {0}")]
    Decode(String),

    /// A string didn't name any variant of a closed set
    /// (role, specialization, verification status, agent type).
    ///
    /// The first field is the kind of value, the second the raw input.
    #[error("unknown {0}: {1:?}")]
    UnknownVariant(&'static str, String),

    /// A required field was blank. Checked before anything is sent, so
    /// the server never sees a half-filled form.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The server answered with an `{ error, message }` envelope.
    #[error("server rejected request: {0}")]
    Rejected(String),
}
