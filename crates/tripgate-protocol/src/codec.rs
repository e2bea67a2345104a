//! Codec trait and implementations for serializing records to text.
//!
//! Durable client storage (browser local storage, a JSON file, ...) holds
//! strings, so the session record has to be turned into text before it is
//! written and parsed back when the process restarts. The session layer
//! doesn't care HOW: it just needs something that implements [`Codec`].

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to text and decode text back.
///
/// ## Trait bounds explained
///
/// - `Send + Sync` → safe to share between tasks (the session store lives
///   behind a lock that any task may take).
/// - `'static` → the codec owns everything it needs.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into text.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes text back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the text is malformed,
    /// truncated, or doesn't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &str,
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// JSON is what browser storage conventionally holds, and it is readable
/// in DevTools when a session needs debugging.
///
/// ## Example
///
/// ```rust
/// use tripgate_protocol::{Codec, JsonCodec, Role};
///
/// let codec = JsonCodec;
/// let text = codec.encode(&Role::Agent).unwrap();
/// assert_eq!(text, "\"AGENT\"");
///
/// let decoded: Role = codec.decode(&text).unwrap();
/// assert_eq!(decoded, Role::Agent);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value)
            .map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &str,
    ) -> Result<T, ProtocolError> {
        serde_json::from_str(data)
            .map_err(|e| ProtocolError::Decode(e.to_string()))
    }
}
