//! Codec trait and implementations for text envelopes.
//!
//! Browser clients speak JSON over text frames, so the codec works on `str`
//! rather than raw bytes. Swapping in another text format only means adding
//! another [`Codec`] implementation.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Converts messages to and from their on-the-wire text form.
///
/// `Send + Sync + 'static` because one codec instance is shared by the arena
/// actor and every connection task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a text frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes a text frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the frame is malformed or does not
    /// match `T`.
    fn decode<T: DeserializeOwned>(&self, frame: &str) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
///
/// ```rust
/// use blastforge_protocol::{Codec, JsonCodec, ServerMessage};
///
/// let codec = JsonCodec;
/// let text = codec.encode(&ServerMessage::Countdown { countdown: 3 }).unwrap();
/// assert_eq!(text, r#"{"type":"countdown","payload":{"countdown":3}}"#);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, frame: &str) -> Result<T, ProtocolError> {
        serde_json::from_str(frame).map_err(ProtocolError::Decode)
    }
}
