//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding envelopes.
///
/// The server treats every decode failure as a protocol error: the frame is
/// dropped and the connection stays open.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a message into text).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, missing fields, or an unknown
    /// `type` discriminant.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}
