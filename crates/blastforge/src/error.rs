//! Unified error type for the Blastforge server.

use blastforge_protocol::ProtocolError;
use blastforge_transport::TransportError;

/// Top-level error wrapping the errors of the layers below.
///
/// Join refusals are not here: they are reported to the client as `error`
/// messages and never abort a connection task.
#[derive(Debug, thiserror::Error)]
pub enum BlastforgeError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The arena task has stopped and no longer accepts commands.
    #[error("arena is not running")]
    ArenaUnavailable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::Send("gone".into());
        let err: BlastforgeError = err.into();
        assert!(matches!(err, BlastforgeError::Transport(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let decode = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: BlastforgeError = ProtocolError::Decode(decode).into();
        assert!(matches!(err, BlastforgeError::Protocol(_)));
    }
}
