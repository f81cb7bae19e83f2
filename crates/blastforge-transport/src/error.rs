//! Transport-layer errors.

use std::io;

/// Why a transport or connection operation failed.
///
/// Socket-library errors are flattened to their message so the type does
/// not depend on which transport feature is enabled.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Accepting a TCP connection failed.
    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    /// The peer connected but the WebSocket upgrade failed.
    #[error("handshake with {peer} failed: {reason}")]
    Handshake { peer: String, reason: String },

    /// The peer did not finish the WebSocket upgrade in time.
    #[error("handshake with {peer} timed out after {timeout:?}")]
    HandshakeTimeout {
        peer: String,
        timeout: std::time::Duration,
    },

    /// Writing a frame failed; the peer is most likely gone.
    #[error("send failed: {0}")]
    Send(String),

    /// Reading a frame failed.
    #[error("receive failed: {0}")]
    Receive(String),
}
