//! Error types for the lobby layer.

use blastforge_protocol::PlayerId;

/// Reasons a join request is refused.
///
/// The `Display` text is what the offending client sees in its `error`
/// message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    /// Every lobby slot is taken. The connection is closed afterwards.
    #[error("Lobby is full ({max}/{max} players)")]
    LobbyFull { max: usize },

    /// Another waiting or still-alive player uses this nickname
    /// (compared trimmed and case-insensitively).
    #[error("Nickname \"{0}\" is already taken")]
    NicknameTaken(String),

    /// The nickname is blank after trimming.
    #[error("Nickname must not be empty")]
    EmptyNickname,

    /// A match is running; joining is possible again once it ends.
    #[error("A match is in progress, try again when it ends")]
    MatchInProgress,

    /// The player already holds a lobby slot.
    #[error("player {0} has already joined")]
    AlreadyJoined(PlayerId),
}

impl JoinError {
    /// Whether the server should close the connection after reporting this
    /// error. Only a full lobby does; every other refusal lets the client
    /// retry on the same connection.
    pub fn closes_connection(&self) -> bool {
        matches!(self, Self::LobbyFull { .. })
    }
}
