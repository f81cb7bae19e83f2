//! Lobby configuration and phase state machine.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// LobbyConfig
// ---------------------------------------------------------------------------

/// Tunables for matchmaking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyConfig {
    /// Players required before the waiting timer starts.
    pub min_players: usize,
    /// Lobby capacity; reaching it starts the countdown immediately.
    pub max_players: usize,
    /// Length of the waiting timer in seconds.
    pub waiting_secs: u32,
    /// Length of the pre-match countdown in seconds.
    pub countdown_secs: u32,
    /// Nicknames are cut to this many characters.
    pub max_nickname_len: usize,
    /// Chat lines are cut to this many characters.
    pub max_chat_len: usize,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            max_players: 4,
            waiting_secs: 20,
            countdown_secs: 10,
            max_nickname_len: 15,
            max_chat_len: 200,
        }
    }
}

// ---------------------------------------------------------------------------
// LobbyPhase
// ---------------------------------------------------------------------------

/// Lifecycle phase of the (single) session hosted by the server.
///
/// ```text
/// Waiting → Countdown → Running → Ended → (fresh) Waiting
///              │
///              └──→ Waiting   (membership fell below the minimum)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LobbyPhase {
    Waiting,
    Countdown,
    Running,
    Ended,
}

impl LobbyPhase {
    /// Returns `true` if the phase is before match start.
    pub fn is_pre_match(self) -> bool {
        matches!(self, Self::Waiting | Self::Countdown)
    }

    /// Returns `true` if moving to `target` is a legal transition.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Waiting, Self::Countdown)
                | (Self::Countdown, Self::Waiting)
                | (Self::Countdown, Self::Running)
                | (Self::Running, Self::Ended)
                | (Self::Ended, Self::Waiting)
        )
    }
}

impl std::fmt::Display for LobbyPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Countdown => write!(f, "countdown"),
            Self::Running => write!(f, "running"),
            Self::Ended => write!(f, "ended"),
        }
    }
}
