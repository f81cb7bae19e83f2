//! Message types exchanged between browser clients and the server.
//!
//! Both directions use the same envelope shape:
//!
//! ```text
//! { "type": "<discriminant>", "payload": <object | value> }
//! ```
//!
//! which is serde's "adjacently tagged" enum representation. Clients dispatch
//! on `type` alone.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::StateSnapshot;

// ---------------------------------------------------------------------------
// Identity and grid coordinates
// ---------------------------------------------------------------------------

/// Opaque identifier the server assigns to a connected player.
///
/// Serialized as a bare number (`#[serde(transparent)]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// One tile of the arena, addressed by integer column (`x`) and row (`y`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring cell `steps` tiles away along `(dx, dy)`.
    pub fn offset(self, dx: i32, dy: i32, steps: i32) -> Self {
        Self::new(self.x + dx * steps, self.y + dy * steps)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// A gameplay intent sent inside an `action` envelope.
///
/// Internally tagged, so the payload reads `{"type":"move","dx":1,"dy":0}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    /// Step along the axes. Components are clamped to `-1.0..=1.0`.
    Move { dx: f64, dy: f64 },
    /// Drop a bomb on the tile under the player's centre.
    PlaceBomb,
}

/// Everything a client may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Ask to enter the lobby under a nickname.
    Join { nickname: String },
    /// Gameplay intent; only meaningful while a match runs.
    Action(Action),
    /// Chat line for everyone connected.
    Chat { message: String },
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// A lobby roster entry as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyPlayer {
    pub id: PlayerId,
    pub nickname: String,
}

/// Everything the server may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Join confirmation carrying the id assigned to this client.
    PlayerId(PlayerId),
    /// Current lobby roster.
    PlayerList(Vec<LobbyPlayer>),
    /// Seconds left on the waiting timer.
    Waiting { waiting: u32 },
    /// Seconds left before the match starts.
    Countdown { countdown: u32 },
    /// The match has started; snapshots follow.
    GameStart {},
    /// Authoritative full-state snapshot, one per tick.
    State(Box<StateSnapshot>),
    /// Chat line. System announcements use the nickname `"System"`.
    Chat { nickname: String, message: String },
    /// Match result. Both fields are `null` on a tie.
    Winner {
        id: Option<PlayerId>,
        nickname: Option<String>,
    },
    /// Policy violation reported to the offending client only.
    Error { message: String },
}
