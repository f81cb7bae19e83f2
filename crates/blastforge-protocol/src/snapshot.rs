//! Full-state snapshot types.
//!
//! Sessions are small (at most four players), so the server ships the whole
//! state every tick instead of deltas. Field names are camelCase for the
//! browser renderer.

use serde::{Deserialize, Serialize};

use crate::{Cell, PlayerId};

/// The kind of a collectible power-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerUpKind {
    /// One more simultaneous bomb.
    Bombs,
    /// One more tile of blast reach.
    Flames,
    /// One speed tier faster, up to the configured cap.
    Speed,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 3] = [Self::Bombs, Self::Flames, Self::Speed];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub id: PlayerId,
    pub nickname: String,
    pub x: f64,
    pub y: f64,
    pub lives: u32,
    pub max_bombs: u32,
    pub active_bombs: u32,
    pub power: u32,
    pub speed: u32,
    pub alive: bool,
}

/// A live bomb. `x`/`y` are the pixel origin of its tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BombState {
    pub x: i32,
    pub y: i32,
    /// Milliseconds until detonation.
    pub timer: u64,
    pub power: u32,
    pub owner: PlayerId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplosionState {
    pub x: i32,
    pub y: i32,
    /// Milliseconds until the blast cell disappears.
    pub timer: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUpState {
    pub x: i32,
    pub y: i32,
    #[serde(rename = "type")]
    pub kind: PowerUpKind,
}

/// Everything a renderer needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub players: Vec<PlayerState>,
    pub bombs: Vec<BombState>,
    pub explosions: Vec<ExplosionState>,
    pub powerups: Vec<PowerUpState>,
    pub walls: Vec<Cell>,
    pub blocks: Vec<Cell>,
    pub map_width: u32,
    pub map_height: u32,
    pub tile_size: u32,
}
