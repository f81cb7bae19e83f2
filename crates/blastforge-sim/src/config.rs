//! Simulation constants.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Arena geometry and gameplay tunables.
///
/// All lengths are in pixels unless stated otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub map_width: u32,
    pub map_height: u32,
    pub tile_size: u32,
    /// Side of the square player bounding box.
    pub player_size: u32,
    /// Pixels moved per unit of input per speed tier.
    pub move_step: f64,
    pub fuse: Duration,
    pub explosion_lifetime: Duration,
    /// Chance that a free tile outside the spawn zones holds a block.
    pub block_chance: f64,
    /// Chance that a destroyed block leaves a power-up behind.
    pub powerup_chance: f64,
    pub starting_lives: u32,
    pub max_speed: u32,
    /// Side, in tiles, of the block-free square at each spawn corner.
    pub safe_zone: i32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            map_width: 760,
            map_height: 600,
            tile_size: 40,
            player_size: 32,
            move_step: 2.0,
            fuse: Duration::from_millis(3000),
            explosion_lifetime: Duration::from_millis(300),
            block_chance: 0.3,
            powerup_chance: 0.3,
            starting_lives: 3,
            max_speed: 3,
            safe_zone: 3,
        }
    }
}

impl SimConfig {
    /// Clamps values the simulation cannot run with: a zero tile, a map
    /// smaller than one tile, a player wider than a tile, chances outside
    /// `0.0..=1.0`, and zero lives or speed tiers.
    pub fn validated(mut self) -> Self {
        if self.tile_size == 0 {
            warn!(default = 40, "tile size of zero, using default");
            self.tile_size = 40;
        }
        if self.map_width < self.tile_size || self.map_height < self.tile_size {
            warn!(
                map_width = self.map_width,
                map_height = self.map_height,
                tile_size = self.tile_size,
                "map smaller than one tile, growing it"
            );
            self.map_width = self.map_width.max(self.tile_size);
            self.map_height = self.map_height.max(self.tile_size);
        }
        let player_size = self.player_size.clamp(1, self.tile_size);
        if player_size != self.player_size {
            warn!(
                requested = self.player_size,
                clamped = player_size,
                "player size out of range"
            );
            self.player_size = player_size;
        }
        self.block_chance = unit_interval(self.block_chance);
        self.powerup_chance = unit_interval(self.powerup_chance);
        self.starting_lives = self.starting_lives.max(1);
        self.max_speed = self.max_speed.max(1);
        self
    }

    /// Map width in tiles.
    pub fn cols(&self) -> i32 {
        (self.map_width / self.tile_size) as i32
    }

    /// Map height in tiles.
    pub fn rows(&self) -> i32 {
        (self.map_height / self.tile_size) as i32
    }

    /// Pixel spawn positions by lobby slot: top-left, top-right,
    /// bottom-left, bottom-right. Each sits 4 px in from its corner.
    pub fn spawn_points(&self) -> [(f64, f64); 4] {
        let inset = 4.0;
        let far_x = self.map_width as f64 - self.player_size as f64 - inset;
        let far_y = self.map_height as f64 - self.player_size as f64 - inset;
        [
            (inset, inset),
            (far_x, inset),
            (inset, far_y),
            (far_x, far_y),
        ]
    }
}

fn unit_interval(chance: f64) -> f64 {
    if chance.is_nan() { 0.0 } else { chance.clamp(0.0, 1.0) }
}
