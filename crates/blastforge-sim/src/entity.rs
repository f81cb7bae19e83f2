//! Per-match entities.

use std::time::Duration;

use blastforge_protocol::{
    BombState, Cell, ExplosionState, PlayerId, PlayerState, PowerUpKind, PowerUpState,
};

/// Milliseconds left on a timer, as shipped in snapshots.
fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// A combatant. Position is the pixel top-left of its square bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
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

impl Player {
    pub fn new(id: PlayerId, nickname: impl Into<String>, spawn: (f64, f64), lives: u32) -> Self {
        Self {
            id,
            nickname: nickname.into(),
            x: spawn.0,
            y: spawn.1,
            lives,
            max_bombs: 1,
            active_bombs: 0,
            power: 1,
            speed: 1,
            alive: true,
        }
    }

    /// The tile under the centre of the bounding box.
    pub fn center_cell(&self, size: u32, tile: u32) -> Cell {
        let half = size as f64 / 2.0;
        tile_of(self.x + half, self.y + half, tile)
    }

    /// Every tile the bounding box touches: up to four, one per corner.
    pub fn occupied_cells(&self, size: u32, tile: u32) -> Vec<Cell> {
        corner_cells(self.x, self.y, size, tile)
    }

    pub fn can_place_bomb(&self) -> bool {
        self.alive && self.active_bombs < self.max_bombs
    }

    /// Removes one life. Returns `true` if this hit was fatal.
    pub fn take_hit(&mut self) -> bool {
        if !self.alive {
            return false;
        }
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            self.alive = false;
        }
        !self.alive
    }

    pub fn collect(&mut self, kind: PowerUpKind, max_speed: u32) {
        match kind {
            PowerUpKind::Bombs => self.max_bombs += 1,
            PowerUpKind::Flames => self.power += 1,
            PowerUpKind::Speed => self.speed = (self.speed + 1).min(max_speed),
        }
    }

    pub fn to_state(&self) -> PlayerState {
        PlayerState {
            id: self.id,
            nickname: self.nickname.clone(),
            x: self.x,
            y: self.y,
            lives: self.lives,
            max_bombs: self.max_bombs,
            active_bombs: self.active_bombs,
            power: self.power,
            speed: self.speed,
            alive: self.alive,
        }
    }
}

/// The tile containing pixel `(x, y)`.
pub(crate) fn tile_of(x: f64, y: f64, tile: u32) -> Cell {
    let t = tile as f64;
    Cell::new((x / t).floor() as i32, (y / t).floor() as i32)
}

/// Distinct tiles under the four corners of a `size`-pixel box at `(x, y)`.
/// The far corners sit at `size - 1` so a box flush against a tile edge does
/// not spill into the next tile.
pub(crate) fn corner_cells(x: f64, y: f64, size: u32, tile: u32) -> Vec<Cell> {
    let far = size.saturating_sub(1) as f64;
    let mut cells = Vec::with_capacity(4);
    for (cx, cy) in [(x, y), (x + far, y), (x, y + far), (x + far, y + far)] {
        let cell = tile_of(cx, cy, tile);
        if !cells.contains(&cell) {
            cells.push(cell);
        }
    }
    cells
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bomb {
    pub cell: Cell,
    pub remaining: Duration,
    pub power: u32,
    pub owner: PlayerId,
}

impl Bomb {
    pub fn to_state(&self, tile: u32) -> BombState {
        let (x, y) = pixel_origin(self.cell, tile);
        BombState {
            x,
            y,
            timer: millis(self.remaining),
            power: self.power,
            owner: self.owner,
        }
    }
}

/// A blast cell still on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Explosion {
    pub cell: Cell,
    pub remaining: Duration,
}

impl Explosion {
    pub fn to_state(&self, tile: u32) -> ExplosionState {
        let (x, y) = pixel_origin(self.cell, tile);
        ExplosionState {
            x,
            y,
            timer: millis(self.remaining),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PowerUp {
    pub cell: Cell,
    pub kind: PowerUpKind,
}

impl PowerUp {
    pub fn to_state(&self, tile: u32) -> PowerUpState {
        let (x, y) = pixel_origin(self.cell, tile);
        PowerUpState {
            x,
            y,
            kind: self.kind,
        }
    }
}

fn pixel_origin(cell: Cell, tile: u32) -> (i32, i32) {
    let t = tile as i32;
    (cell.x * t, cell.y * t)
}
