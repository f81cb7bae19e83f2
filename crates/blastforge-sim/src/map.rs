//! Deterministic arena generation.
//!
//! Walls sit on every odd column and odd row, so each open tile always has an
//! open or destructible neighbour. Blocks are scattered over the remaining
//! tiles with a seeded PCG generator, keeping the four spawn corners clear.
//! The same seed always yields the same layout.

use std::collections::BTreeSet;

use blastforge_protocol::Cell;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::SimConfig;

/// Indestructible walls and destructible blocks on a `cols × rows` grid.
///
/// The two sets are disjoint. Walls never change after generation; blocks
/// only ever shrink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapLayout {
    cols: i32,
    rows: i32,
    walls: BTreeSet<Cell>,
    blocks: BTreeSet<Cell>,
}

impl MapLayout {
    /// An open arena with no walls or blocks.
    pub fn empty(cols: i32, rows: i32) -> Self {
        Self {
            cols,
            rows,
            walls: BTreeSet::new(),
            blocks: BTreeSet::new(),
        }
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn walls(&self) -> &BTreeSet<Cell> {
        &self.walls
    }

    pub fn blocks(&self) -> &BTreeSet<Cell> {
        &self.blocks
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        (0..self.cols).contains(&cell.x) && (0..self.rows).contains(&cell.y)
    }

    pub fn is_wall(&self, cell: Cell) -> bool {
        self.walls.contains(&cell)
    }

    pub fn is_block(&self, cell: Cell) -> bool {
        self.blocks.contains(&cell)
    }

    /// Walls and blocks both stop movement.
    pub fn is_solid(&self, cell: Cell) -> bool {
        self.is_wall(cell) || self.is_block(cell)
    }

    /// Adds a wall, displacing any block on that tile.
    pub fn insert_wall(&mut self, cell: Cell) {
        self.blocks.remove(&cell);
        self.walls.insert(cell);
    }

    /// Adds a block unless the tile is a wall. Returns whether it was added.
    pub fn insert_block(&mut self, cell: Cell) -> bool {
        !self.walls.contains(&cell) && self.blocks.insert(cell)
    }

    /// Destroys a block. Returns whether one was there.
    pub fn remove_block(&mut self, cell: Cell) -> bool {
        self.blocks.remove(&cell)
    }
}

/// Builds [`MapLayout`]s from a seed.
#[derive(Debug, Clone, PartialEq)]
pub struct MapGenerator {
    cols: i32,
    rows: i32,
    block_chance: f64,
    safe_zone: i32,
}

impl MapGenerator {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            cols: config.cols(),
            rows: config.rows(),
            block_chance: config.block_chance.clamp(0.0, 1.0),
            safe_zone: config.safe_zone,
        }
    }

    /// Produces the layout for `seed`. Pure: equal seeds give equal layouts.
    pub fn generate(&self, seed: u64) -> MapLayout {
        let mut layout = MapLayout::empty(self.cols, self.rows);
        self.regenerate(&mut layout, seed);
        layout
    }

    /// Refills `layout` in place for `seed`, discarding whatever it held.
    pub fn regenerate(&self, layout: &mut MapLayout, seed: u64) {
        layout.cols = self.cols;
        layout.rows = self.rows;
        layout.walls.clear();
        layout.blocks.clear();

        for x in (1..self.cols).step_by(2) {
            for y in (1..self.rows).step_by(2) {
                layout.walls.insert(Cell::new(x, y));
            }
        }

        let mut rng = Pcg32::seed_from_u64(seed);
        for x in 0..self.cols {
            for y in 0..self.rows {
                let cell = Cell::new(x, y);
                if layout.walls.contains(&cell) || self.in_spawn_zone(cell) {
                    continue;
                }
                if rng.random_bool(self.block_chance) {
                    layout.blocks.insert(cell);
                }
            }
        }

        tracing::debug!(
            seed,
            walls = layout.walls.len(),
            blocks = layout.blocks.len(),
            "map generated"
        );
    }

    /// Whether `cell` lies in one of the four corner squares kept free of
    /// blocks so every player can move and bomb on the first tick.
    pub fn in_spawn_zone(&self, cell: Cell) -> bool {
        let near_left = cell.x < self.safe_zone;
        let near_right = cell.x >= self.cols - self.safe_zone;
        let near_top = cell.y < self.safe_zone;
        let near_bottom = cell.y >= self.rows - self.safe_zone;
        (near_left || near_right) && (near_top || near_bottom)
    }
}
