//! The per-match state store and tick engine.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::time::Duration;

use blastforge_protocol::{Action, Cell, PlayerId, PowerUpKind, StateSnapshot};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::blast::blast_cells;
use crate::entity::{corner_cells, Bomb, Explosion, Player, PowerUp};
use crate::{MapGenerator, MapLayout, SimConfig};

/// How a match ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Exactly one player is still alive.
    Winner { id: PlayerId, nickname: String },
    /// Nobody survived, e.g. the last two died in the same tick.
    Tie,
}

/// What happened during one [`Session::tick`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Bomb tiles that went off, in resolution order.
    pub detonated: Vec<Cell>,
    /// Every cell hit by this tick's blasts.
    pub blast: BTreeSet<Cell>,
    /// Blocks removed this tick.
    pub destroyed: Vec<Cell>,
    /// Players who lost their last life this tick.
    pub eliminated: Vec<PlayerId>,
    /// Set on the tick the match is decided, and only on that tick.
    pub outcome: Option<MatchOutcome>,
}

/// One running match.
///
/// Tile-keyed maps enforce at most one bomb, explosion and power-up per cell.
/// Ordered collections keep every iteration (and therefore every RNG draw)
/// reproducible for a given seed and input sequence.
#[derive(Debug)]
pub struct Session {
    config: SimConfig,
    map: MapLayout,
    players: BTreeMap<PlayerId, Player>,
    bombs: BTreeMap<Cell, Bomb>,
    explosions: BTreeMap<Cell, Explosion>,
    powerups: BTreeMap<Cell, PowerUp>,
    rng: Pcg32,
    over: bool,
}

impl Session {
    /// Starts a match on a freshly generated map.
    ///
    /// Players spawn at the corners in roster order.
    pub fn new(
        config: SimConfig,
        seed: u64,
        roster: impl IntoIterator<Item = (PlayerId, String)>,
    ) -> Self {
        let map = MapGenerator::new(&config).generate(seed);
        Self::with_map(config, map, seed, roster)
    }

    /// Starts a match on a prepared map.
    pub fn with_map(
        config: SimConfig,
        map: MapLayout,
        seed: u64,
        roster: impl IntoIterator<Item = (PlayerId, String)>,
    ) -> Self {
        let spawns = config.spawn_points();
        let players = roster
            .into_iter()
            .enumerate()
            .map(|(slot, (id, nickname))| {
                let spawn = spawns[slot % spawns.len()];
                (id, Player::new(id, nickname, spawn, config.starting_lives))
            })
            .collect::<BTreeMap<_, _>>();

        tracing::info!(seed, players = players.len(), "session started");

        Self {
            config,
            map,
            players,
            bombs: BTreeMap::new(),
            explosions: BTreeMap::new(),
            powerups: BTreeMap::new(),
            // Separate stream from the map generator's.
            rng: Pcg32::seed_from_u64(seed.wrapping_add(1)),
            over: false,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn map(&self) -> &MapLayout {
        &self.map
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn bombs(&self) -> impl Iterator<Item = &Bomb> {
        self.bombs.values()
    }

    pub fn explosions(&self) -> impl Iterator<Item = &Explosion> {
        self.explosions.values()
    }

    pub fn powerups(&self) -> impl Iterator<Item = &PowerUp> {
        self.powerups.values()
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    pub fn alive_count(&self) -> usize {
        self.players.values().filter(|p| p.alive).count()
    }

    /// Nicknames of players still in the fight. Joiners may not reuse them.
    pub fn alive_nicknames(&self) -> Vec<&str> {
        self.players
            .values()
            .filter(|p| p.alive)
            .map(|p| p.nickname.as_str())
            .collect()
    }

    /// Applies one client action. Returns whether it changed anything.
    ///
    /// Actions from unknown or eliminated players are ignored, as is
    /// everything once the match is decided.
    pub fn apply_action(&mut self, id: PlayerId, action: &Action) -> bool {
        if self.over {
            return false;
        }
        match *action {
            Action::Move { dx, dy } => self.move_player(id, dx, dy),
            Action::PlaceBomb => self.place_bomb(id),
        }
    }

    fn move_player(&mut self, id: PlayerId, dx: f64, dy: f64) -> bool {
        let Some(player) = self.players.get(&id).filter(|p| p.alive) else {
            return false;
        };
        let step = player.speed as f64 * self.config.move_step;
        let (mut x, mut y) = (player.x, player.y);
        let mut moved = false;

        // Axes are tried independently so a player can slide along a wall.
        let dx = unit(dx);
        if dx != 0.0 && self.is_valid_position(x + dx * step, y) {
            x += dx * step;
            moved = true;
        }
        let dy = unit(dy);
        if dy != 0.0 && self.is_valid_position(x, y + dy * step) {
            y += dy * step;
            moved = true;
        }

        if moved {
            if let Some(player) = self.players.get_mut(&id) {
                player.x = x;
                player.y = y;
            }
        }
        moved
    }

    fn place_bomb(&mut self, id: PlayerId) -> bool {
        let size = self.config.player_size;
        let tile = self.config.tile_size;
        let fuse = self.config.fuse;
        let Some(player) = self.players.get_mut(&id).filter(|p| p.can_place_bomb()) else {
            return false;
        };
        let cell = player.center_cell(size, tile);
        if self.bombs.contains_key(&cell) {
            return false;
        }
        player.active_bombs += 1;
        self.bombs.insert(
            cell,
            Bomb {
                cell,
                remaining: fuse,
                power: player.power,
                owner: id,
            },
        );
        tracing::debug!(player = %id, %cell, "bomb placed");
        true
    }

    /// Whether a player box at pixel `(x, y)` stays on the map and clear of
    /// walls and blocks.
    pub fn is_valid_position(&self, x: f64, y: f64) -> bool {
        let far = self.config.player_size.saturating_sub(1) as f64;
        if x < 0.0
            || y < 0.0
            || x + far >= self.config.map_width as f64
            || y + far >= self.config.map_height as f64
        {
            return false;
        }
        corner_cells(x, y, self.config.player_size, self.config.tile_size)
            .into_iter()
            .all(|cell| !self.map.is_solid(cell))
    }

    /// Drops a player from the match. Bombs they already placed still go off.
    pub fn remove_player(&mut self, id: PlayerId) -> Option<Player> {
        let removed = self.players.remove(&id);
        if removed.is_some() {
            tracing::info!(player = %id, remaining = self.players.len(), "player left match");
        }
        removed
    }

    /// Advances the match by `dt`.
    ///
    /// Order within a tick: fuses burn, due bombs detonate (with chains),
    /// blasted blocks break, blasted players take one hit, power-ups are
    /// collected, explosions age, and finally the match is checked for a
    /// winner.
    pub fn tick(&mut self, dt: Duration) -> TickReport {
        let mut report = TickReport::default();
        if self.over {
            return report;
        }

        let mut due = Vec::new();
        for (cell, bomb) in self.bombs.iter_mut() {
            bomb.remaining = bomb.remaining.saturating_sub(dt);
            if bomb.remaining.is_zero() {
                due.push(*cell);
            }
        }

        if !due.is_empty() {
            self.detonate(due, &mut report);
            self.break_blocks(&mut report);
            self.apply_damage(&mut report);
        }

        self.collect_powerups();

        self.explosions.retain(|_, explosion| {
            explosion.remaining = explosion.remaining.saturating_sub(dt);
            !explosion.remaining.is_zero()
        });

        report.outcome = self.check_outcome();
        report
    }

    /// Resolves every due bomb and any bomb its blast reaches, each exactly
    /// once. Rays are cast against the block set as it stood before this
    /// tick's destruction.
    fn detonate(&mut self, due: Vec<Cell>, report: &mut TickReport) {
        let lifetime = self.config.explosion_lifetime;
        let mut queue = VecDeque::from(due);
        let mut resolved = BTreeSet::new();

        while let Some(origin) = queue.pop_front() {
            if !resolved.insert(origin) {
                continue;
            }
            let Some(bomb) = self.bombs.remove(&origin) else {
                continue;
            };
            if let Some(owner) = self.players.get_mut(&bomb.owner) {
                owner.active_bombs = owner.active_bombs.saturating_sub(1);
            }

            for cell in blast_cells(&self.map, origin, bomb.power) {
                if self.bombs.contains_key(&cell) && !resolved.contains(&cell) {
                    queue.push_back(cell);
                }
                self.explosions.insert(
                    cell,
                    Explosion {
                        cell,
                        remaining: lifetime,
                    },
                );
                report.blast.insert(cell);
            }
            report.detonated.push(origin);
        }

        tracing::debug!(
            bombs = report.detonated.len(),
            cells = report.blast.len(),
            "detonation resolved"
        );
    }

    fn break_blocks(&mut self, report: &mut TickReport) {
        let chance = self.config.powerup_chance.clamp(0.0, 1.0);
        for cell in &report.blast {
            if !self.map.remove_block(*cell) {
                continue;
            }
            report.destroyed.push(*cell);
            if self.rng.random_bool(chance) {
                let kind = PowerUpKind::ALL[self.rng.random_range(0..PowerUpKind::ALL.len())];
                self.powerups.insert(*cell, PowerUp { cell: *cell, kind });
            }
        }
    }

    /// One hit per player per tick, however many blast cells they touch.
    fn apply_damage(&mut self, report: &mut TickReport) {
        let size = self.config.player_size;
        let tile = self.config.tile_size;
        for player in self.players.values_mut().filter(|p| p.alive) {
            let hit = player
                .occupied_cells(size, tile)
                .iter()
                .any(|cell| report.blast.contains(cell));
            if hit && player.take_hit() {
                tracing::info!(player = %player.id, "player eliminated");
                report.eliminated.push(player.id);
            }
        }
    }

    fn collect_powerups(&mut self) {
        if self.powerups.is_empty() {
            return;
        }
        let size = self.config.player_size;
        let tile = self.config.tile_size;
        let max_speed = self.config.max_speed;
        for player in self.players.values_mut().filter(|p| p.alive) {
            for cell in player.occupied_cells(size, tile) {
                if let Some(powerup) = self.powerups.remove(&cell) {
                    player.collect(powerup.kind, max_speed);
                    tracing::debug!(player = %player.id, kind = ?powerup.kind, "power-up collected");
                }
            }
        }
    }

    fn check_outcome(&mut self) -> Option<MatchOutcome> {
        let mut alive = self.players.values().filter(|p| p.alive);
        let outcome = match (alive.next(), alive.next()) {
            (Some(_), Some(_)) => return None,
            (Some(winner), None) => MatchOutcome::Winner {
                id: winner.id,
                nickname: winner.nickname.clone(),
            },
            (None, _) => MatchOutcome::Tie,
        };
        self.over = true;
        tracing::info!(?outcome, "match decided");
        Some(outcome)
    }

    /// The full state in wire form, with every collection in a stable order.
    pub fn snapshot(&self) -> StateSnapshot {
        let tile = self.config.tile_size;
        StateSnapshot {
            players: self.players.values().map(Player::to_state).collect(),
            bombs: self.bombs.values().map(|b| b.to_state(tile)).collect(),
            explosions: self.explosions.values().map(|e| e.to_state(tile)).collect(),
            powerups: self.powerups.values().map(|p| p.to_state(tile)).collect(),
            walls: self.map.walls().iter().copied().collect(),
            blocks: self.map.blocks().iter().copied().collect(),
            map_width: self.config.map_width,
            map_height: self.config.map_height,
            tile_size: tile,
        }
    }

    #[cfg(test)]
    fn player_mut(&mut self, id: PlayerId) -> &mut Player {
        self.players.get_mut(&id).expect("player in session")
    }

    #[cfg(test)]
    fn drop_bomb(&mut self, cell: Cell, power: u32, owner: PlayerId, fuse: Duration) {
        self.bombs.insert(
            cell,
            Bomb {
                cell,
                remaining: fuse,
                power,
                owner,
            },
        );
    }
}

/// Clamps a movement input to `[-1, 1]`; non-finite input means no movement.
fn unit(d: f64) -> f64 {
    if d.is_finite() { d.clamp(-1.0, 1.0) } else { 0.0 }
}
