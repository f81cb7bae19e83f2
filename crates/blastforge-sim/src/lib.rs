//! Authoritative match simulation for Blastforge.
//!
//! - [`MapGenerator`] / [`MapLayout`]: seeded, reproducible arena layout.
//! - [`Session`]: the state store for one running match (players, bombs,
//!   explosions, power-ups) and the per-tick engine that advances it.
//! - [`blast_cells`]: ray-casting for a single detonation.
//!
//! Nothing here is async or knows about sockets. The server feeds actions in
//! as they arrive and calls [`Session::tick`] on its fixed clock; both run on
//! the same task, so a detonation chain always sees a consistent bomb set.

mod blast;
mod config;
mod entity;
mod map;
mod session;

pub use blast::blast_cells;
pub use config::SimConfig;
pub use entity::{Bomb, Explosion, Player, PowerUp};
pub use map::{MapGenerator, MapLayout};
pub use session::{MatchOutcome, Session, TickReport};
