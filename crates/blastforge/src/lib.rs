//! # Blastforge
//!
//! Authoritative multiplayer bomb-arena server.
//!
//! Browser clients connect over WebSocket, join a shared lobby under a
//! nickname, and once 2–4 players are gathered a match starts on a freshly
//! generated map. The server owns all game state: clients send intents
//! (`move`, `placeBomb`, `chat`) and receive a full state snapshot every tick.
//!
//! ```text
//! transport → protocol → handler ──commands──→ arena actor
//!                                               ├─ lobby (blastforge-lobby)
//!                                               ├─ session (blastforge-sim)
//!                                               └─ tick + timers (blastforge-tick)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use blastforge::prelude::*;
//!
//! # async fn run() -> Result<(), BlastforgeError> {
//! let server = BlastforgeServer::builder().bind("0.0.0.0:8081").build().await?;
//! server.run().await
//! # }
//! ```

pub mod arena;
mod config;
mod error;
mod handler;
mod server;

pub use config::ServerConfig;
pub use error::BlastforgeError;
pub use server::{BlastforgeServer, BlastforgeServerBuilder};

/// Everything needed to run or embed a server.
pub mod prelude {
    pub use crate::arena::{
        spawn_arena, ArenaHandle, ArenaStatus, ClientSender, Outbound, CLIENT_QUEUE_SIZE,
    };
    pub use crate::{BlastforgeError, BlastforgeServer, BlastforgeServerBuilder, ServerConfig};
    pub use blastforge_lobby::{LobbyConfig, LobbyPhase};
    pub use blastforge_protocol::{Action, ClientMessage, PlayerId, ServerMessage};
    pub use blastforge_sim::SimConfig;
    pub use blastforge_tick::TickConfig;
}
