//! Lobby and matchmaking for Blastforge.
//!
//! The [`Lobby`] is a pure state machine: it owns the roster of players
//! waiting for a match and decides when timers should start or stop, but it
//! never touches a clock or a socket. Every mutating call returns an optional
//! [`LobbyEffect`] that the server applies (arm a timer, broadcast, start the
//! match). This keeps the rules testable without waiting in real time.
//!
//! ```text
//! Waiting ──(≥ min joined, waiting timer elapses / max joined)──→ Countdown
//!    ↑                                                              │
//!    └───────────────(drops below min)──────────────────────────────┤
//!                                                                   ↓
//! Waiting ←──(reset)── Ended ←──(one or zero alive)── Running ←──(countdown ends)
//! ```
//!
//! Join handling is split in two: [`Lobby::validate_join`] answers "would
//! this be accepted?" without mutating anything, and [`Lobby::commit_join`]
//! applies an already validated entry.

mod config;
mod error;
mod lobby;

pub use config::{LobbyConfig, LobbyPhase};
pub use error::JoinError;
pub use lobby::{Departure, Lobby, LobbyEffect, LobbyEntry};
