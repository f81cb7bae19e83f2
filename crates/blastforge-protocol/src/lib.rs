//! Wire protocol for Blastforge.
//!
//! Every frame on the wire is a JSON envelope `{ "type": ..., "payload": ... }`.
//! This crate defines:
//!
//! - **Messages** ([`ClientMessage`], [`ServerMessage`], [`Action`]): the
//!   envelopes each side sends, discriminated purely by `type`.
//! - **Snapshots** ([`StateSnapshot`] and friends): the full authoritative
//!   state broadcast once per tick while a match is running.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): text encoding of the above.
//!
//! ```text
//! Transport (text frames) → Protocol (messages) → Lobby / Simulation
//! ```

mod codec;
mod error;
mod snapshot;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use snapshot::{
    BombState, ExplosionState, PlayerState, PowerUpKind, PowerUpState, StateSnapshot,
};
pub use types::{Action, Cell, ClientMessage, LobbyPlayer, PlayerId, ServerMessage};
