//! Time sources for Blastforge.
//!
//! - [`TickScheduler`] drives the fixed-rate simulation clock (20 Hz by
//!   default). It is paused outside of a running match.
//! - [`SecondsTimer`] is a cancelable countdown with one-second resolution,
//!   used for the lobby's waiting and countdown phases.
//!
//! Both are built on `tokio::time`, so tests run them under a paused clock
//! (`#[tokio::test(start_paused = true)]`) instead of waiting in real time.
//! Both pend forever while disarmed, which lets them sit in the same
//! `tokio::select!` as the arena's command channel:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = commands.recv() => { /* joins, actions, chat */ }
//!         info = ticks.wait_for_tick() => { /* advance the session */ }
//!         left = waiting.next_second() => { /* broadcast `waiting` */ }
//!         left = countdown.next_second() => { /* broadcast `countdown` */ }
//!     }
//! }
//! ```

mod scheduler;
mod timer;

pub use scheduler::{TickConfig, TickInfo, TickScheduler};
pub use timer::SecondsTimer;
