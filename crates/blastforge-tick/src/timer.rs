//! Cancelable countdown timer with one-second resolution.

use std::time::Duration;

use tokio::time::{self, Instant};

const SECOND: Duration = Duration::from_secs(1);

/// A countdown that fires once per second until it reaches zero.
///
/// The timer is either armed (counting down) or disarmed. Disarming is
/// idempotent, and reaching zero disarms it automatically, so a purpose-bound
/// timer can be cancelled from any code path without checking its state
/// first.
#[derive(Debug, Default)]
pub struct SecondsTimer {
    remaining: u32,
    deadline: Option<Instant>,
}

impl SecondsTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts (or restarts) the countdown from `seconds`.
    pub fn arm(&mut self, seconds: u32) {
        self.remaining = seconds;
        self.deadline = Some(Instant::now() + SECOND);
    }

    /// Stops the countdown. Returns whether it was armed.
    pub fn disarm(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Seconds left, or `None` while disarmed.
    pub fn remaining(&self) -> Option<u32> {
        self.deadline.map(|_| self.remaining)
    }

    /// Waits for the next whole second and returns the seconds left.
    ///
    /// Returns `0` exactly once, after which the timer is disarmed. Pends
    /// forever while disarmed. Cancel-safe.
    pub async fn next_second(&mut self) -> u32 {
        let Some(deadline) = self.deadline else {
            return std::future::pending().await;
        };
        time::sleep_until(deadline).await;

        self.remaining = self.remaining.saturating_sub(1);
        self.deadline = if self.remaining == 0 {
            None
        } else {
            Some(deadline + SECOND)
        };
        self.remaining
    }
}
