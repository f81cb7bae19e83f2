//! Fixed-timestep tick scheduler.

use std::time::{Duration, Instant};

use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

/// Configuration for the tick scheduler.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Tick rate in Hz. Must be at least 1.
    pub tick_rate_hz: u32,
    /// Fraction of the tick budget (0.0–1.0) above which a tick's execution
    /// time is logged as a warning.
    pub budget_warn_threshold: f64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 20,
            budget_warn_threshold: 0.80,
        }
    }
}

impl TickConfig {
    /// Maximum supported tick rate.
    pub const MAX_TICK_RATE_HZ: u32 = 128;

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz,
            ..Default::default()
        }
    }

    /// Clamps out-of-range values: the rate to `1..=MAX_TICK_RATE_HZ` and the
    /// threshold to `0.0..=1.0`.
    pub fn validated(mut self) -> Self {
        let clamped = self.tick_rate_hz.clamp(1, Self::MAX_TICK_RATE_HZ);
        if clamped != self.tick_rate_hz {
            warn!(requested = self.tick_rate_hz, clamped, "tick rate out of range");
            self.tick_rate_hz = clamped;
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate_hz as f64)
    }
}

/// Information about a fired tick.
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Monotonically increasing tick number (starts at 1).
    pub tick: u64,
    /// Fixed delta time (always `1 / tick_rate`). The simulation advances by
    /// this amount regardless of wall-clock jitter.
    pub dt: Duration,
    /// Whole ticks skipped because this one fired late.
    pub ticks_skipped: u64,
}

/// Fixed-timestep scheduler for the simulation clock.
///
/// Overruns are handled by skipping: a late tick reschedules from "now"
/// instead of bursting to catch up.
pub struct TickScheduler {
    config: TickConfig,
    tick_duration: Duration,
    tick_count: u64,
    next_tick: TokioInstant,
    tick_start: Option<Instant>,
    paused: bool,
}

impl TickScheduler {
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let tick_duration = config.tick_duration();
        debug!(
            rate_hz = config.tick_rate_hz,
            budget_ms = tick_duration.as_secs_f64() * 1000.0,
            "tick scheduler created"
        );
        Self {
            config,
            tick_duration,
            tick_count: 0,
            next_tick: TokioInstant::now() + tick_duration,
            tick_start: None,
            paused: false,
        }
    }

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self::new(TickConfig::with_rate(tick_rate_hz))
    }

    /// Creates a scheduler that stays idle until [`resume`](Self::resume).
    pub fn paused(config: TickConfig) -> Self {
        let mut scheduler = Self::new(config);
        scheduler.paused = true;
        scheduler
    }

    /// Waits until the next tick is due.
    ///
    /// While paused this future never resolves. It is cancel-safe: dropping
    /// it before the deadline leaves the schedule untouched.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        if self.paused {
            std::future::pending::<()>().await;
        }

        time::sleep_until(self.next_tick).await;

        let now = TokioInstant::now();
        let late_by = now.saturating_duration_since(self.next_tick);
        let ticks_skipped = (late_by.as_nanos() / self.tick_duration.as_nanos()) as u64;
        if ticks_skipped > 0 {
            warn!(
                tick = self.tick_count + 1,
                skipped = ticks_skipped,
                late_ms = late_by.as_secs_f64() * 1000.0,
                "tick overrun, skipping ahead"
            );
            self.next_tick = now + self.tick_duration;
        } else {
            self.next_tick += self.tick_duration;
        }

        self.tick_count += 1;
        self.tick_start = Some(Instant::now());
        trace!(tick = self.tick_count, "tick fired");

        TickInfo {
            tick: self.tick_count,
            dt: self.tick_duration,
            ticks_skipped,
        }
    }

    /// Records that the work for the current tick has finished and warns if
    /// it used more than the configured share of the budget.
    pub fn record_tick_end(&mut self) {
        let Some(start) = self.tick_start.take() else {
            return;
        };
        let elapsed = start.elapsed();
        let utilization = elapsed.as_secs_f64() / self.tick_duration.as_secs_f64();
        if utilization >= self.config.budget_warn_threshold {
            warn!(
                tick = self.tick_count,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                utilization_pct = format!("{:.1}", utilization * 100.0),
                "tick approaching budget limit"
            );
        }
    }

    /// Stops ticking. Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(tick = self.tick_count, "tick scheduler paused");
        }
    }

    /// Restarts ticking one full period from now. Idempotent.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.next_tick = TokioInstant::now() + self.tick_duration;
            debug!(tick = self.tick_count, "tick scheduler resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn tick_rate_hz(&self) -> u32 {
        self.config.tick_rate_hz
    }

    pub fn tick_duration(&self) -> Duration {
        self.tick_duration
    }
}
