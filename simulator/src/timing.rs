//! Simulated time.
//!
//! The simulator does not sleep: one tick stands for one firmware tick of
//! `TICK_PERIOD_MS`, and wall-clock time is only measured to report speed.

use std::time::Duration;

use hvpulse_common::config::TICK_PERIOD_MS;

/// Number of ticks covering `seconds` of simulated time, `None` on overflow.
pub const fn ticks_for_secs(seconds: u64) -> Option<u64> {
    match seconds.checked_mul(1000) {
        Some(ms) => Some(ms / TICK_PERIOD_MS),
        None => None,
    }
}

/// Simulated time after `ticks` ticks.
pub const fn simulated(ticks: u64) -> Duration { Duration::from_millis(ticks.saturating_mul(TICK_PERIOD_MS)) }
