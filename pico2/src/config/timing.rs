//! Timing and housekeeping constants.

use hvpulse_common::config::TICK_PERIOD_MS;

/// Cycle period in microseconds.
pub const TICK_PERIOD_US: u32 = TICK_PERIOD_MS as u32 * 1000;

/// Stock RP2350 system clock (no overclocking for a counter).
pub const CPU_FREQ_HZ: u32 = 150_000_000;

/// Hardware watchdog timeout. Fed every tick, so this only fires if the loop hangs.
pub const WATCHDOG_TIMEOUT_MS: u64 = 500;

/// Ticks between two statistics log lines (10 s).
pub const STATS_LOG_INTERVAL_TICKS: u64 = 10_000;

/// Ticks between heartbeat LED toggles.
pub const HEARTBEAT_INTERVAL_TICKS: u64 = 500;

/// Reports that can wait for the report task before new ones are dropped.
pub const REPORT_QUEUE_DEPTH: usize = 8;

/// Width of the debug pulse emitted per counted discharge.
pub const DEBUG_PULSE_US: u64 = 10;

const _: () = assert!(WATCHDOG_TIMEOUT_MS > 10 * TICK_PERIOD_MS);
const _: () = assert!(HEARTBEAT_INTERVAL_TICKS > 0);
const _: () = assert!(STATS_LOG_INTERVAL_TICKS > 0);
const _: () = assert!(REPORT_QUEUE_DEPTH > 0);
