//! Firmware configuration.
//!
//! - `board`: Pin assignment and bus settings of the counter board
//! - `timing`: Tick pacing, watchdog and housekeeping intervals
//!
//! Detector tunables and the FRAM layout live in `hvpulse_common::config`.

pub mod board;
pub mod timing;

pub use board::{ADC_NATIVE_BITS, FRAM_SPI_FREQUENCY_HZ};
pub use timing::{
    CPU_FREQ_HZ,
    DEBUG_PULSE_US,
    HEARTBEAT_INTERVAL_TICKS,
    REPORT_QUEUE_DEPTH,
    STATS_LOG_INTERVAL_TICKS,
    TICK_PERIOD_US,
    WATCHDOG_TIMEOUT_MS,
};
