//! Centralized detector and storage configuration.
//!
//! All tunables are compile-time constants with validation assertions, the
//! same way the sensor thresholds are handled on the firmware side. If the
//! constants are configured inconsistently (e.g. an unblock band wider than
//! the dip threshold), compilation fails.
//!
//! # Units
//!
//! Every voltage-like value here is in ADC counts of the 10-bit [`Sample`]
//! range, not volts. The volts shown to the user come from the bin table.

/// One quantized reading of the HV divider (10-bit, 0..=[`SAMPLE_MAX`]).
pub type Sample = u16;

// =============================================================================
// Sampling
// =============================================================================

/// Resolution of a [`Sample`] in bits.
pub const SAMPLE_BITS: u32 = 10;

/// Largest representable sample. Sources delivering more are clamped.
pub const SAMPLE_MAX: Sample = (1 << SAMPLE_BITS) - 1;

/// Number of samples held in the sample window.
pub const WINDOW_DEPTH: usize = 5;

/// Cycle period in milliseconds (one sample per tick).
pub const TICK_PERIOD_MS: u64 = 1;

const _: () = assert!(WINDOW_DEPTH > 0);
// Sum of a full window must fit the u32 accumulator.
const _: () = assert!((SAMPLE_MAX as u64) * (WINDOW_DEPTH as u64) <= u32::MAX as u64);

// =============================================================================
// Dip Detection
// =============================================================================

/// Drop below the running average (in counts) that is recognized as a discharge.
/// One count is about 3.1V on the bin table's scale, so 10 counts is a drop of roughly 31V.
pub const DELTAV_TH: u16 = 10;

/// Half-width of the band around the average that counts as "stable"
/// while detection is blocked.
pub const UNBLOCK_DELTA: u16 = 2;

/// Stable ticks required (exceeded) before detection re-arms.
/// At a 1 ms tick this is the ~100 ms dead time after each discharge.
pub const DETECTION_BLOCK_COUNTER_MAX: u32 = 100;

// A stable sample must never also look like a dip.
const _: () = assert!(UNBLOCK_DELTA < DELTAV_TH);
const _: () = assert!(DETECTION_BLOCK_COUNTER_MAX > 0);

/// Detector tunables bundled for passing around.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DetectorConfig {
    /// See [`DELTAV_TH`].
    pub dip_threshold: u16,
    /// See [`UNBLOCK_DELTA`].
    pub unblock_delta: u16,
    /// See [`DETECTION_BLOCK_COUNTER_MAX`].
    pub block_counter_max: u32,
}

impl DetectorConfig {
    /// The compiled-in tuning.
    pub const DEFAULT: Self = Self {
        dip_threshold: DELTAV_TH,
        unblock_delta: UNBLOCK_DELTA,
        block_counter_max: DETECTION_BLOCK_COUNTER_MAX,
    };
}

impl Default for DetectorConfig {
    fn default() -> Self { Self::DEFAULT }
}

// =============================================================================
// Persistent Layout
// =============================================================================

/// Size of one histogram counter in bytes.
pub const COUNTER_WIDTH: u16 = 4;

/// Exclusive upper bound of the reserved counter region in the FRAM.
/// The last word of the 512-byte part (0x1FC..0x200) stays untouched.
pub const COUNTER_REGION_END: u16 = 0x1FC;

/// Size of the persistent part (FM25040B, 4 Kbit).
pub const STORE_SIZE: usize = 512;

const _: () = assert!(COUNTER_REGION_END as usize <= STORE_SIZE);
const _: () = assert!(COUNTER_REGION_END % COUNTER_WIDTH == 0);

// =============================================================================
// Unit Tests
// =============================================================================
