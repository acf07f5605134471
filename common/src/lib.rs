//! Common types and logic for the HV pulse counter.
//!
//! This crate contains the platform-agnostic core shared between the
//! simulator and the Pico 2 firmware:
//!
//! - [`config`]: Detector tunables and persistent layout constants
//! - [`bin_table`]: Compiled-in ADC level -> bin -> FRAM address table
//! - [`window`]: Ring of the most recent samples and their average
//! - [`detector`]: Armed/Blocked dip detector
//! - [`store`]: Persistent word store trait and a RAM-backed store
//! - [`histogram`]: Durable per-bin discharge counters
//! - [`report`]: Reporting sink trait and a bounded report log
//! - [`cycle`]: The per-tick cycle driver tying everything together
//! - [`waveform`]: Synthetic flasher waveform for demos and the simulator
//!
//! # no_std Compatibility
//!
//! This crate is `no_std` compatible and can be used on embedded targets.
//! It has no notion of wall-clock time: the caller paces [`cycle::CycleDriver::tick`].

#![cfg_attr(not(test), no_std)]
// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

pub mod bin_table;
pub mod config;
pub mod cycle;
pub mod detector;
pub mod histogram;
pub mod report;
pub mod store;
pub mod waveform;
pub mod window;

// Re-export commonly used items
pub use bin_table::{Bin, BinTable, HV_BINS};
pub use config::{DetectorConfig, Sample};
pub use cycle::{CycleDriver, CycleStats, SampleSource, TickEvent};
pub use detector::{DetectionState, DipDetector, Discharge};
pub use histogram::{Histogram, HistogramError};
pub use report::{DischargeReport, ReportLog, ReportSink};
pub use store::{Address, MemoryStore, MemoryStoreError, PersistentStore};
pub use window::SampleWindow;
