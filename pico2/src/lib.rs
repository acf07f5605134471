//! HV pulse counter firmware library - testable modules for the Pico 2 board.
//!
//! This library contains the board-side logic that can be tested on the host
//! machine. The binary (`main.rs`) uses this library and adds the
//! embassy/RP2350-specific code.
//!
//! # Testing
//!
//! Run tests on host with:
//! ```bash
//! cargo test -p hvpulse-pico2 --lib --target x86_64-unknown-linux-gnu  # Linux/macOS
//! cargo test -p hvpulse-pico2 --lib --target x86_64-pc-windows-msvc    # Windows
//! ```
//!
//! Tests run with `std` enabled (via `cfg_attr`), allowing use of the standard
//! test framework while the actual firmware runs as `no_std`.

// Use no_std only when NOT testing (tests need std for the test harness)
#![cfg_attr(not(test), no_std)]
// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

// Configuration
pub mod config;

// Drivers
pub mod fram;
pub mod sampling;

// Runtime support
pub mod report_queue;
pub mod tick_budget;

pub use fram::{Fm25040b, FramError};
pub use report_queue::ChannelSink;
pub use sampling::{AdcSampler, quantize_adc};
pub use tick_budget::TickBudget;
