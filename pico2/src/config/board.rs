//! Board wiring.
//!
//! | Signal           | Pin   | Notes                                  |
//! |------------------|-------|----------------------------------------|
//! | HV divider       | GP26  | ADC0                                   |
//! | FRAM SCK         | GP18  | SPI0                                   |
//! | FRAM MOSI        | GP19  | SPI0 TX                                |
//! | FRAM MISO        | GP16  | SPI0 RX                                |
//! | FRAM CS          | GP17  | active low                             |
//! | Clear jumper     | GP14  | pull-up, held low at boot clears FRAM  |
//! | Debug pulse      | GP15  | high for a few µs per counted dip      |
//! | Heartbeat LED    | GP25  | on-board LED                           |

use hvpulse_common::config::SAMPLE_BITS;

/// FRAM SPI clock. The FM25040B is rated for 20 MHz; 12 MHz leaves margin on long wires.
pub const FRAM_SPI_FREQUENCY_HZ: u32 = 12_000_000;

/// Resolution of the RP2350 SAR ADC.
pub const ADC_NATIVE_BITS: u32 = 12;

const _: () = assert!(FRAM_SPI_FREQUENCY_HZ <= 20_000_000);
// Quantization only ever drops bits.
const _: () = assert!(ADC_NATIVE_BITS >= SAMPLE_BITS);
