//! FRAM wiring on SPI0.
//!
//! Pin mapping:
//! - SCK: GPIO18
//! - MOSI: GPIO19
//! - MISO: GPIO16
//! - CS: GPIO17 (active low, idle high)

use embassy_rp::gpio::Output;
use embassy_rp::peripherals::SPI0;
use embassy_rp::spi::{Blocking, Config as SpiConfig, Spi};
use embedded_hal_bus::spi::{ExclusiveDevice, NoDelay};
use hvpulse_pico2::config::FRAM_SPI_FREQUENCY_HZ;
use hvpulse_pico2::fram::Fm25040b;

/// The counter FRAM as wired on the board.
pub type BoardFram<'d> = Fm25040b<ExclusiveDevice<Spi<'d, SPI0, Blocking>, Output<'d>, NoDelay>>;

/// Wrap the SPI bus and chip select into the FRAM driver.
pub fn init_fram<'d>(
    spi: Spi<'d, SPI0, Blocking>,
    cs: Output<'d>,
) -> BoardFram<'d> {
    // Create SPI device with chip select
    let spi_device = ExclusiveDevice::new_no_delay(spi, cs).unwrap();
    Fm25040b::new(spi_device)
}

/// SPI configuration for the FM25040B (mode 0).
pub fn fram_spi_config() -> SpiConfig {
    let mut config = SpiConfig::default();
    config.frequency = FRAM_SPI_FREQUENCY_HZ;
    config
}
