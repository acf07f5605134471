//! HV Discharge Pulse Counter Firmware for Raspberry Pi Pico 2 (RP2350)
//!
//! Samples the flasher's HV divider once per millisecond, recognizes each
//! capacitor discharge as a dip below the running average and counts it in a
//! per-voltage histogram kept in an FM25040B FRAM, so counts survive power
//! loss and the EMI of the discharge itself.
//!
//! # Architecture
//!
//! - Main task: 1 ms `Ticker` loop driving `CycleDriver::tick`, feeding the
//!   watchdog, tracking the tick budget and blinking the heartbeat LED
//! - Report task: Drains the report queue (RTT log + debug pulse on GP15)
//!
//! # Boot Options
//!
//! - **Clear jumper (GP14) held low**: Zero the whole histogram before counting
//!
//! # Features
//!
//! - `demo`: Use the synthetic flasher waveform instead of the ADC

#![cfg_attr(target_arch = "arm", no_std)]
#![cfg_attr(target_arch = "arm", no_main)]
// Crate-level lints (match lib.rs for consistency)
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

// Modules only used in the binary (not testable on host)
#[cfg(target_arch = "arm")]
mod fram_bus;
#[cfg(target_arch = "arm")]
mod logger;
#[cfg(target_arch = "arm")]
mod tasks;

#[cfg(target_arch = "arm")]
use {defmt_rtt as _, panic_probe as _};

#[cfg(target_arch = "arm")]
mod firmware {
    use defmt::{Debug2Format, info, warn};
    use embassy_executor::Spawner;
    use embassy_rp::gpio::{Input, Level, Output, Pull};
    use embassy_rp::spi::Spi;
    use embassy_rp::watchdog::Watchdog;
    use embassy_time::{Duration, Ticker};
    use hvpulse_common::config::TICK_PERIOD_MS;
    use hvpulse_common::report::{DischargeReport, format_line};
    use hvpulse_common::{CycleDriver, DetectorConfig, HV_BINS, Histogram, PersistentStore, TickEvent};
    use hvpulse_pico2::config::{
        CPU_FREQ_HZ,
        HEARTBEAT_INTERVAL_TICKS,
        STATS_LOG_INTERVAL_TICKS,
        TICK_PERIOD_US,
        WATCHDOG_TIMEOUT_MS,
    };
    use hvpulse_pico2::report_queue::ChannelSink;
    use hvpulse_pico2::tick_budget::{self, TickBudget};

    use crate::fram_bus::{fram_spi_config, init_fram};
    use crate::tasks::{REPORTS, report_task};

    // Program metadata for `picotool info`
    #[unsafe(link_section = ".bi_entries")]
    #[used]
    pub static PICOTOOL_ENTRIES: [embassy_rp::binary_info::EntryAddr; 4] = [
        embassy_rp::binary_info::rp_program_name!(c"hvpulse-pico2"),
        embassy_rp::binary_info::rp_program_description!(c"HV discharge pulse counter with FRAM histogram"),
        embassy_rp::binary_info::rp_cargo_version!(),
        embassy_rp::binary_info::rp_program_build_attribute!(),
    ];

    /// Log every non-zero bin as a display line.
    fn dump_histogram<S: PersistentStore>(histogram: &mut Histogram<S>) {
        let result = histogram.for_each_nonzero(&HV_BINS, |bin, count| {
            let line = format_line(&DischargeReport {
                bin: bin.index,
                voltage: bin.voltage,
                count,
            });
            info!("  {}", line.as_str());
        });

        match result {
            Ok(0) => info!("Histogram empty"),
            Ok(bins) => info!("Histogram: {} bins in use", bins),
            Err(e) => warn!("Histogram dump failed: {}", Debug2Format(&e)),
        }
    }

    #[embassy_executor::main]
    async fn main(spawner: Spawner) {
        info!("HV pulse counter starting...");

        let p = embassy_rp::init(Default::default());
        crate::logger::init();

        // Initialize DWT cycle counter for tick budget measurement
        tick_budget::init();
        info!("DWT cycle counter initialized at {} MHz", CPU_FREQ_HZ / 1_000_000);

        let mut watchdog = Watchdog::new(p.WATCHDOG);
        if let Some(reason) = watchdog.reset_reason() {
            warn!("Reset by watchdog: {}", Debug2Format(&reason));
        }

        // Initialize heartbeat LED and debug pulse output
        let mut led = Output::new(p.PIN_25, Level::Low);
        let debug_pulse = Output::new(p.PIN_15, Level::Low);

        // Clear jumper (active-low with internal pull-up), sampled once at boot
        let clear_jumper = Input::new(p.PIN_14, Pull::Up);

        // Initialize FRAM on SPI0
        // Pinout: SCK=18, MOSI=19, MISO=16, CS=17
        let cs = Output::new(p.PIN_17, Level::High);
        let spi = Spi::new_blocking(p.SPI0, p.PIN_18, p.PIN_19, p.PIN_16, fram_spi_config());
        let mut fram = init_fram(spi, cs);
        match fram.status() {
            Ok(status) => info!("FRAM status register: {=u8:#x}", status),
            Err(e) => warn!("FRAM not responding: {}", Debug2Format(&e)),
        }

        // Sample source: HV divider on ADC0 (GP26), or the synthetic waveform
        #[cfg(not(feature = "demo"))]
        let source = {
            use embassy_rp::adc::{Adc, Channel, Config as AdcConfig};
            use hvpulse_pico2::sampling::AdcSampler;

            let mut adc = Adc::new_blocking(p.ADC, AdcConfig::default());
            let mut hv_divider = Channel::new_pin(p.PIN_26, Pull::None);
            let mut sampler = AdcSampler::new();
            info!("ADC initialized on GP26");
            move || sampler.accept(adc.blocking_read(&mut hv_divider))
        };
        #[cfg(feature = "demo")]
        let source = {
            info!("Demo mode: synthetic flasher waveform");
            hvpulse_common::waveform::SyntheticFlasher::default()
        };

        let sink = ChannelSink::new(&REPORTS);
        let mut driver = CycleDriver::new(source, fram, sink, &HV_BINS, DetectorConfig::DEFAULT);

        if clear_jumper.is_low() {
            warn!("Clear jumper set, zeroing histogram");
            if let Err(e) = driver.histogram_mut().clear(&HV_BINS) {
                warn!("Histogram clear failed: {}", Debug2Format(&e));
            }
        }
        dump_histogram(driver.histogram_mut());

        spawner.spawn(report_task(debug_pulse)).unwrap();
        info!("Report task spawned");

        watchdog.start(Duration::from_millis(WATCHDOG_TIMEOUT_MS));
        info!("Watchdog started ({} ms)", WATCHDOG_TIMEOUT_MS);

        let mut ticker = Ticker::every(Duration::from_millis(TICK_PERIOD_MS));
        let mut budget = TickBudget::new(CPU_FREQ_HZ, TICK_PERIOD_US);

        info!("Counting");

        loop {
            ticker.next().await;
            let start = tick_budget::read();

            match driver.tick() {
                TickEvent::Counted(_) => dump_histogram(driver.histogram_mut()),
                TickEvent::StoreFault { bin } => warn!("Discharge in bin {} not stored", bin),
                TickEvent::Idle | TickEvent::Rearmed | TickEvent::BelowRange { .. } => {}
            }

            watchdog.feed();

            if let Some(cycles) = tick_budget::elapsed(start, tick_budget::read()) {
                budget.record(cycles);
            }

            let ticks = driver.stats().ticks;
            if ticks % HEARTBEAT_INTERVAL_TICKS == 0 {
                led.toggle();
            }
            if ticks % STATS_LOG_INTERVAL_TICKS == 0 {
                let stats = driver.stats();
                info!(
                    "ticks={} discharges={} counted={} unbinned={} faults={} dropped={}",
                    stats.ticks,
                    stats.discharges,
                    stats.counted,
                    stats.unbinned,
                    stats.store_faults,
                    driver.sink().dropped()
                );
                info!(
                    "tick budget: avg {}% worst {}% overruns {}/{}",
                    budget.average_percent(),
                    budget.worst_percent(),
                    budget.overruns(),
                    budget.ticks()
                );
                budget.reset();
            }
        }
    }
}

/// The firmware only runs on the RP2350; host builds get an empty entry point.
#[cfg(not(target_arch = "arm"))]
fn main() {}
