//! Report task.
//!
//! Runs beside the cycle loop and consumes the reports it queues. Each report
//! raises the debug pulse pin (for a scope or an external counter) and is
//! logged as a display line.

use defmt::info;
use embassy_rp::gpio::Output;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::Timer;
use hvpulse_common::report::{DischargeReport, format_line};
use hvpulse_pico2::config::{DEBUG_PULSE_US, REPORT_QUEUE_DEPTH};

/// Queue between the cycle loop (producer) and [`report_task`] (consumer).
pub static REPORTS: Channel<CriticalSectionRawMutex, DischargeReport, REPORT_QUEUE_DEPTH> = Channel::new();

/// Report consumer task.
#[embassy_executor::task]
pub async fn report_task(mut debug_pulse: Output<'static>) {
    info!("Report task started");

    loop {
        let report = REPORTS.receive().await;

        debug_pulse.set_high();
        Timer::after_micros(DEBUG_PULSE_US).await;
        debug_pulse.set_low();

        let line = format_line(&report);
        info!("Discharge: {} (bin {})", line.as_str(), report.bin);
    }
}
