//! The simulation run itself, separate from printing so it can be tested.

use hvpulse_common::config::STORE_SIZE;
use hvpulse_common::report::REPORT_LOG_SIZE;
use hvpulse_common::waveform::SyntheticFlasher;
use hvpulse_common::{CycleDriver, DetectorConfig, HV_BINS, MemoryStore, ReportLog, TickEvent};
use log::error;

/// Driver wired the way the simulator runs it.
pub type SimDriver = CycleDriver<SyntheticFlasher, MemoryStore<STORE_SIZE>, ReportLog<REPORT_LOG_SIZE>>;

/// Driver state after a run.
pub struct Outcome {
    pub driver: SimDriver,
    pub restarts: u32,
}

/// Run `total_ticks` ticks, restarting every `reset_every` ticks if given.
pub fn run(
    total_ticks: u64,
    reset_every: Option<u64>,
) -> Outcome {
    let mut driver = CycleDriver::new(
        SyntheticFlasher::default(),
        MemoryStore::<STORE_SIZE>::new(),
        ReportLog::<REPORT_LOG_SIZE>::new(),
        &HV_BINS,
        DetectorConfig::DEFAULT,
    );

    let mut restarts = 0u32;
    for tick in 1..=total_ticks {
        if let TickEvent::StoreFault { bin } = driver.tick() {
            error!("discharge in bin {bin} not stored");
        }
        if reset_every.is_some_and(|every| tick % every == 0) {
            driver.restart();
            restarts += 1;
        }
    }

    Outcome { driver, restarts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::ticks_for_secs;

    #[test]
    fn test_every_flash_counted_once() {
        let outcome = run(ticks_for_secs(10).unwrap(), None);
        let driver = &outcome.driver;
        let flashes = driver.source().flashes();

        assert_eq!(flashes, 10);
        assert_eq!(driver.stats().counted, flashes, "one count per flash");
        assert_eq!(driver.sink().received(), flashes);
        assert_eq!(driver.histogram().store().writes(), flashes);
        assert_eq!(outcome.restarts, 0);
    }

    #[test]
    fn test_restarts_keep_histogram() {
        let outcome = run(ticks_for_secs(3).unwrap(), Some(1500));
        let driver = &outcome.driver;

        assert_eq!(outcome.restarts, 2);
        assert_eq!(driver.source().flashes(), 3);
        assert_eq!(driver.sink().received(), 3, "restarts mid-charge lose no flash");
        assert_eq!(driver.histogram().store().writes(), 3);
    }
}
