//! Bridge from the `log` facade to defmt.
//!
//! `hvpulse-common` and the library drivers log through `log` so they stay
//! host-testable. On the board those records are forwarded to defmt and end
//! up on RTT next to the firmware's own defmt lines.

use defmt::Display2Format;
use log::{Level, LevelFilter, Log, Metadata, Record};

/// Most verbose level forwarded to RTT.
const MAX_LEVEL: LevelFilter = LevelFilter::Info;

struct DefmtLogger;

impl Log for DefmtLogger {
    fn enabled(
        &self,
        metadata: &Metadata,
    ) -> bool {
        metadata.level() <= MAX_LEVEL
    }

    fn log(
        &self,
        record: &Record,
    ) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let args = Display2Format(record.args());
        match record.level() {
            Level::Error => defmt::error!("{}", args),
            Level::Warn => defmt::warn!("{}", args),
            Level::Info => defmt::info!("{}", args),
            Level::Debug => defmt::debug!("{}", args),
            Level::Trace => defmt::trace!("{}", args),
        }
    }

    fn flush(&self) {}
}

static LOGGER: DefmtLogger = DefmtLogger;

/// Install the bridge. A second call is a no-op.
pub fn init() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(MAX_LEVEL);
    }
}
