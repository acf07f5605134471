//! The per-tick cycle driver.
//!
//! One call to [`CycleDriver::tick`] is one full cycle:
//!
//! 1. read one sample from the [`SampleSource`] (clamped to [`SAMPLE_MAX`])
//! 2. compute the window average *before* inserting it
//! 3. push the sample into the window
//! 4. run dip detection against the stale average
//! 5. run unblock evaluation
//!
//! A recognized discharge is mapped to a bin, the bin's counter is
//! incremented in the persistent store and the new count is handed to the
//! [`ReportSink`]. Discharges at or below the lowest bin are dropped.
//!
//! The driver never sleeps; the platform paces it (embassy `Ticker` on the
//! Pico, a plain loop in the simulator). Window and detector state live in
//! RAM only, so [`CycleDriver::restart`] models a power cycle: counters
//! survive, everything else starts over.

use log::{debug, info, trace, warn};

use crate::bin_table::BinTable;
use crate::config::{DetectorConfig, SAMPLE_MAX, Sample};
use crate::detector::{DipDetector, Discharge};
use crate::histogram::Histogram;
use crate::report::{DischargeReport, ReportSink};
use crate::store::PersistentStore;
use crate::window::SampleWindow;

/// Producer of one sample per tick.
///
/// Never fails from the driver's point of view: a source that cannot read
/// must substitute a value (the firmware repeats its last good sample).
pub trait SampleSource {
    /// Take one sample.
    fn read(&mut self) -> Sample;
}

impl<F: FnMut() -> Sample> SampleSource for F {
    #[inline]
    fn read(&mut self) -> Sample { self() }
}

/// What happened during one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickEvent {
    /// Nothing noteworthy.
    Idle,
    /// The detector left `Blocked` on this tick.
    Rearmed,
    /// A discharge was counted and reported.
    Counted(DischargeReport),
    /// A discharge was recognized at a level below the lowest bin.
    BelowRange {
        /// Pre-dip charge level.
        level: Sample,
    },
    /// A discharge was recognized but its counter could not be updated.
    StoreFault {
        /// Bin whose counter was not incremented.
        bin: usize,
    },
}

/// Running totals since the driver was created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub ticks: u64,
    pub discharges: u32,
    pub counted: u32,
    pub unbinned: u32,
    pub store_faults: u32,
    pub clamped: u32,
}

/// Ties source, window, detector, histogram and sink together.
pub struct CycleDriver<Src, S, K> {
    source: Src,
    histogram: Histogram<S>,
    sink: K,
    table: &'static BinTable,
    window: SampleWindow,
    detector: DipDetector,
    stats: CycleStats,
}

impl<Src, S, K> CycleDriver<Src, S, K>
where
    Src: SampleSource,
    S: PersistentStore,
    K: ReportSink,
{
    /// Build a driver in the power-on state (window zeroed, detector armed).
    pub fn new(
        source: Src,
        store: S,
        sink: K,
        table: &'static BinTable,
        config: DetectorConfig,
    ) -> Self {
        Self {
            source,
            histogram: Histogram::new(store),
            sink,
            table,
            window: SampleWindow::new(),
            detector: DipDetector::new(config),
            stats: CycleStats::default(),
        }
    }

    /// Run one cycle.
    pub fn tick(&mut self) -> TickEvent {
        self.stats.ticks += 1;

        let raw = self.source.read();
        if raw > SAMPLE_MAX {
            trace!("clamping sample {} to {}", raw, SAMPLE_MAX);
            self.stats.clamped += 1;
        }
        let sample = raw.min(SAMPLE_MAX);

        let average = self.window.average();
        self.window.push(sample);

        let mut event = TickEvent::Idle;
        if let Some(discharge) = self.detector.detect(average, sample) {
            event = self.record(discharge);
        }
        if self.detector.evaluate_unblock(average, sample) {
            debug!("detector re-armed after {} ticks", self.stats.ticks);
            if event == TickEvent::Idle {
                event = TickEvent::Rearmed;
            }
        }

        event
    }

    fn record(
        &mut self,
        discharge: Discharge,
    ) -> TickEvent {
        self.stats.discharges += 1;

        let Some(bin) = self.table.bin_of(discharge.level) else {
            debug!("discharge at level {} is below the lowest bin", discharge.level);
            self.stats.unbinned += 1;
            return TickEvent::BelowRange { level: discharge.level };
        };

        match self.histogram.increment(bin.address) {
            Ok(count) => {
                let report = DischargeReport {
                    bin: bin.index,
                    voltage: bin.voltage,
                    count,
                };
                info!("discharge at level {}: {}V (bin {}) count {}", discharge.level, bin.voltage, bin.index, count);
                self.stats.counted += 1;
                self.sink.report(report);
                TickEvent::Counted(report)
            }
            Err(e) => {
                warn!("failed to count discharge in bin {}: {:?}", bin.index, e);
                self.stats.store_faults += 1;
                TickEvent::StoreFault { bin: bin.index }
            }
        }
    }

    /// Forget window and detector state as after a power cycle.
    ///
    /// Stored counters and stats are kept.
    pub fn restart(&mut self) {
        self.window.reset();
        self.detector.reset();
    }

    /// Sample window.
    #[inline]
    pub const fn window(&self) -> &SampleWindow { &self.window }

    /// Dip detector.
    #[inline]
    pub const fn detector(&self) -> &DipDetector { &self.detector }

    /// Running totals.
    #[inline]
    pub const fn stats(&self) -> &CycleStats { &self.stats }

    /// Bin table in use.
    #[inline]
    pub const fn table(&self) -> &'static BinTable { self.table }

    /// Persistent counters.
    #[inline]
    pub const fn histogram(&self) -> &Histogram<S> { &self.histogram }

    /// Persistent counters, e.g. for a dump or a clear.
    #[inline]
    pub fn histogram_mut(&mut self) -> &mut Histogram<S> { &mut self.histogram }

    /// Report sink.
    #[inline]
    pub const fn sink(&self) -> &K { &self.sink }

    /// Sample source.
    #[inline]
    pub const fn source(&self) -> &Src { &self.source }

    /// Sample source, e.g. to inject a fault.
    #[inline]
    pub fn source_mut(&mut self) -> &mut Src { &mut self.source }
}

// =============================================================================
// Unit Tests
// =============================================================================
