//! Synthetic flasher waveform.
//!
//! Generates what the HV divider sees on a photo flasher: the storage
//! capacitor charges towards a target level along an RC curve, then collapses
//! to a small residual when the tube fires, once per period. Each period
//! charges towards the next entry of a level list so a run spreads its
//! discharges over several bins. A little deterministic noise rides on top.
//!
//! Used by the simulator and by the firmware `demo` feature in place of the ADC.

use crate::config::{SAMPLE_MAX, Sample};
use crate::cycle::SampleSource;

/// Charge levels visited by [`SyntheticFlasher::default`], each in the middle of a bin.
pub const DEMO_LEVELS: [Sample; 4] = [525, 705, 885, 990];

/// Ticks between two discharges (1 s at a 1 ms tick).
pub const DEMO_PERIOD_TICKS: u32 = 1000;

/// RC time constant of the charge curve, in ticks.
pub const DEMO_TIME_CONSTANT_TICKS: f32 = 30.0;

/// Level the capacitor falls to when the tube fires.
pub const DEMO_RESIDUAL: Sample = 40;

/// A periodically discharging RC charge curve.
pub struct SyntheticFlasher {
    levels: &'static [Sample],
    period_ticks: u32,
    /// Fraction of the remaining gap closed per tick.
    alpha: f32,
    residual: Sample,
    noisy: bool,
    tick: u32,
    level_index: usize,
    charge: f32,
    flash_count: u32,
    rng: u32,
}

impl SyntheticFlasher {
    /// Create a flasher cycling through `levels`.
    ///
    /// The first period starts from the residual level, as after power-on.
    pub fn new(
        levels: &'static [Sample],
        period_ticks: u32,
        time_constant_ticks: f32,
        residual: Sample,
    ) -> Self {
        Self {
            levels,
            period_ticks: period_ticks.max(1),
            alpha: 1.0 - micromath::F32(-1.0 / time_constant_ticks.max(1.0)).exp().0,
            residual,
            noisy: true,
            tick: 0,
            level_index: 0,
            charge: f32::from(residual),
            flash_count: 0,
            rng: 0x2545_F491,
        }
    }

    /// Disable the ±1 count noise.
    #[must_use]
    pub fn without_noise(mut self) -> Self {
        self.noisy = false;
        self
    }

    /// Level the current period charges towards.
    pub fn target(&self) -> Sample { self.levels.get(self.level_index).copied().unwrap_or(0) }

    /// Discharges generated so far.
    pub fn flashes(&self) -> u32 { self.flash_count }

    /// Next sample.
    pub fn next_sample(&mut self) -> Sample {
        self.tick += 1;
        if self.tick >= self.period_ticks {
            self.tick = 0;
            self.flash_count += 1;
            self.charge = f32::from(self.residual);
            if !self.levels.is_empty() {
                self.level_index = (self.level_index + 1) % self.levels.len();
            }
        } else {
            let target = f32::from(self.target());
            self.charge += (target - self.charge) * self.alpha;
        }

        let noise = if self.noisy { self.noise() } else { 0 };
        let value = (self.charge + 0.5) as i32 + noise;
        value.clamp(0, i32::from(SAMPLE_MAX)) as Sample
    }

    /// -1, 0 or +1 from a xorshift32 generator.
    fn noise(&mut self) -> i32 {
        let mut x = self.rng;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.rng = x;
        (x % 3) as i32 - 1
    }
}

impl Default for SyntheticFlasher {
    fn default() -> Self { Self::new(&DEMO_LEVELS, DEMO_PERIOD_TICKS, DEMO_TIME_CONSTANT_TICKS, DEMO_RESIDUAL) }
}

impl SampleSource for SyntheticFlasher {
    fn read(&mut self) -> Sample { self.next_sample() }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bin_table::HV_BINS;
    use crate::config::DetectorConfig;
    use crate::cycle::{CycleDriver, TickEvent};
    use crate::report::ReportLog;
    use crate::store::MemoryStore;

    #[test]
    fn test_charges_towards_target() {
        let mut flasher = SyntheticFlasher::default().without_noise();
        let first = flasher.next_sample();
        assert!(first > DEMO_RESIDUAL, "rises from the residual");

        let mut last = first;
        for _ in 0..(DEMO_PERIOD_TICKS - 2) {
            let sample = flasher.next_sample();
            assert!(sample >= last, "charge curve is monotonic");
            last = sample;
        }
        assert_eq!(last, DEMO_LEVELS[0]);
    }

    #[test]
    fn test_collapses_once_per_period() {
        let mut flasher = SyntheticFlasher::default().without_noise();
        for _ in 0..(DEMO_PERIOD_TICKS - 1) {
            flasher.next_sample();
        }
        assert_eq!(flasher.flashes(), 0);
        assert_eq!(flasher.next_sample(), DEMO_RESIDUAL);
        assert_eq!(flasher.flashes(), 1);
        assert_eq!(flasher.target(), DEMO_LEVELS[1]);
    }

    #[test]
    fn test_noise_stays_within_one_count() {
        let mut noisy = SyntheticFlasher::default();
        let mut clean = SyntheticFlasher::default().without_noise();
        for _ in 0..3000 {
            let (a, b) = (noisy.next_sample(), clean.next_sample());
            assert!(a.abs_diff(b) <= 1);
        }
    }

    #[test]
    fn test_detector_counts_every_flash() {
        let mut driver = CycleDriver::new(
            SyntheticFlasher::default(),
            MemoryStore::<512>::new(),
            ReportLog::<8>::new(),
            &HV_BINS,
            DetectorConfig::DEFAULT,
        );

        let mut counted = Vec::new();
        for _ in 0..(DEMO_PERIOD_TICKS * 4 + 500) {
            if let TickEvent::Counted(report) = driver.tick() {
                counted.push(report.bin);
            }
        }

        let expected: Vec<usize> = DEMO_LEVELS
            .iter()
            .map(|&level| HV_BINS.bin_of(level).unwrap().index)
            .collect();
        assert_eq!(counted, expected, "one count per flash, in the bin of its level");
        assert_eq!(driver.histogram_mut().total(&HV_BINS).unwrap(), 4);
    }
}
