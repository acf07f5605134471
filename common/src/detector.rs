//! Debounced dip detector.
//!
//! A discharge shows up as the newest sample falling well below the running
//! average. One physical discharge rings down and recharges over many ticks,
//! so after firing the detector blocks itself until the window has been
//! stable for [`DetectorConfig::block_counter_max`] ticks.
//!
//! # Dead time
//!
//! A second real discharge arriving inside the blocked period is not counted.
//! With the default tuning that period is at least ~100 ms, against a nominal
//! flash period of 1 s.
//!
//! # Reset behavior
//!
//! The detector lives in RAM and starts `Armed`. A reset that lands while it
//! is `Blocked` therefore re-arms detection early, and the tail of the same
//! discharge can be counted a second time. This is accepted.

use crate::config::{DetectorConfig, Sample};

/// Detection state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DetectionState {
    /// Waiting for a dip.
    #[default]
    Armed,
    /// A dip was recognized; waiting for the voltage to settle.
    Blocked,
}

/// A recognized discharge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Discharge {
    /// Charge level before the dip: the pre-push window average.
    pub level: Sample,
}

/// Armed/Blocked state machine with a stability counter.
#[derive(Clone, Debug)]
pub struct DipDetector {
    config: DetectorConfig,
    state: DetectionState,
    block_counter: u32,
}

impl DipDetector {
    /// Create an armed detector.
    pub const fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            state: DetectionState::Armed,
            block_counter: 0,
        }
    }

    /// Current state.
    #[inline]
    pub const fn state(&self) -> DetectionState { self.state }

    /// True while detection is suppressed.
    #[inline]
    pub const fn is_blocked(&self) -> bool { matches!(self.state, DetectionState::Blocked) }

    /// Stable ticks seen since the last discharge.
    #[inline]
    pub const fn block_counter(&self) -> u32 { self.block_counter }

    /// Active tuning.
    #[inline]
    pub const fn config(&self) -> &DetectorConfig { &self.config }

    /// Check for a dip. Inert while blocked.
    ///
    /// `average` must be the window average from *before* `newest` was pushed.
    pub fn detect(
        &mut self,
        average: Sample,
        newest: Sample,
    ) -> Option<Discharge> {
        if self.is_blocked() {
            return None;
        }

        // average - threshold > newest, without unsigned underflow at cold start
        if u32::from(average) > u32::from(newest) + u32::from(self.config.dip_threshold) {
            self.state = DetectionState::Blocked;
            self.block_counter = 0;
            return Some(Discharge { level: average });
        }

        None
    }

    /// Count a stable tick while blocked and re-arm once enough have passed.
    ///
    /// A sample outside the band leaves the counter where it is. Returns true
    /// on the tick that re-arms.
    pub fn evaluate_unblock(
        &mut self,
        average: Sample,
        newest: Sample,
    ) -> bool {
        if !self.is_blocked() {
            return false;
        }

        if average.abs_diff(newest) < self.config.unblock_delta {
            self.block_counter = self.block_counter.saturating_add(1);
            if self.block_counter > self.config.block_counter_max {
                self.block_counter = 0;
                self.state = DetectionState::Armed;
                return true;
            }
        }

        false
    }

    /// Run [`detect`](Self::detect) then [`evaluate_unblock`](Self::evaluate_unblock).
    pub fn update(
        &mut self,
        average: Sample,
        newest: Sample,
    ) -> Option<Discharge> {
        let discharge = self.detect(average, newest);
        self.evaluate_unblock(average, newest);
        discharge
    }

    /// Back to the power-on state.
    pub fn reset(&mut self) {
        self.state = DetectionState::Armed;
        self.block_counter = 0;
    }
}

impl Default for DipDetector {
    fn default() -> Self { Self::new(DetectorConfig::DEFAULT) }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DELTAV_TH, DETECTION_BLOCK_COUNTER_MAX, UNBLOCK_DELTA};

    const AVG: Sample = 500;

    fn blocked() -> DipDetector {
        let mut detector = DipDetector::default();
        assert!(detector.detect(AVG, AVG - DELTAV_TH - 1).is_some());
        detector
    }

    #[test]
    fn test_starts_armed() {
        let detector = DipDetector::default();
        assert_eq!(detector.state(), DetectionState::Armed);
        assert_eq!(detector.block_counter(), 0);
    }

    #[test]
    fn test_single_dip_fires_once() {
        let mut detector = DipDetector::default();
        let discharge = detector.update(AVG, AVG - DELTAV_TH - 1);
        assert_eq!(discharge, Some(Discharge { level: AVG }));
        assert_eq!(detector.state(), DetectionState::Blocked);
        assert_eq!(detector.block_counter(), 0, "dip sample is not a stable sample");
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut detector = DipDetector::default();
        assert!(detector.detect(AVG, AVG - DELTAV_TH).is_none(), "drop equal to the threshold is not a dip");
        assert!(!detector.is_blocked());
    }

    #[test]
    fn test_cold_start_average_never_underflows() {
        let mut detector = DipDetector::default();
        for newest in [0, 5, 400, 1023] {
            assert!(detector.detect(0, newest).is_none());
            assert!(detector.detect(DELTAV_TH, newest).is_none());
        }
        assert!(!detector.is_blocked());
    }

    #[test]
    fn test_no_events_while_blocked() {
        let mut detector = blocked();
        for _ in 0..1000 {
            assert!(detector.update(AVG, 0).is_none());
        }
        assert!(detector.is_blocked());
        assert_eq!(detector.block_counter(), 0, "out-of-band samples do not count as stable");
    }

    #[test]
    fn test_unblocks_after_max_plus_one_stable_ticks() {
        let mut detector = blocked();
        for tick in 0..DETECTION_BLOCK_COUNTER_MAX {
            assert!(!detector.evaluate_unblock(AVG, AVG), "tick {tick}");
        }
        assert!(detector.is_blocked(), "MAX stable ticks are not enough");
        assert_eq!(detector.block_counter(), DETECTION_BLOCK_COUNTER_MAX);

        assert!(detector.evaluate_unblock(AVG, AVG));
        assert_eq!(detector.state(), DetectionState::Armed);
        assert_eq!(detector.block_counter(), 0);
    }

    #[test]
    fn test_band_is_exclusive() {
        let mut detector = blocked();
        detector.evaluate_unblock(AVG, AVG + UNBLOCK_DELTA);
        detector.evaluate_unblock(AVG, AVG - UNBLOCK_DELTA);
        assert_eq!(detector.block_counter(), 0);

        detector.evaluate_unblock(AVG, AVG + UNBLOCK_DELTA - 1);
        detector.evaluate_unblock(AVG, AVG - UNBLOCK_DELTA + 1);
        assert_eq!(detector.block_counter(), 2);
    }

    #[test]
    fn test_outlier_keeps_partial_progress() {
        let mut detector = blocked();
        for _ in 0..10 {
            detector.evaluate_unblock(AVG, AVG);
        }
        detector.evaluate_unblock(AVG, AVG + 50);
        assert_eq!(detector.block_counter(), 10, "outlier neither resets nor advances");
        detector.evaluate_unblock(AVG, AVG);
        assert_eq!(detector.block_counter(), 11);
    }

    #[test]
    fn test_armed_ignores_unblock() {
        let mut detector = DipDetector::default();
        assert!(!detector.evaluate_unblock(AVG, AVG));
        assert_eq!(detector.block_counter(), 0);
    }

    #[test]
    fn test_rearmed_detector_fires_again() {
        let mut detector = blocked();
        for _ in 0..=DETECTION_BLOCK_COUNTER_MAX {
            detector.evaluate_unblock(AVG, AVG);
        }
        assert!(detector.detect(AVG, AVG - DELTAV_TH - 1).is_some());
    }

    #[test]
    fn test_custom_config() {
        let config = DetectorConfig {
            dip_threshold: 50,
            unblock_delta: 5,
            block_counter_max: 2,
        };
        let mut detector = DipDetector::new(config);
        assert!(detector.detect(600, 560).is_none());
        assert!(detector.detect(600, 549).is_some());
        for _ in 0..3 {
            detector.evaluate_unblock(600, 604);
        }
        assert!(!detector.is_blocked());
    }

    #[test]
    fn test_reset_rearms() {
        let mut detector = blocked();
        detector.evaluate_unblock(AVG, AVG);
        detector.reset();
        assert_eq!(detector.state(), DetectionState::Armed);
        assert_eq!(detector.block_counter(), 0);
    }
}
