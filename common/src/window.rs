//! Fixed-depth window of the most recent samples.
//!
//! Index 0 is always the newest sample. The window starts zero-filled and the
//! zeros take part in the average until they have been pushed out, so the
//! average ramps up over the first [`WINDOW_DEPTH`] ticks after a reset.

use crate::config::{Sample, WINDOW_DEPTH};

/// Ring buffer of the last `N` samples, newest first.
#[derive(Clone, Debug)]
pub struct SampleWindow<const N: usize = WINDOW_DEPTH> {
    samples: [Sample; N],
    /// Slot holding the newest sample.
    head: usize,
    /// Pushes since reset, saturating at `N`.
    filled: usize,
}

impl<const N: usize> SampleWindow<N> {
    /// Create a zero-filled window.
    pub const fn new() -> Self {
        const { assert!(N > 0, "sample window needs at least one slot") };
        Self {
            samples: [0; N],
            head: 0,
            filled: 0,
        }
    }

    /// Push a new sample at index 0; the oldest sample is discarded.
    pub fn push(
        &mut self,
        sample: Sample,
    ) {
        self.head = (self.head + 1) % N;
        self.samples[self.head] = sample;
        if self.filled < N {
            self.filled += 1;
        }
    }

    /// Truncating integer mean over all `N` slots.
    pub fn average(&self) -> Sample {
        let sum: u32 = self.samples.iter().map(|&s| u32::from(s)).sum();
        (sum / N as u32) as Sample
    }

    /// The most recently pushed sample (0 before the first push).
    #[inline]
    pub const fn newest(&self) -> Sample { self.samples[self.head] }

    /// Sample pushed `age` ticks ago (0 = newest).
    pub fn get(
        &self,
        age: usize,
    ) -> Option<Sample> {
        if age >= N {
            return None;
        }
        Some(self.samples[(self.head + N - age) % N])
    }

    /// Iterate newest to oldest over all `N` slots.
    pub fn iter(&self) -> impl Iterator<Item = Sample> + '_ { (0..N).filter_map(|age| self.get(age)) }

    /// Capacity of the window.
    #[inline]
    pub const fn depth(&self) -> usize { N }

    /// Number of real samples pushed since reset (at most `N`).
    #[inline]
    pub const fn len(&self) -> usize { self.filled }

    /// True before the first push.
    #[inline]
    pub const fn is_empty(&self) -> bool { self.filled == 0 }

    /// True once every slot holds a real sample.
    #[inline]
    pub const fn is_warm(&self) -> bool { self.filled == N }

    /// Return to the cold-start state.
    pub fn reset(&mut self) { *self = Self::new(); }
}

impl<const N: usize> Default for SampleWindow<N> {
    fn default() -> Self { Self::new() }
}

// =============================================================================
// Unit Tests
// =============================================================================
