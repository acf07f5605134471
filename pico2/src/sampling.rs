//! ADC to [`Sample`] conversion.
//!
//! The RP2350 ADC delivers 12 bits; the bin table is calibrated for 10-bit
//! samples, so the two lowest bits are dropped. A failed conversion must not
//! stall the cycle: the last good sample is repeated instead.

use core::fmt::Debug;

use hvpulse_common::config::{SAMPLE_BITS, SAMPLE_MAX, Sample};
use log::warn;

use crate::config::ADC_NATIVE_BITS;

/// Reduce a native ADC reading to the 10-bit sample range.
#[inline]
pub fn quantize_adc(raw: u16) -> Sample { (raw >> (ADC_NATIVE_BITS - SAMPLE_BITS)).min(SAMPLE_MAX) }

/// Turns fallible ADC reads into a steady stream of samples.
#[derive(Debug, Default)]
pub struct AdcSampler {
    last: Sample,
    failing: bool,
    errors: u32,
}

impl AdcSampler {
    /// Create a sampler whose fallback value is 0.
    pub const fn new() -> Self {
        Self {
            last: 0,
            failing: false,
            errors: 0,
        }
    }

    /// Convert one reading; on error, repeat the previous sample.
    ///
    /// Only the first error of a run is logged.
    pub fn accept<E: Debug>(
        &mut self,
        reading: Result<u16, E>,
    ) -> Sample {
        match reading {
            Ok(raw) => {
                self.failing = false;
                self.last = quantize_adc(raw);
            }
            Err(e) => {
                if !self.failing {
                    warn!("ADC read failed, holding {}: {:?}", self.last, e);
                }
                self.failing = true;
                self.errors = self.errors.wrapping_add(1);
            }
        }
        self.last
    }

    /// Failed reads since boot.
    #[inline]
    pub const fn errors(&self) -> u32 { self.errors }

    /// Last sample handed out.
    #[inline]
    pub const fn last(&self) -> Sample { self.last }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize() {
        assert_eq!(quantize_adc(0), 0);
        assert_eq!(quantize_adc(3), 0);
        assert_eq!(quantize_adc(4), 1);
        assert_eq!(quantize_adc(4095), SAMPLE_MAX);
        assert_eq!(quantize_adc(u16::MAX), SAMPLE_MAX, "garbage above 12 bits is clamped");
    }

    #[test]
    fn test_error_holds_last_sample() {
        let mut sampler = AdcSampler::new();
        assert_eq!(sampler.accept::<()>(Ok(2000)), 500);
        assert_eq!(sampler.accept(Err(())), 500);
        assert_eq!(sampler.accept(Err(())), 500);
        assert_eq!(sampler.errors(), 2);
        assert_eq!(sampler.accept::<()>(Ok(400)), 100);
        assert_eq!(sampler.last(), 100);
    }

    #[test]
    fn test_error_before_first_read() {
        let mut sampler = AdcSampler::new();
        assert_eq!(sampler.accept(Err("timeout")), 0);
    }
}
