//! Compiled-in bin table: ADC level -> histogram bin -> FRAM address -> volts.
//!
//! The three columns are generated offline from the divider calibration and
//! pasted in verbatim. [`BinTable::new`] is a `const fn` that rejects a
//! malformed table at compile time (unequal column lengths, thresholds not
//! strictly ascending, addresses misaligned or outside the counter region).

use crate::config::{COUNTER_REGION_END, COUNTER_WIDTH, Sample};
use crate::store::Address;

/// Number of bins in [`HV_BINS`].
pub const BIN_COUNT: usize = 100;

/// Lower ADC threshold of each bin (a level must be strictly above it).
pub const THRESHOLDS: [Sample; BIN_COUNT] = [
    134, 143, 152, 161, 170, 179, 188, 197, 206, 215, 224, 233, 241, 250, 259, 268, 277, 286, 295, 304, 313,
    322, 331, 340, 349, 358, 367, 376, 385, 394, 403, 412, 421, 430, 439, 448, 457, 466, 475, 484, 493, 502,
    511, 520, 529, 538, 547, 556, 565, 574, 583, 592, 601, 610, 619, 628, 636, 645, 654, 663, 672, 681, 690,
    699, 708, 717, 726, 735, 744, 753, 762, 771, 780, 789, 798, 807, 816, 825, 834, 843, 852, 861, 870, 879,
    888, 897, 906, 915, 924, 933, 942, 951, 960, 969, 978, 987, 996, 1005, 1014, 1023,
];

/// Charging voltage shown for each bin, in volts.
pub const VOLTAGES: [u16; BIN_COUNT] = [
    420, 448, 476, 504, 532, 560, 588, 616, 644, 672, 700, 728, 756, 785, 813, 841, 869, 897, 925, 953, 981,
    1009, 1037, 1065, 1093, 1122, 1150, 1178, 1206, 1234, 1262, 1290, 1318, 1346, 1374, 1402, 1430, 1458,
    1487, 1515, 1543, 1571, 1599, 1627, 1655, 1683, 1711, 1739, 1767, 1795, 1824, 1852, 1880, 1908, 1936,
    1964, 1992, 2020, 2048, 2076, 2104, 2132, 2161, 2189, 2217, 2245, 2273, 2301, 2329, 2357, 2385, 2413,
    2441, 2469, 2497, 2526, 2554, 2582, 2610, 2638, 2666, 2694, 2722, 2750, 2778, 2806, 2834, 2863, 2891,
    2919, 2947, 2975, 3003, 3031, 3059, 3087, 3115, 3143, 3171, 3200,
];

/// FRAM address of each bin's 32-bit counter.
pub const ADDRESSES: [Address; BIN_COUNT] = [
    0, 4, 8, 12, 16, 20, 24, 28, 32, 36, 40, 44, 48, 52, 56, 60, 64, 68, 72, 76, 80, 84, 88, 92, 96, 100, 104,
    108, 112, 116, 120, 124, 128, 132, 136, 140, 144, 148, 152, 156, 160, 164, 168, 172, 176, 180, 184, 188,
    192, 196, 200, 204, 208, 212, 216, 220, 224, 228, 232, 236, 240, 244, 248, 252, 256, 260, 264, 268, 272,
    276, 280, 284, 288, 292, 296, 300, 304, 308, 312, 316, 320, 324, 328, 332, 336, 340, 344, 348, 352, 356,
    360, 364, 368, 372, 376, 380, 384, 388, 392, 396,
];

/// The table used by the firmware and simulator.
pub static HV_BINS: BinTable = BinTable::new(&THRESHOLDS, &VOLTAGES, &ADDRESSES);

/// One resolved bin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bin {
    /// Position in the table (0 = lowest voltage).
    pub index: usize,
    /// ADC threshold the level exceeded.
    pub threshold: Sample,
    /// Display voltage in volts.
    pub voltage: u16,
    /// FRAM address of the counter.
    pub address: Address,
}

/// Three parallel, ascending columns describing the histogram bins.
#[derive(Debug)]
pub struct BinTable {
    thresholds: &'static [Sample],
    voltages: &'static [u16],
    addresses: &'static [Address],
}

impl BinTable {
    /// Build a table, panicking (at compile time when used in a `static`)
    /// if the columns are inconsistent.
    pub const fn new(
        thresholds: &'static [Sample],
        voltages: &'static [u16],
        addresses: &'static [Address],
    ) -> Self {
        assert!(thresholds.len() == voltages.len(), "bin table columns differ in length");
        assert!(thresholds.len() == addresses.len(), "bin table columns differ in length");

        let mut i = 0;
        while i < thresholds.len() {
            if i > 0 {
                assert!(thresholds[i - 1] < thresholds[i], "bin thresholds must be strictly ascending");
                assert!(voltages[i - 1] < voltages[i], "bin voltages must be strictly ascending");
                assert!(addresses[i - 1] < addresses[i], "bin addresses must be strictly ascending");
            }
            assert!(addresses[i] % COUNTER_WIDTH == 0, "bin address not word aligned");
            assert!(
                addresses[i] as u32 + COUNTER_WIDTH as u32 <= COUNTER_REGION_END as u32,
                "bin address outside the counter region"
            );
            i += 1;
        }

        Self {
            thresholds,
            voltages,
            addresses,
        }
    }

    /// Number of bins.
    #[inline]
    pub const fn len(&self) -> usize { self.thresholds.len() }

    /// True for a table without bins.
    #[inline]
    pub const fn is_empty(&self) -> bool { self.thresholds.is_empty() }

    /// Bin at `index`, if any.
    pub fn get(
        &self,
        index: usize,
    ) -> Option<Bin> {
        if index >= self.len() {
            return None;
        }
        Some(Bin {
            index,
            threshold: self.thresholds[index],
            voltage: self.voltages[index],
            address: self.addresses[index],
        })
    }

    /// Map a charge level to its bin: the greatest `i` with `level > threshold[i]`.
    ///
    /// Returns `None` when the level is at or below the lowest threshold.
    /// Sub-range levels are expected (startup, idle flasher) and are not errors.
    pub fn bin_of(
        &self,
        level: Sample,
    ) -> Option<Bin> {
        // Number of thresholds strictly below `level`.
        let above = self.thresholds.partition_point(|&threshold| threshold < level);
        above.checked_sub(1).and_then(|index| self.get(index))
    }

    /// Iterate over all bins, lowest voltage first.
    pub fn iter(&self) -> impl Iterator<Item = Bin> + '_ { (0..self.len()).filter_map(|index| self.get(index)) }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_dimensions() {
        assert_eq!(HV_BINS.len(), 100);
        assert!(!HV_BINS.is_empty());
        assert_eq!(HV_BINS.iter().count(), BIN_COUNT);
    }

    #[test]
    fn test_dip_threshold_in_volts() {
        let volts = u32::from(VOLTAGES[BIN_COUNT - 1] - VOLTAGES[0]);
        let counts = u32::from(THRESHOLDS[BIN_COUNT - 1] - THRESHOLDS[0]);
        assert_eq!(u32::from(crate::config::DELTAV_TH) * volts / counts, 31, "dip threshold is ~31V");
    }

    #[test]
    fn test_get_out_of_range() {
        assert!(HV_BINS.get(BIN_COUNT).is_none());
        let last = HV_BINS.get(BIN_COUNT - 1).unwrap();
        assert_eq!(last.voltage, 3200);
        assert_eq!(last.address, 396);
    }

    #[test]
    fn test_below_lowest_threshold_is_not_found() {
        assert!(HV_BINS.bin_of(0).is_none());
        assert!(HV_BINS.bin_of(133).is_none());
        assert!(HV_BINS.bin_of(134).is_none(), "level equal to the lowest floor is not inside bin 0");
    }

    #[test]
    fn test_lowest_bin_is_reachable() {
        let bin = HV_BINS.bin_of(135).expect("just above the lowest floor");
        assert_eq!(bin.index, 0);
        assert_eq!(bin.voltage, 420);
        assert_eq!(bin.address, 0);
    }

    #[test]
    fn test_every_boundary() {
        for i in 1..HV_BINS.len() {
            let threshold = THRESHOLDS[i];

            let at = HV_BINS.bin_of(threshold).unwrap();
            assert_eq!(at.index, i - 1, "level == threshold[{i}] belongs to the bin below");

            let below = HV_BINS.bin_of(threshold - 1).unwrap();
            assert_eq!(below.index, i - 1, "level just below threshold[{i}]");

            if let Some(above) = HV_BINS.bin_of(threshold + 1) {
                assert_eq!(above.index, i, "level just above threshold[{i}]");
            }
        }
    }

    #[test]
    fn test_matches_reverse_linear_scan() {
        for level in 0..=1100u16 {
            let linear = (0..THRESHOLDS.len()).rev().find(|&i| level > THRESHOLDS[i]);
            assert_eq!(HV_BINS.bin_of(level).map(|b| b.index), linear, "level {level}");
        }
    }

    #[test]
    fn test_full_scale_lands_in_second_highest_bin() {
        // 1023 equals the top threshold, so the top bin needs a level the ADC cannot produce.
        let bin = HV_BINS.bin_of(1023).unwrap();
        assert_eq!(bin.index, BIN_COUNT - 2);
        assert_eq!(bin.voltage, 3171);
    }

    #[test]
    fn test_custom_table() {
        static T: [Sample; 3] = [10, 20, 30];
        static V: [u16; 3] = [100, 200, 300];
        static A: [Address; 3] = [0, 4, 8];
        let table = BinTable::new(&T, &V, &A);

        assert!(table.bin_of(10).is_none());
        assert_eq!(table.bin_of(11).map(|b| b.index), Some(0));
        assert_eq!(table.bin_of(20).map(|b| b.index), Some(0));
        assert_eq!(table.bin_of(21).map(|b| b.index), Some(1));
        assert_eq!(table.bin_of(u16::MAX).map(|b| b.index), Some(2));
    }

    #[test]
    #[should_panic(expected = "strictly ascending")]
    fn test_rejects_unsorted_thresholds() {
        static T: [Sample; 2] = [20, 10];
        static V: [u16; 2] = [100, 200];
        static A: [Address; 2] = [0, 4];
        let _ = BinTable::new(&T, &V, &A);
    }
}
