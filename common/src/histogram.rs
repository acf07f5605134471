//! Durable per-bin discharge counters.
//!
//! Every bin owns one big-endian `u32` at its table address. An increment is a
//! plain read-modify-write: there is exactly one writer (the cycle driver) and
//! the store is trusted to complete a 4-byte transaction or leave the old
//! value in place. There is no checksum, read-back verification or journal.
//!
//! Addresses are checked against the reserved counter region before the
//! store is touched, so a bad address can never corrupt neighbouring data.

use log::warn;
use thiserror::Error;

use crate::bin_table::{Bin, BinTable};
use crate::config::{COUNTER_REGION_END, COUNTER_WIDTH};
use crate::store::{Address, PersistentStore};

/// Histogram operation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HistogramError<E> {
    /// The address is misaligned or outside the counter region. Nothing was read or written.
    #[error("counter address {address:#06x} outside the reserved region")]
    AddressOutOfRange { address: Address },
    /// The underlying store failed.
    #[error("persistent store error: {0:?}")]
    Store(E),
}

/// Histogram counters on top of a [`PersistentStore`].
pub struct Histogram<S> {
    store: S,
    region_end: Address,
}

impl<S: PersistentStore> Histogram<S> {
    /// Wrap `store`, reserving `0..COUNTER_REGION_END` for counters.
    pub const fn new(store: S) -> Self {
        Self {
            store,
            region_end: COUNTER_REGION_END,
        }
    }

    /// Exclusive end of the counter region.
    #[inline]
    pub const fn region_end(&self) -> Address { self.region_end }

    /// True if a full counter fits at `address` inside the region.
    pub fn is_counter_address(
        &self,
        address: Address,
    ) -> bool {
        address % COUNTER_WIDTH == 0 && u32::from(address) + u32::from(COUNTER_WIDTH) <= u32::from(self.region_end)
    }

    fn check(
        &self,
        address: Address,
    ) -> Result<(), HistogramError<S::Error>> {
        if self.is_counter_address(address) {
            Ok(())
        } else {
            warn!("refusing counter access at {:#06x} (region ends at {:#06x})", address, self.region_end);
            Err(HistogramError::AddressOutOfRange { address })
        }
    }

    /// Current count at `address`.
    pub fn count(
        &mut self,
        address: Address,
    ) -> Result<u32, HistogramError<S::Error>> {
        self.check(address)?;
        self.store.read_word(address).map_err(HistogramError::Store)
    }

    /// Add one to the counter at `address` and return the new count.
    ///
    /// Saturates at `u32::MAX` so a counter never goes backwards.
    pub fn increment(
        &mut self,
        address: Address,
    ) -> Result<u32, HistogramError<S::Error>> {
        self.check(address)?;
        let current = self.store.read_word(address).map_err(HistogramError::Store)?;
        let next = current.saturating_add(1);
        self.store.write_word(address, next).map_err(HistogramError::Store)?;
        Ok(next)
    }

    /// Zero every counter of `table`.
    pub fn clear(
        &mut self,
        table: &BinTable,
    ) -> Result<(), HistogramError<S::Error>> {
        for bin in table.iter() {
            self.check(bin.address)?;
            self.store.write_word(bin.address, 0).map_err(HistogramError::Store)?;
        }
        Ok(())
    }

    /// Call `f` for every bin of `table` with a non-zero count, lowest voltage first.
    ///
    /// Returns the number of bins visited.
    pub fn for_each_nonzero(
        &mut self,
        table: &BinTable,
        mut f: impl FnMut(Bin, u32),
    ) -> Result<usize, HistogramError<S::Error>> {
        let mut visited = 0;
        for bin in table.iter() {
            let count = self.count(bin.address)?;
            if count > 0 {
                f(bin, count);
                visited += 1;
            }
        }
        Ok(visited)
    }

    /// Sum over all counters of `table`.
    pub fn total(
        &mut self,
        table: &BinTable,
    ) -> Result<u64, HistogramError<S::Error>> {
        let mut total = 0u64;
        self.for_each_nonzero(table, |_, count| total += u64::from(count))?;
        Ok(total)
    }

    /// Borrow the underlying store.
    #[inline]
    pub const fn store(&self) -> &S { &self.store }

    /// Mutably borrow the underlying store.
    #[inline]
    pub fn store_mut(&mut self) -> &mut S { &mut self.store }

    /// Give the store back.
    pub fn into_inner(self) -> S { self.store }
}

// =============================================================================
// Unit Tests
// =============================================================================
