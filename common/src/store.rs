//! Persistent word store abstraction.
//!
//! The histogram only needs two synchronous operations on a small
//! byte-addressed memory: read a 32-bit word and write a 32-bit word.
//! The firmware implements [`PersistentStore`] on top of the SPI FRAM;
//! [`MemoryStore`] is a RAM-backed stand-in for the simulator and tests.

use thiserror::Error;

use crate::config::STORE_SIZE;

/// Byte address inside the persistent store.
pub type Address = u16;

/// A byte-addressed store of big-endian 32-bit words.
///
/// Implementations are not expected to detect interference: a write that is
/// cut short by a reset either lands fully or leaves the old value in place.
pub trait PersistentStore {
    /// Transport or bounds error reported by the implementation.
    type Error: core::fmt::Debug;

    /// Read the word starting at `address`.
    fn read_word(
        &mut self,
        address: Address,
    ) -> Result<u32, Self::Error>;

    /// Write `value` to the word starting at `address`.
    fn write_word(
        &mut self,
        address: Address,
        value: u32,
    ) -> Result<(), Self::Error>;
}

impl<T: PersistentStore + ?Sized> PersistentStore for &mut T {
    type Error = T::Error;

    #[inline]
    fn read_word(
        &mut self,
        address: Address,
    ) -> Result<u32, Self::Error> {
        (**self).read_word(address)
    }

    #[inline]
    fn write_word(
        &mut self,
        address: Address,
        value: u32,
    ) -> Result<(), Self::Error> {
        (**self).write_word(address, value)
    }
}

/// Errors from [`MemoryStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MemoryStoreError {
    /// The 4-byte word at `address` does not fit in the store.
    #[error("word at {address:#06x} is outside the {size}-byte store")]
    OutOfBounds { address: Address, size: usize },
}

/// RAM-backed [`PersistentStore`] with the same layout as the FRAM.
///
/// Starts zeroed. Can drop the next writes to emulate a reset landing in
/// the middle of a transaction (the previous value survives).
pub struct MemoryStore<const SIZE: usize = STORE_SIZE> {
    bytes: [u8; SIZE],
    writes: u32,
    interrupted_writes: u32,
}

impl<const SIZE: usize> MemoryStore<SIZE> {
    /// Create a zeroed store.
    pub const fn new() -> Self {
        Self {
            bytes: [0; SIZE],
            writes: 0,
            interrupted_writes: 0,
        }
    }

    /// Raw contents, e.g. to verify that nothing outside a region changed.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; SIZE] { &self.bytes }

    /// Number of writes that actually landed.
    #[inline]
    pub const fn writes(&self) -> u32 { self.writes }

    /// Silently drop the next `count` writes.
    pub fn interrupt_next_writes(
        &mut self,
        count: u32,
    ) {
        self.interrupted_writes = count;
    }

    fn range(address: Address) -> Result<core::ops::Range<usize>, MemoryStoreError> {
        let start = usize::from(address);
        let end = start + 4;
        if end > SIZE {
            return Err(MemoryStoreError::OutOfBounds { address, size: SIZE });
        }
        Ok(start..end)
    }
}

impl<const SIZE: usize> Default for MemoryStore<SIZE> {
    fn default() -> Self { Self::new() }
}

impl<const SIZE: usize> PersistentStore for MemoryStore<SIZE> {
    type Error = MemoryStoreError;

    fn read_word(
        &mut self,
        address: Address,
    ) -> Result<u32, Self::Error> {
        let range = Self::range(address)?;
        let mut word = [0u8; 4];
        word.copy_from_slice(&self.bytes[range]);
        Ok(u32::from_be_bytes(word))
    }

    fn write_word(
        &mut self,
        address: Address,
        value: u32,
    ) -> Result<(), Self::Error> {
        let range = Self::range(address)?;
        if self.interrupted_writes > 0 {
            self.interrupted_writes -= 1;
            return Ok(());
        }
        self.bytes[range].copy_from_slice(&value.to_be_bytes());
        self.writes += 1;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
