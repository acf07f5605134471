//! Driver for the Cypress/Infineon FM25040B 4-Kbit SPI FRAM.
//!
//! The part is organized as 512 x 8 bits. Address bit A8 does not fit the
//! single address byte and travels in bit 3 of the `READ`/`WRITE` opcode.
//! Writes complete at bus speed (no page buffer, no busy polling), but every
//! write must be preceded by a `WREN` in its own chip-select cycle: the write
//! enable latch clears when a write ends.
//!
//! The driver talks to an [`embedded_hal::spi::SpiDevice`], so chip select is
//! owned by the bus layer (`ExclusiveDevice` on the board, a mock in tests).

use embedded_hal::spi::{Operation, SpiDevice};
use hvpulse_common::config::{COUNTER_REGION_END, STORE_SIZE};
use hvpulse_common::store::{Address, PersistentStore};
use log::debug;
use thiserror::Error;

// =============================================================================
// Opcodes
// =============================================================================

/// Set write enable latch.
pub const WREN: u8 = 0b0000_0110;
/// Reset write enable latch.
pub const WRDI: u8 = 0b0000_0100;
/// Read status register.
pub const RDSR: u8 = 0b0000_0101;
/// Write status register.
pub const WRSR: u8 = 0b0000_0001;
/// Read memory data (A8 in bit 3).
pub const READ: u8 = 0b0000_0011;
/// Write memory data (A8 in bit 3).
pub const WRITE: u8 = 0b0000_0010;

/// Opcode bit carrying address bit A8.
const A8_BIT: u8 = 1 << 3;

/// Status register: write enable latch.
pub const STATUS_WEL: u8 = 1 << 1;
/// Status register: block protect bits.
pub const STATUS_BP_MASK: u8 = 0b0000_1100;

/// FRAM errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FramError<E> {
    /// SPI transaction failed.
    #[error("SPI transfer failed: {0:?}")]
    Spi(E),
    /// The access does not fit the part (or the counter region, for word writes).
    #[error("{len}-byte access at {address:#05x} is out of range")]
    OutOfRange { address: Address, len: usize },
}

/// FM25040B on an SPI device.
pub struct Fm25040b<SPI> {
    spi: SPI,
}

impl<SPI: SpiDevice> Fm25040b<SPI> {
    /// Wrap an SPI device whose chip select drives the FRAM.
    pub const fn new(spi: SPI) -> Self { Self { spi } }

    /// Give the SPI device back.
    pub fn release(self) -> SPI { self.spi }

    /// Read the status register.
    pub fn status(&mut self) -> Result<u8, FramError<SPI::Error>> {
        let mut status = [0u8];
        self.spi
            .transaction(&mut [Operation::Write(&[RDSR]), Operation::Read(&mut status)])
            .map_err(FramError::Spi)?;
        Ok(status[0])
    }

    /// Write the status register (block protection). Sends `WREN` first.
    pub fn set_status(
        &mut self,
        status: u8,
    ) -> Result<(), FramError<SPI::Error>> {
        self.write_enable()?;
        self.spi.write(&[WRSR, status & STATUS_BP_MASK]).map_err(FramError::Spi)
    }

    /// Set the write enable latch.
    pub fn write_enable(&mut self) -> Result<(), FramError<SPI::Error>> { self.spi.write(&[WREN]).map_err(FramError::Spi) }

    /// Clear the write enable latch.
    pub fn write_disable(&mut self) -> Result<(), FramError<SPI::Error>> { self.spi.write(&[WRDI]).map_err(FramError::Spi) }

    /// Read `buf.len()` bytes starting at `address`.
    pub fn read(
        &mut self,
        address: Address,
        buf: &mut [u8],
    ) -> Result<(), FramError<SPI::Error>> {
        check_range(address, buf.len(), STORE_SIZE)?;
        let command = command(READ, address);
        self.spi
            .transaction(&mut [Operation::Write(&command), Operation::Read(buf)])
            .map_err(FramError::Spi)
    }

    /// Write `data` starting at `address`. Sends `WREN` first.
    pub fn write(
        &mut self,
        address: Address,
        data: &[u8],
    ) -> Result<(), FramError<SPI::Error>> {
        check_range(address, data.len(), STORE_SIZE)?;
        self.write_enable()?;
        let command = command(WRITE, address);
        self.spi
            .transaction(&mut [Operation::Write(&command), Operation::Write(data)])
            .map_err(FramError::Spi)
    }
}

impl<SPI: SpiDevice> PersistentStore for Fm25040b<SPI> {
    type Error = FramError<SPI::Error>;

    fn read_word(
        &mut self,
        address: Address,
    ) -> Result<u32, Self::Error> {
        let mut word = [0u8; 4];
        self.read(address, &mut word)?;
        Ok(u32::from_be_bytes(word))
    }

    /// Counter words are only ever written inside the counter region.
    fn write_word(
        &mut self,
        address: Address,
        value: u32,
    ) -> Result<(), Self::Error> {
        if let Err(e) = check_range(address, 4, usize::from(COUNTER_REGION_END)) {
            debug!("FRAM word write at {:#05x} rejected", address);
            return Err(e);
        }
        self.write(address, &value.to_be_bytes())
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Opcode with A8 folded in, followed by the low address byte.
const fn command(
    opcode: u8,
    address: Address,
) -> [u8; 2] {
    let a8 = if address & 0x100 != 0 { A8_BIT } else { 0 };
    [opcode | a8, address as u8]
}

fn check_range<E>(
    address: Address,
    len: usize,
    end: usize,
) -> Result<(), FramError<E>> {
    if usize::from(address) + len > end {
        return Err(FramError::OutOfRange { address, len });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use embedded_hal::spi::{ErrorKind, ErrorType};

    use super::*;

    /// Emulates the FM25040B at the command level.
    struct FramMock {
        memory: [u8; STORE_SIZE],
        status: u8,
        /// First byte of every transaction, in order.
        opcodes: Vec<u8>,
        fail: bool,
    }

    impl FramMock {
        fn new() -> Self {
            Self {
                memory: [0; STORE_SIZE],
                status: 0,
                opcodes: Vec::new(),
                fail: false,
            }
        }

        fn wel(&self) -> bool { self.status & STATUS_WEL != 0 }
    }

    impl ErrorType for FramMock {
        type Error = ErrorKind;
    }

    impl SpiDevice for FramMock {
        fn transaction(
            &mut self,
            operations: &mut [Operation<'_, u8>],
        ) -> Result<(), Self::Error> {
            if self.fail {
                return Err(ErrorKind::Other);
            }

            let (first, rest) = operations.split_first_mut().expect("empty transaction");
            let Operation::Write(command) = first else {
                panic!("transaction must start with a command");
            };
            let opcode = command[0];
            self.opcodes.push(opcode);

            match opcode & !A8_BIT {
                WREN => self.status |= STATUS_WEL,
                WRDI => self.status &= !STATUS_WEL,
                RDSR => {
                    if let Some(Operation::Read(buf)) = rest.first_mut() {
                        buf.fill(self.status);
                    }
                }
                WRSR if self.wel() => {
                    self.status = command[1] & STATUS_BP_MASK;
                }
                READ | WRITE => {
                    let mut address = usize::from(command[1]);
                    if opcode & A8_BIT != 0 {
                        address += 0x100;
                    }
                    let is_write = opcode & !A8_BIT == WRITE;
                    for op in rest {
                        match op {
                            Operation::Read(buf) if !is_write => {
                                for byte in buf.iter_mut() {
                                    *byte = self.memory[address % STORE_SIZE];
                                    address += 1;
                                }
                            }
                            Operation::Write(data) if is_write && self.wel() => {
                                for &byte in data.iter() {
                                    self.memory[address % STORE_SIZE] = byte;
                                    address += 1;
                                }
                            }
                            _ => {}
                        }
                    }
                    if is_write {
                        self.status &= !STATUS_WEL;
                    }
                }
                _ => {}
            }
            // WRSR also ends a write cycle
            if opcode == WRSR {
                self.status &= !STATUS_WEL;
            }
            Ok(())
        }
    }

    fn fram() -> Fm25040b<FramMock> { Fm25040b::new(FramMock::new()) }

    #[test]
    fn test_command_folds_a8() {
        assert_eq!(command(READ, 0x0FF), [0x03, 0xFF]);
        assert_eq!(command(READ, 0x100), [0x0B, 0x00]);
        assert_eq!(command(WRITE, 0x1FB), [0x0A, 0xFB]);
    }

    #[test]
    fn test_every_write_sends_wren() {
        let mut fram = fram();
        fram.write_word(0, 1).unwrap();
        fram.write_word(4, 2).unwrap();
        assert_eq!(fram.spi.opcodes, vec![WREN, WRITE, WREN, WRITE]);
        assert!(!fram.spi.wel(), "latch clears after the write");
    }

    #[test]
    fn test_word_is_big_endian() {
        let mut fram = fram();
        fram.write_word(8, 0x1234_5678).unwrap();
        assert_eq!(&fram.spi.memory[8..12], &[0x12, 0x34, 0x56, 0x78]);
        assert_eq!(fram.read_word(8).unwrap(), 0x1234_5678);
    }

    #[test]
    fn test_upper_half_uses_a8() {
        let mut fram = fram();
        fram.write_word(0x180, 77).unwrap();
        assert_eq!(fram.read_word(0x180).unwrap(), 77);
        assert_eq!(fram.read_word(0x080).unwrap(), 0, "A8 must not alias to the lower half");
        assert_eq!(fram.spi.opcodes[1], WRITE | A8_BIT);
    }

    #[test]
    fn test_word_write_stays_in_counter_region() {
        let mut fram = fram();
        assert!(fram.write_word(COUNTER_REGION_END - 4, 1).is_ok());
        assert_eq!(
            fram.write_word(COUNTER_REGION_END, 1),
            Err(FramError::OutOfRange {
                address: COUNTER_REGION_END,
                len: 4
            })
        );
        assert_eq!(fram.spi.opcodes.len(), 2, "rejected write never reaches the bus");
        assert!(fram.read_word(COUNTER_REGION_END).is_ok(), "reads cover the whole part");
    }

    #[test]
    fn test_raw_access_bounds() {
        let mut fram = fram();
        let mut buf = [0u8; 4];
        assert!(fram.read(508, &mut buf).is_ok());
        assert!(matches!(fram.read(509, &mut buf), Err(FramError::OutOfRange { .. })));
        assert!(fram.write(511, &[0xAA]).is_ok());
        assert_eq!(fram.spi.memory[511], 0xAA);
    }

    #[test]
    fn test_status_and_protection() {
        let mut fram = fram();
        assert_eq!(fram.status().unwrap(), 0);
        fram.write_enable().unwrap();
        assert_eq!(fram.status().unwrap() & STATUS_WEL, STATUS_WEL);
        fram.write_disable().unwrap();
        assert_eq!(fram.status().unwrap() & STATUS_WEL, 0);

        fram.set_status(0xFF).unwrap();
        assert_eq!(fram.status().unwrap(), STATUS_BP_MASK);
    }

    #[test]
    fn test_spi_errors_propagate() {
        let mut fram = fram();
        fram.spi.fail = true;
        assert_eq!(fram.read_word(0), Err(FramError::Spi(ErrorKind::Other)));
        assert_eq!(fram.write_word(0, 1), Err(FramError::Spi(ErrorKind::Other)));
    }

    #[test]
    fn test_drives_histogram() {
        use hvpulse_common::{HV_BINS, Histogram};

        let mut histogram = Histogram::new(fram());
        let bin = HV_BINS.get(99).unwrap();
        assert_eq!(histogram.increment(bin.address).unwrap(), 1);
        assert_eq!(histogram.increment(bin.address).unwrap(), 2);
        assert_eq!(histogram.total(&HV_BINS).unwrap(), 2);

        let mock = histogram.into_inner().release();
        assert_eq!(&mock.memory[396..400], &[0, 0, 0, 2]);
    }
}
