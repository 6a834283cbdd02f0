//! CMD52/CMD53 command structures
//!
//! Both commands carry their fields explicitly; the packed 32-bit argument
//! is produced by [`Cmd52::argument`] / [`Cmd53::argument`] and goes on the
//! wire little-endian.

use super::{ADDRESS_MASK, CMD53_MAX_COUNT, FUNCTION_MASK};

const RW_SHIFT: u32 = 31;
const FUNC_SHIFT: u32 = 28;
const RAW_SHIFT: u32 = 27;
const BLOCK_MODE_SHIFT: u32 = 27;
const INCREMENT_SHIFT: u32 = 26;
const ADDR_SHIFT: u32 = 9;

/// Transfer direction, as seen from the host
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Device to host
    #[default]
    Read,
    /// Host to device
    Write,
}

/// A single-byte register transaction (IO_RW_DIRECT)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cmd52 {
    /// Read or write
    pub direction: Direction,
    /// Function number (3 bits)
    pub function: u8,
    /// Read-after-write: the written register is read back into `data`
    pub raw: bool,
    /// Register address (17 bits)
    pub address: u32,
    /// Byte written, or byte read back after execution
    pub data: u8,
}

impl Cmd52 {
    /// Create a single-byte read
    pub const fn read(function: u8, address: u32) -> Self {
        Self {
            direction: Direction::Read,
            function: function & FUNCTION_MASK,
            raw: false,
            address: address & ADDRESS_MASK,
            data: 0,
        }
    }

    /// Create a single-byte write
    pub const fn write(function: u8, address: u32, data: u8) -> Self {
        Self {
            direction: Direction::Write,
            function: function & FUNCTION_MASK,
            raw: false,
            address: address & ADDRESS_MASK,
            data,
        }
    }

    /// Create a single-byte write whose result is read back into `data`
    pub const fn write_raw(function: u8, address: u32, data: u8) -> Self {
        Self {
            direction: Direction::Write,
            function: function & FUNCTION_MASK,
            raw: true,
            address: address & ADDRESS_MASK,
            data,
        }
    }

    /// Returns true if this command writes to the device
    pub const fn is_write(&self) -> bool {
        matches!(self.direction, Direction::Write)
    }

    /// Pack the command into its 32-bit argument
    pub const fn argument(&self) -> u32 {
        let mut arg = ((self.function & FUNCTION_MASK) as u32) << FUNC_SHIFT;
        if self.is_write() {
            arg |= 1 << RW_SHIFT;
            // RAW is only meaningful on writes
            if self.raw {
                arg |= 1 << RAW_SHIFT;
            }
            arg |= self.data as u32;
        }
        arg | ((self.address & ADDRESS_MASK) << ADDR_SHIFT)
    }

    /// Unpack a 32-bit argument
    pub const fn from_argument(arg: u32) -> Self {
        let write = (arg >> RW_SHIFT) & 1 != 0;
        Self {
            direction: if write {
                Direction::Write
            } else {
                Direction::Read
            },
            function: ((arg >> FUNC_SHIFT) as u8) & FUNCTION_MASK,
            raw: write && (arg >> RAW_SHIFT) & 1 != 0,
            address: (arg >> ADDR_SHIFT) & ADDRESS_MASK,
            data: if write { arg as u8 } else { 0 },
        }
    }

    /// Wire encoding of the argument
    pub const fn to_le_bytes(&self) -> [u8; 4] {
        self.argument().to_le_bytes()
    }
}

/// Data phase of a CMD53
#[derive(Debug)]
pub enum Cmd53Data<'a> {
    /// Buffer filled by the device
    Read(&'a mut [u8]),
    /// Bytes sent to the device
    Write(&'a [u8]),
}

/// A block or byte-count transaction (IO_RW_EXTENDED)
///
/// Designed to avoid allocation - the data phase borrows the caller's
/// buffer for the lifetime of the command.
#[derive(Debug)]
pub struct Cmd53<'a> {
    /// Function number (3 bits)
    pub function: u8,
    /// Start address (17 bits)
    pub address: u32,
    /// Count is in blocks rather than bytes
    pub block_mode: bool,
    /// Address increments during the transfer
    pub increment: bool,
    /// Number of blocks or bytes (9 bits)
    pub count: u16,
    /// Current block size of the function
    pub block_size: u32,
    /// Data phase
    pub data: Cmd53Data<'a>,
}

impl<'a> Cmd53<'a> {
    /// Create a byte-mode read filling all of `buf`
    pub fn read(function: u8, address: u32, buf: &'a mut [u8]) -> Self {
        let count = buf.len() as u16;
        Self {
            function: function & FUNCTION_MASK,
            address: address & ADDRESS_MASK,
            block_mode: false,
            increment: true,
            count,
            block_size: 0,
            data: Cmd53Data::Read(buf),
        }
    }

    /// Create a byte-mode write of all of `data`
    pub fn write(function: u8, address: u32, data: &'a [u8]) -> Self {
        Self {
            function: function & FUNCTION_MASK,
            address: address & ADDRESS_MASK,
            block_mode: false,
            increment: true,
            count: data.len() as u16,
            block_size: 0,
            data: Cmd53Data::Write(data),
        }
    }

    /// Record the function's current block size without changing the mode
    pub fn with_block_size(mut self, block_size: u32) -> Self {
        self.block_size = block_size;
        self
    }

    /// Switch to block mode; the buffer length must be a multiple of `block_size`
    pub fn in_blocks(mut self, block_size: u32) -> Self {
        self.block_mode = true;
        self.block_size = block_size;
        self.count = (self.data_len() / block_size as usize) as u16;
        self
    }

    /// Direction of the data phase
    pub fn direction(&self) -> Direction {
        match self.data {
            Cmd53Data::Read(_) => Direction::Read,
            Cmd53Data::Write(_) => Direction::Write,
        }
    }

    /// Length of the borrowed buffer
    pub fn data_len(&self) -> usize {
        match &self.data {
            Cmd53Data::Read(buf) => buf.len(),
            Cmd53Data::Write(data) => data.len(),
        }
    }

    /// Number of bytes moved on the bus
    pub fn transfer_len(&self) -> usize {
        if self.block_mode {
            self.count as usize * self.block_size as usize
        } else {
            self.count as usize
        }
    }

    /// Returns true if the count fits the 9-bit field
    pub fn count_fits(&self) -> bool {
        self.count <= CMD53_MAX_COUNT
    }

    /// Pack the command into its 32-bit argument
    pub fn argument(&self) -> u32 {
        let mut arg = ((self.function & FUNCTION_MASK) as u32) << FUNC_SHIFT;
        if self.direction() == Direction::Write {
            arg |= 1 << RW_SHIFT;
        }
        if self.block_mode {
            arg |= 1 << BLOCK_MODE_SHIFT;
        }
        if self.increment {
            arg |= 1 << INCREMENT_SHIFT;
        }
        arg |= (self.address & ADDRESS_MASK) << ADDR_SHIFT;
        arg | (self.count & CMD53_MAX_COUNT) as u32
    }

    /// Wire encoding of the argument
    pub fn to_le_bytes(&self) -> [u8; 4] {
        self.argument().to_le_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmd52_write_argument() {
        // Reset request: write 0x08 to CCCR 0x06 on function 0
        let cmd = Cmd52::write(0, 0x06, 0x08);
        assert_eq!(cmd.argument(), 0x8000_0C08);
        assert_eq!(cmd.to_le_bytes(), [0x08, 0x0C, 0x00, 0x80]);
    }

    #[test]
    fn test_cmd52_raw_flag_and_decode() {
        let cmd = Cmd52::write_raw(0, 0x100, 0x80);
        let arg = cmd.argument();
        assert_ne!(arg & (1 << 27), 0);
        assert_eq!(Cmd52::from_argument(arg), cmd);

        let read = Cmd52::read(1, 0xF7);
        let decoded = Cmd52::from_argument(read.argument());
        assert_eq!(decoded.direction, Direction::Read);
        assert_eq!(decoded.function, 1);
        assert_eq!(decoded.address, 0xF7);
        assert!(!decoded.raw);
    }

    #[test]
    fn test_cmd52_masks_address_to_17_bits() {
        let cmd = Cmd52::read(0, 0x3_0000);
        assert_eq!(cmd.address, 0x1_0000);
        let cmd = Cmd52::read(9, 0);
        assert_eq!(cmd.function, 1);
    }

    #[test]
    fn test_cmd53_block_mode() {
        let data = [0u8; 1536];
        let cmd = Cmd53::write(1, 0, &data).in_blocks(512);
        assert!(cmd.block_mode);
        assert_eq!(cmd.count, 3);
        assert_eq!(cmd.transfer_len(), 1536);
        assert_eq!(cmd.direction(), Direction::Write);

        let arg = cmd.argument();
        assert_eq!(arg >> 31, 1);
        assert_eq!((arg >> 28) & 0x7, 1);
        assert_ne!(arg & (1 << 27), 0);
        assert_ne!(arg & (1 << 26), 0);
        assert_eq!(arg & 0x1FF, 3);
    }

    #[test]
    fn test_cmd53_byte_mode_read() {
        let mut buf = [0u8; 4];
        let cmd = Cmd53::read(0, 0x10F, &mut buf).with_block_size(512);
        assert!(!cmd.block_mode);
        assert_eq!(cmd.count, 4);
        assert_eq!(cmd.transfer_len(), 4);
        assert_eq!(cmd.block_size, 512);
        assert_eq!((cmd.argument() >> 9) & 0x1_FFFF, 0x10F);
        assert!(cmd.count_fits());
    }
}
