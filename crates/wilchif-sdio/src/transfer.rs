//! Block transfers and 32-bit register access
//!
//! A transfer of `size` bytes is rounded up to a whole word and split into
//! a block-mode phase of `size / block_size` blocks followed by one
//! byte-mode phase for the remainder.
//!
//! Address 0 is the function 1 data port and is reached directly. Any other
//! address goes through the indirect window on function 0, which is
//! reprogrammed before each phase.

use wilchif_core::error::{Error, Result};
use wilchif_core::host::SdioHost;
use wilchif_core::sdio::{regs, Cmd53, CMD53_MAX_COUNT, FUNC0, FUNC1};

use crate::bus::SdioBus;

/// Round `size` up to a multiple of 4
pub const fn align_word(size: u32) -> u32 {
    size.saturating_add(3) & !3
}

/// How a transfer is split between block and byte mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferPlan {
    /// Block size used for the block phase
    pub block_size: u32,
    /// Blocks moved in block mode
    pub blocks: u32,
    /// Bytes moved in byte mode after the blocks
    pub remainder: u32,
}

impl TransferPlan {
    /// Split a word-aligned `size`
    ///
    /// Fails with [`Error::TransferTooLarge`] if either phase does not fit
    /// the 9-bit CMD53 count.
    pub fn new(size: u32, block_size: u32) -> Result<Self> {
        if block_size == 0 {
            return Err(Error::TransferTooLarge);
        }
        let plan = Self {
            block_size,
            blocks: size / block_size,
            remainder: size % block_size,
        };
        let limit = u32::from(CMD53_MAX_COUNT);
        if plan.blocks > limit || plan.remainder > limit {
            log::error!(
                "Transfer of {} bytes needs {} blocks + {} bytes, over the CMD53 limit",
                size,
                plan.blocks,
                plan.remainder
            );
            return Err(Error::TransferTooLarge);
        }
        Ok(plan)
    }

    /// Bytes moved in the block phase
    pub const fn block_bytes(&self) -> usize {
        (self.blocks * self.block_size) as usize
    }

    /// Total bytes moved
    pub const fn total(&self) -> usize {
        self.block_bytes() + self.remainder as usize
    }
}

/// Function and port address of a transfer
#[derive(Debug, Clone, Copy)]
struct Target {
    function: u8,
    port: u32,
    windowed: bool,
}

impl Target {
    const fn for_address(addr: u32) -> Self {
        if addr == 0 {
            Self {
                function: FUNC1,
                port: 0,
                windowed: false,
            }
        } else {
            Self {
                function: FUNC0,
                port: regs::CSA_DATA,
                windowed: true,
            }
        }
    }
}

impl<H: SdioHost> SdioBus<H> {
    fn prepare(&self, addr: u32, size: u32, buf_len: usize) -> Result<(Target, TransferPlan)> {
        let size = align_word(size);
        if buf_len < size as usize {
            log::error!(
                "Buffer of {} bytes too small for a {} byte transfer",
                buf_len,
                size
            );
            return Err(Error::BufferTooSmall);
        }
        let plan = TransferPlan::new(size, self.block_size())?;
        Ok((Target::for_address(addr), plan))
    }

    fn open_window(&self, target: Target, addr: u32) -> Result<()> {
        if target.windowed {
            self.set_window(addr)?;
        }
        Ok(())
    }

    /// Write `size` bytes (rounded up to a word) from `buf` to `addr`
    pub(crate) fn write_block(&self, addr: u32, buf: &[u8], size: u32) -> Result<()> {
        let (target, plan) = self.prepare(addr, size, buf.len())?;
        let (blocks, rest) = buf[..plan.total()].split_at(plan.block_bytes());

        if plan.blocks > 0 {
            self.open_window(target, addr)?;
            let mut cmd =
                Cmd53::write(target.function, target.port, blocks).in_blocks(plan.block_size);
            self.cmd53(&mut cmd).inspect_err(|_| {
                log::error!("Failed block write of {} blocks to 0x{:x}", plan.blocks, addr);
            })?;
        }

        if plan.remainder > 0 {
            self.open_window(target, addr.wrapping_add(plan.block_bytes() as u32))?;
            let mut cmd =
                Cmd53::write(target.function, target.port, rest).with_block_size(plan.block_size);
            self.cmd53(&mut cmd).inspect_err(|_| {
                log::error!("Failed byte write of {} bytes to 0x{:x}", plan.remainder, addr);
            })?;
        }

        Ok(())
    }

    /// Read `size` bytes (rounded up to a word) from `addr` into `buf`
    pub(crate) fn read_block(&self, addr: u32, buf: &mut [u8], size: u32) -> Result<()> {
        let (target, plan) = self.prepare(addr, size, buf.len())?;
        let (blocks, rest) = buf[..plan.total()].split_at_mut(plan.block_bytes());

        if plan.blocks > 0 {
            self.open_window(target, addr)?;
            let mut cmd =
                Cmd53::read(target.function, target.port, blocks).in_blocks(plan.block_size);
            self.cmd53(&mut cmd).inspect_err(|_| {
                log::error!("Failed block read of {} blocks from 0x{:x}", plan.blocks, addr);
            })?;
        }

        if plan.remainder > 0 {
            self.open_window(target, addr.wrapping_add(plan.block_bytes() as u32))?;
            let mut cmd =
                Cmd53::read(target.function, target.port, rest).with_block_size(plan.block_size);
            self.cmd53(&mut cmd).inspect_err(|_| {
                log::error!("Failed byte read of {} bytes from 0x{:x}", plan.remainder, addr);
            })?;
        }

        Ok(())
    }

    /// Read a 32-bit register
    ///
    /// `0xF0..=0xFF` are single CMD52 registers on function 0; everything
    /// else is a 4-byte windowed read.
    pub(crate) fn read_word(&self, addr: u32) -> Result<u32> {
        if regs::is_direct(addr) {
            return self.read_byte(FUNC0, addr).map(u32::from);
        }

        self.set_window(addr)?;
        let mut word = [0u8; 4];
        let mut cmd =
            Cmd53::read(FUNC0, regs::CSA_DATA, &mut word).with_block_size(self.block_size());
        self.cmd53(&mut cmd).inspect_err(|_| {
            log::error!("Failed to read register 0x{:08x}", addr);
        })?;
        Ok(u32::from_le_bytes(word))
    }

    /// Write a 32-bit register
    pub(crate) fn write_word(&self, addr: u32, data: u32) -> Result<()> {
        if regs::is_direct(addr) {
            return self.write_byte(FUNC0, addr, data as u8);
        }

        self.set_window(addr)?;
        let word = data.to_le_bytes();
        let mut cmd =
            Cmd53::write(FUNC0, regs::CSA_DATA, &word).with_block_size(self.block_size());
        self.cmd53(&mut cmd).inspect_err(|_| {
            log::error!("Failed to write register 0x{:08x} = 0x{:08x}", addr, data);
        })
    }
}
