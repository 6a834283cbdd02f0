//! Indirect address window

use wilchif_core::error::{Error, Result};
use wilchif_core::host::SdioHost;
use wilchif_core::sdio::{regs, FUNC0};

use crate::bus::SdioBus;

const WINDOW_BYTES: [u32; 3] = [regs::CSA_ADDR_0, regs::CSA_ADDR_1, regs::CSA_ADDR_2];

impl<H: SdioHost> SdioBus<H> {
    /// Point the window data port at `addr` (24 bits, little-endian bytes)
    ///
    /// The window is not cached: callers reprogram it before every windowed
    /// transaction. A failed byte leaves the window half-written. Addresses
    /// beyond 24 bits are rejected before any write.
    pub(crate) fn set_window(&self, addr: u32) -> Result<()> {
        if addr > regs::CSA_ADDR_MAX {
            log::error!("Address 0x{:08x} is outside the window", addr);
            return Err(Error::AddressOutOfRange(addr));
        }

        let bytes = addr.to_le_bytes();
        for (reg, byte) in WINDOW_BYTES.iter().zip(bytes) {
            self.write_byte(FUNC0, *reg, byte).inspect_err(|_| {
                log::error!("Failed to set window address 0x{:06x} (reg 0x{:03x})", addr, reg);
            })?;
        }
        Ok(())
    }
}
