//! Command encoder
//!
//! Each call owns the bus for exactly one transaction. Failures are reported
//! as-is; nothing is retried here.

use wilchif_core::error::{Error, Result};
use wilchif_core::host::SdioHost;
use wilchif_core::sdio::{Cmd52, Cmd53};

use crate::bus::SdioBus;

impl<H: SdioHost> SdioBus<H> {
    /// Execute one CMD52
    pub(crate) fn cmd52(&self, cmd: &mut Cmd52) -> Result<()> {
        let result = self.lock_host().cmd52(cmd);
        if let Err(e) = result {
            log::error!(
                "CMD52 f{} {:?} 0x{:05x} failed: {}",
                cmd.function,
                cmd.direction,
                cmd.address,
                e
            );
        }
        result
    }

    /// Execute one CMD53
    pub(crate) fn cmd53(&self, cmd: &mut Cmd53<'_>) -> Result<()> {
        if !cmd.count_fits() {
            return Err(Error::TransferTooLarge);
        }
        let result = self.lock_host().cmd53(cmd);
        if let Err(e) = result {
            log::error!(
                "CMD53 f{} {:?} 0x{:05x} ({} bytes) failed: {}",
                cmd.function,
                cmd.direction(),
                cmd.address,
                cmd.transfer_len(),
                e
            );
        }
        result
    }

    /// Read one byte
    pub(crate) fn read_byte(&self, function: u8, addr: u32) -> Result<u8> {
        let mut cmd = Cmd52::read(function, addr);
        self.cmd52(&mut cmd)?;
        Ok(cmd.data)
    }

    /// Write one byte
    pub(crate) fn write_byte(&self, function: u8, addr: u32, data: u8) -> Result<()> {
        self.cmd52(&mut Cmd52::write(function, addr, data))
    }

    /// Write one byte and return what the card reads back
    pub(crate) fn write_byte_raw(&self, function: u8, addr: u32, data: u8) -> Result<u8> {
        let mut cmd = Cmd52::write_raw(function, addr, data);
        self.cmd52(&mut cmd)?;
        Ok(cmd.data)
    }

    pub(crate) fn claim_irq(&self) -> Result<()> {
        self.lock_host().claim_irq().map_err(|e| {
            log::error!("Failed to claim SDIO interrupt: {}", e);
            Error::IrqClaimFailed
        })
    }

    pub(crate) fn release_irq(&self) {
        if let Err(e) = self.lock_host().release_irq() {
            log::error!("Failed to release SDIO interrupt: {}", e);
        }
    }
}
