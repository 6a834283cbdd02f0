//! Transport and host-interface trait definitions

use crate::error::Result;
use crate::irq::{ClearFlags, InterruptStatus};
use crate::sdio::{Cmd52, Cmd53};

/// SDIO host trait
///
/// This trait represents a platform SDIO controller with a WILC card
/// attached. Each call performs exactly one bus transaction; the caller
/// serializes calls, so implementations never see overlapping commands.
///
/// ## Example
///
/// ```ignore
/// impl SdioHost for MyController {
///     fn cmd52(&mut self, cmd: &mut Cmd52) -> Result<()> {
///         let resp = self.send(52, cmd.argument())?;
///         if !cmd.is_write() || cmd.raw {
///             cmd.data = resp as u8;
///         }
///         Ok(())
///     }
///     // ...
/// }
/// ```
pub trait SdioHost {
    /// Execute a single-byte transaction
    ///
    /// For reads, and for writes with `raw` set, the byte returned by the
    /// card is stored in `cmd.data`.
    fn cmd52(&mut self, cmd: &mut Cmd52) -> Result<()>;

    /// Execute a block or byte-count transaction
    ///
    /// Moves `cmd.transfer_len()` bytes between the card and the command's
    /// buffer, using `cmd.block_size` as the function's current block size.
    fn cmd53(&mut self, cmd: &mut Cmd53<'_>) -> Result<()>;

    /// Register the card interrupt callback
    fn claim_irq(&mut self) -> Result<()>;

    /// Unregister the card interrupt callback
    fn release_irq(&mut self) -> Result<()>;

    /// Current bus clock in Hz, if the host knows it
    fn clock_hz(&self) -> Option<u32> {
        None
    }
}

// Blanket impl for boxed hosts to allow trait objects
#[cfg(feature = "alloc")]
impl SdioHost for alloc::boxed::Box<dyn SdioHost + Send> {
    fn cmd52(&mut self, cmd: &mut Cmd52) -> Result<()> {
        (**self).cmd52(cmd)
    }

    fn cmd53(&mut self, cmd: &mut Cmd53<'_>) -> Result<()> {
        (**self).cmd53(cmd)
    }

    fn claim_irq(&mut self) -> Result<()> {
        (**self).claim_irq()
    }

    fn release_irq(&mut self) -> Result<()> {
        (**self).release_irq()
    }

    fn clock_hz(&self) -> Option<u32> {
        (**self).clock_hz()
    }
}

/// Host interface used by the WLAN stack
///
/// One implementation exists per physical transport. The WLAN layer holds
/// only `&dyn HostInterface`, so transports are interchangeable.
///
/// All methods take `&self`: the interrupt thread and the control path call
/// into the same interface concurrently, and implementations serialize bus
/// access internally.
pub trait HostInterface {
    /// Negotiate the bus; `resume` skips chip identification
    fn init(&self, resume: bool) -> Result<()>;

    /// Mark the bus uninitialized (no hardware teardown)
    fn deinit(&self) -> Result<()>;

    /// Read a 32-bit register
    fn read_reg(&self, addr: u32) -> Result<u32>;

    /// Write a 32-bit register
    fn write_reg(&self, addr: u32, data: u32) -> Result<()>;

    /// Read `size` bytes (rounded up to a word) from `addr` into `buf`
    ///
    /// `buf` must hold at least the rounded size.
    fn block_read(&self, addr: u32, buf: &mut [u8], size: u32) -> Result<()>;

    /// Write `size` bytes (rounded up to a word) from `buf` to `addr`
    ///
    /// `buf` must hold at least the rounded size.
    fn block_write(&self, addr: u32, buf: &[u8], size: u32) -> Result<()>;

    /// Extended-path block read; same semantics as [`Self::block_read`]
    fn block_read_ext(&self, addr: u32, buf: &mut [u8], size: u32) -> Result<()> {
        self.block_read(addr, buf, size)
    }

    /// Extended-path block write; same semantics as [`Self::block_write`]
    fn block_write_ext(&self, addr: u32, buf: &[u8], size: u32) -> Result<()> {
        self.block_write(addr, buf, size)
    }

    /// Read the pending DMA size and interrupt flags
    fn read_interrupt_status(&self) -> Result<InterruptStatus>;

    /// Acknowledge interrupts and program VMM table selection
    fn clear_interrupts(&self, mask: ClearFlags) -> Result<()>;

    /// Pending DMA transfer size in 32-bit words
    fn read_pending_size(&self) -> Result<u16>;

    /// Route `lines` interrupt lines to the host
    fn sync_interrupts(&self, lines: u32) -> Result<()>;

    /// Register the hardware interrupt callback
    fn enable_interrupts(&self) -> Result<()>;

    /// Wait for any in-flight interrupt, then unregister the callback
    fn disable_interrupts(&self);

    /// Ask the device to reset itself
    fn reset(&self) -> Result<()>;

    /// Returns true once negotiation has completed
    fn is_initialized(&self) -> bool;
}

/// Upstream interrupt service routine
///
/// Called once per delivered hardware interrupt. The bus is not held while
/// this runs, so the handler may issue its own transactions.
pub trait IrqHandler: Send + Sync {
    /// Service the interrupt
    fn handle_isr(&self);
}

/// Device and host sleep handshakes bracketing suspend/resume
///
/// These belong to the WLAN layer; the bus only sequences them.
pub trait PowerHandshake {
    /// Wake the chip before touching the bus
    fn chip_wakeup(&self);
    /// Let the chip sleep again
    fn chip_allow_sleep(&self);
    /// Tell the firmware the host is going to sleep
    fn host_sleep_notify(&self);
    /// Tell the firmware the host is awake
    fn host_wakeup_notify(&self);
}

/// Power handshake that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPowerHandshake;

impl PowerHandshake for NoPowerHandshake {
    fn chip_wakeup(&self) {}
    fn chip_allow_sleep(&self) {}
    fn host_sleep_notify(&self) {}
    fn host_wakeup_notify(&self) {}
}

/// Information about a transport
#[derive(Debug, Clone)]
pub struct TransportInfo {
    /// Name of the transport
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Description
    pub description: &'static str,
}
