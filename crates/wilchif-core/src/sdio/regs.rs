//! Function 0 register offsets reachable with a single CMD52
//!
//! Offsets below 0x100 are the card common control registers (CCCR) plus
//! the WILC-specific direct registers at 0xF0..=0xFF. Offsets from 0x100
//! are function basic registers (FBR) of the card.

/// I/O enable (CCCR)
pub const CCCR_IO_ENABLE: u32 = 0x02;
/// I/O ready (CCCR)
pub const CCCR_IO_READY: u32 = 0x03;
/// Interrupt enable (CCCR)
pub const CCCR_INT_ENABLE: u32 = 0x04;
/// I/O abort; writing [`RESET_REQUEST`] resets the card (CCCR)
pub const CCCR_IO_ABORT: u32 = 0x06;

/// Function 1 bit in IOE/IOR
pub const IO_FUNC1: u8 = 0x02;
/// Master enable plus function 1 in IEN
pub const INT_ENABLE_FUNC1: u8 = 0x03;
/// RES bit in the abort register
pub const RESET_REQUEST: u8 = 0x08;

/// Function 0 block size, low byte
pub const FUNC0_BLOCK_SIZE_LO: u32 = 0x10;
/// Function 0 block size, high byte
pub const FUNC0_BLOCK_SIZE_HI: u32 = 0x11;
/// Function 1 block size, low byte
pub const FUNC1_BLOCK_SIZE_LO: u32 = 0x110;
/// Function 1 block size, high byte
pub const FUNC1_BLOCK_SIZE_HI: u32 = 0x111;

/// Code storage area (indirect window) control
pub const CSA_CONTROL: u32 = 0x100;
/// Enable bit in [`CSA_CONTROL`]
pub const CSA_ENABLE: u8 = 0x80;
/// Window address bits 7..0
pub const CSA_ADDR_0: u32 = 0x10C;
/// Window address bits 15..8
pub const CSA_ADDR_1: u32 = 0x10D;
/// Window address bits 23..16
pub const CSA_ADDR_2: u32 = 0x10E;
/// Window data port; CMD53 here reaches the programmed address
pub const CSA_DATA: u32 = 0x10F;
/// Highest address the window can reach
pub const CSA_ADDR_MAX: u32 = 0x00FF_FFFF;

/// First register of the directly accessible range
pub const DIRECT_FIRST: u32 = 0xF0;
/// Last register of the directly accessible range
pub const DIRECT_LAST: u32 = 0xFF;

/// WILC3000 VMM control (function 0)
pub const WILC3000_VMM_CTL: u32 = 0xF1;
/// Pending DMA count in words, bits 7..0 (function 0)
pub const DMA_COUNT_LO: u32 = 0xF2;
/// Pending DMA count in words, bits 15..8 (function 0)
pub const DMA_COUNT_HI: u32 = 0xF3;
/// WILC1000 GPIO interrupt flags (function 1)
pub const WILC1000_IRQ_FLAGS: u32 = 0xF7;
/// WILC1000 interrupt clear and VMM control (function 0)
pub const WILC1000_VMM_CTL: u32 = 0xF8;
/// WILC3000 GPIO interrupt flags, read on function 1, cleared on function 0
pub const WILC3000_IRQ_FLAGS: u32 = 0xFE;

/// Function 1 interrupt status register (status-register mode)
pub const FUNC1_INT_STATUS: u32 = 0x04;

/// Returns true if `addr` is served by a direct CMD52
pub const fn is_direct(addr: u32) -> bool {
    addr >= DIRECT_FIRST && addr <= DIRECT_LAST
}
