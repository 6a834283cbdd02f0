//! SDIO command types and card register offsets

mod command;
pub mod regs;

pub use command::{Cmd52, Cmd53, Cmd53Data, Direction};

/// Function 0: card common control registers and the indirect window
pub const FUNC0: u8 = 0;
/// Function 1: WLAN data function
pub const FUNC1: u8 = 1;

/// Mask for the 3-bit function field
pub const FUNCTION_MASK: u8 = 0x7;
/// Mask for the 17-bit register address field
pub const ADDRESS_MASK: u32 = 0x1_FFFF;
/// Largest value of the 9-bit CMD53 count field
pub const CMD53_MAX_COUNT: u16 = 0x1FF;

/// SDIO vendor ID of WILC devices
pub const SDIO_VENDOR_ID_WILC: u16 = 0x0296;
/// SDIO device ID of WILC devices
pub const SDIO_DEVICE_ID_WILC: u16 = 0x5347;
