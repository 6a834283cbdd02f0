//! Error types for wilchif-core
//!
//! This module provides a no_std compatible error type that is shared by
//! the host-interface traits and every transport implementation.

use core::fmt;

/// Broad class of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The underlying bus transaction failed
    Transport,
    /// The device never produced the expected response
    Protocol,
    /// The request was rejected before touching hardware
    Configuration,
}

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Transport errors
    /// A CMD52 or CMD53 transaction failed
    TransferFailed,
    /// The host could not register the interrupt callback
    IrqClaimFailed,

    // Protocol errors
    /// Function 1 never reported ready during negotiation
    FunctionNotReady,
    /// Chip identifier matches no supported variant
    UnsupportedChip(u32),
    /// Operation needs a negotiated bus (chip variant unknown)
    NotInitialized,

    // Configuration errors
    /// More interrupt lines requested than the hardware routes
    TooManyInterrupts {
        /// Number of lines requested
        requested: u32,
        /// Maximum supported by the hardware
        max: u32,
    },
    /// Provided buffer is smaller than the word-rounded transfer size
    BufferTooSmall,
    /// Transfer needs more blocks than one CMD53 can carry
    TransferTooLarge,
    /// Address does not fit the 24-bit indirect window
    AddressOutOfRange(u32),
}

impl Error {
    /// Classify this error
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::TransferFailed | Self::IrqClaimFailed => ErrorKind::Transport,
            Self::FunctionNotReady | Self::UnsupportedChip(_) | Self::NotInitialized => {
                ErrorKind::Protocol
            }
            Self::TooManyInterrupts { .. }
            | Self::BufferTooSmall
            | Self::TransferTooLarge
            | Self::AddressOutOfRange(_) => ErrorKind::Configuration,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransferFailed => write!(f, "SDIO transfer failed"),
            Self::IrqClaimFailed => write!(f, "can't claim SDIO interrupt"),
            Self::FunctionNotReady => write!(f, "function 1 is not ready"),
            Self::UnsupportedChip(id) => write!(f, "unsupported chip id 0x{:08x}", id),
            Self::NotInitialized => write!(f, "bus not initialized"),
            Self::TooManyInterrupts { requested, max } => {
                write!(f, "too many interrupts: {} (max {})", requested, max)
            }
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::TransferTooLarge => write!(f, "transfer exceeds CMD53 block count"),
            Self::AddressOutOfRange(addr) => {
                write!(f, "address 0x{:08x} is outside the 24-bit window", addr)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
