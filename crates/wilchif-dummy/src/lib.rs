//! wilchif-dummy - In-memory WILC SDIO device emulator
//!
//! This crate provides an [`SdioHost`](wilchif_core::host::SdioHost) whose
//! card is a software model of a WILC1000/WILC3000. It is useful for testing
//! the host interface and for trying the CLI without hardware.
//!
//! The model covers what the bus layer touches:
//!
//! - CCCR/FBR registers, including I/O enable/ready and block sizes
//! - the indirect window (`0x10C..=0x10F`) onto a sparse chip memory
//! - the function 1 data port as a loopback FIFO
//! - interrupt flag, acknowledge and VMM registers of both variants
//!
//! Every transaction is recorded in a trace so tests can assert on the
//! exact command sequence, and failures can be injected at any point.
//!
//! # Example
//!
//! ```
//! use wilchif_core::chip::ChipVariant;
//! use wilchif_core::host::SdioHost;
//! use wilchif_core::sdio::Cmd52;
//! use wilchif_dummy::{DummyConfig, DummySdio};
//!
//! let mut card = DummySdio::new(DummyConfig::for_variant(ChipVariant::Wilc1000));
//! let mut cmd = Cmd52::write_raw(0, 0x100, 0x80);
//! card.cmd52(&mut cmd).unwrap();
//! assert_eq!(cmd.data, 0x80);
//! ```

pub mod device;
pub mod error;

pub use device::{parse_options, DummyConfig, DummySdio, Transaction};
pub use error::{DummyError, Result};
