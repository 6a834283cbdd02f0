//! wilchif-sdio - SDIO host interface for WILC1000/WILC3000
//!
//! This crate turns the generic [`HostInterface`] requests of a WLAN stack
//! into CMD52/CMD53 transactions on any [`SdioHost`].
//!
//! # Layers
//!
//! - command encoding: one bus-exclusive transaction per call
//! - indirect window: reaches chip memory beyond the 17-bit SDIO address
//! - block transfers: block-mode phase plus a byte-mode remainder
//! - interrupt status and acknowledge, per chip variant
//! - bus lifecycle: negotiation, reset, suspend/resume
//! - interrupt delivery gate: serializes the IRQ callback against
//!   enable/disable
//!
//! # Example
//!
//! ```
//! use wilchif_core::config::BusConfig;
//! use wilchif_core::host::HostInterface;
//! use wilchif_dummy::DummySdio;
//! use wilchif_sdio::SdioBus;
//!
//! let bus = SdioBus::new(DummySdio::new_default(), BusConfig::default());
//! bus.init(false).unwrap();
//! assert!(bus.is_initialized());
//!
//! bus.write_reg(0x30000, 0xdead_beef).unwrap();
//! assert_eq!(bus.read_reg(0x30000).unwrap(), 0xdead_beef);
//! ```
//!
//! [`HostInterface`]: wilchif_core::host::HostInterface
//! [`SdioHost`]: wilchif_core::host::SdioHost

mod bus;
mod cmd;
mod interrupt;
pub mod irq_lock;
mod lifecycle;
pub mod transfer;
mod window;

pub use bus::{BusState, IrqOutcome, SdioBus};
pub use irq_lock::{IrqGate, IrqGateState};
pub use lifecycle::LinkState;
pub use transfer::{align_word, TransferPlan};
