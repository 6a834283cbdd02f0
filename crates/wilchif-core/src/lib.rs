//! wilchif-core - Core library for the WILC host interface
//!
//! This crate provides the types shared by every host-interface (HIF)
//! transport for WILC1000/WILC3000 WiFi chips. It is designed to be
//! `no_std` compatible so the same definitions can be used by embedded
//! hosts.
//!
//! # Features
//!
//! - `std` - Implement `std::error::Error` for the core error type (includes `alloc`)
//! - `alloc` - Allow boxed `SdioHost` trait objects
//!
//! # Layers
//!
//! - [`host::SdioHost`] - the downward contract: one CMD52 or CMD53 at a time
//! - [`host::HostInterface`] - the upward contract used by the WLAN stack,
//!   implemented once per physical transport
//!
//! # Example
//!
//! ```ignore
//! use wilchif_core::host::HostInterface;
//!
//! fn chip_id(hif: &dyn HostInterface) -> wilchif_core::Result<u32> {
//!     hif.init(false)?;
//!     hif.read_reg(wilchif_core::chip::regs::CHIPID)
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod chip;
pub mod config;
pub mod error;
pub mod host;
pub mod irq;
pub mod sdio;

pub use error::{Error, ErrorKind, Result};
