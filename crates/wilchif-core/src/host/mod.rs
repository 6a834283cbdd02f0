//! Host-interface traits
//!
//! This module defines the contracts on both sides of a transport: the
//! bus-level [`SdioHost`] a platform driver provides, and the
//! [`HostInterface`] the WLAN stack consumes.

mod traits;

pub use traits::*;
