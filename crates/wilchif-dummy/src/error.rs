//! Error types for dummy device options

use thiserror::Error;

/// Errors raised while configuring the emulated device
#[derive(Debug, Error)]
pub enum DummyError {
    /// Chip name or identifier not understood
    #[error("Unknown chip '{0}' (expected wilc1000, wilc3000 or a hex chip id)")]
    UnknownChip(String),

    /// Option value failed to parse
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    /// Option key not recognised
    #[error("Unknown option: {0}")]
    UnknownOption(String),
}

/// Result type for dummy device configuration
pub type Result<T> = std::result::Result<T, DummyError>;
