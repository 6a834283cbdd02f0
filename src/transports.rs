//! Transport registration and dispatch
//!
//! Transports are opened from a string of the form `name[:key=value,...]`.
//! Keys understood by every transport (`irq`, `block_size`) configure the
//! bus layer; the rest go to the transport itself.

use thiserror::Error;
use wilchif_core::config::{BusConfig, IrqMode};
use wilchif_core::host::{SdioHost, TransportInfo};
use wilchif_sdio::SdioBus;

/// Block sizes accepted on the command line
///
/// The lower bound keeps a 4 KiB CLI chunk within one CMD53 block count.
const BLOCK_SIZE_RANGE: core::ops::RangeInclusive<u32> = 16..=2048;

/// Bus over whichever host the transport string selected
pub type Bus = SdioBus<Box<dyn SdioHost + Send>>;

/// Errors raised while opening a transport
#[derive(Debug, Error)]
pub enum TransportError {
    /// No transport with this name is compiled in
    #[error("Unknown transport: {0}\n\nUse 'wilchif list-transports' for details")]
    Unknown(String),

    /// Option is not `key=value`
    #[error("Invalid parameter format: '{0}' (expected key=value)")]
    InvalidParam(String),

    /// Bus option value failed to parse
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    /// The dummy transport rejected its options
    #[cfg(feature = "dummy")]
    #[error("Dummy transport: {0}")]
    Dummy(#[from] wilchif_dummy::DummyError),
}

/// Parsed transport string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportParams {
    /// Transport name
    pub name: String,
    /// Options in the order given
    pub options: Vec<(String, String)>,
}

/// Get information about all available transports (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_transports() -> Vec<TransportInfo> {
    let mut transports = Vec::new();

    #[cfg(feature = "dummy")]
    transports.push(TransportInfo {
        name: "dummy",
        aliases: &["emulator"],
        description: "In-memory WILC emulator (chip=wilc1000|wilc3000|<id>,ready_polls=<n>)",
    });

    transports
}

/// Comma-separated list of transport names for help text
pub fn transport_names_short() -> String {
    let names: Vec<&str> = available_transports().iter().map(|t| t.name).collect();
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

/// Parse a transport string into name and options
///
/// Format: "name" or "name:key1=value1,key2=value2"
pub fn parse_transport_string(s: &str) -> Result<TransportParams, TransportError> {
    let (name, opts) = s.split_once(':').unwrap_or((s, ""));

    let mut options = Vec::new();
    for opt in opts.split(',').filter(|opt| !opt.is_empty()) {
        let (key, value) = opt
            .split_once('=')
            .ok_or_else(|| TransportError::InvalidParam(opt.to_string()))?;
        options.push((key.to_string(), value.to_string()));
    }

    Ok(TransportParams {
        name: name.to_string(),
        options,
    })
}

/// Split bus-layer options from transport-specific ones
#[cfg_attr(not(feature = "dummy"), allow(dead_code))]
fn split_bus_options(
    params: &TransportParams,
) -> Result<(BusConfig, Vec<(&str, &str)>), TransportError> {
    let mut config = BusConfig::default();
    let mut rest = Vec::new();

    for (key, value) in &params.options {
        match key.as_str() {
            "irq" => {
                config.irq_mode = match value.to_ascii_lowercase().as_str() {
                    "gpio" => IrqMode::Gpio,
                    "sdio" => IrqMode::Sdio,
                    _ => {
                        return Err(TransportError::InvalidValue {
                            key: "irq",
                            value: value.clone(),
                        })
                    }
                };
            }
            "block_size" => {
                config.block_size = crate::cli::parse_hex_u32(value)
                    .ok()
                    .filter(|size| BLOCK_SIZE_RANGE.contains(size) && size % 4 == 0)
                    .ok_or_else(|| TransportError::InvalidValue {
                        key: "block_size",
                        value: value.clone(),
                    })?;
            }
            _ => rest.push((key.as_str(), value.as_str())),
        }
    }

    Ok((config, rest))
}

/// Open a transport and attach the bus layer to it
///
/// The bus is returned un-negotiated; callers run `init` themselves.
pub fn open_transport(spec: &str) -> Result<Bus, TransportError> {
    let params = parse_transport_string(spec)?;

    match params.name.as_str() {
        #[cfg(feature = "dummy")]
        "dummy" | "emulator" => open_dummy(&params),

        _ => Err(TransportError::Unknown(params.name.clone())),
    }
}

#[cfg(feature = "dummy")]
fn open_dummy(params: &TransportParams) -> Result<Bus, TransportError> {
    let (config, options) = split_bus_options(params)?;
    let dummy = wilchif_dummy::parse_options(&options)?;
    log::debug!(
        "Opening dummy transport: chip id 0x{:08x}, {:?} interrupts",
        dummy.chip_id,
        config.irq_mode
    );

    let host: Box<dyn SdioHost + Send> = Box::new(wilchif_dummy::DummySdio::new(dummy));
    Ok(SdioBus::new(host, config))
}
