//! CLI argument parsing

use crate::transports;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
pub fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Generate dynamic help text for the transport argument
fn transport_help() -> String {
    format!(
        "Transport to use, e.g. dummy:chip=wilc3000,irq=gpio [available: {}]",
        transports::transport_names_short()
    )
}

#[derive(Parser)]
#[command(name = "wilchif")]
#[command(author, version, about = "WILC1000/WILC3000 SDIO host interface tool", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Negotiate the bus and identify the chip
    Probe {
        /// Transport to use
        #[arg(short, long, help = transport_help())]
        transport: String,
    },

    /// Read a 32-bit register
    ReadReg {
        /// Transport to use
        #[arg(short, long, help = transport_help())]
        transport: String,

        /// Register address (hex or decimal)
        #[arg(value_parser = parse_hex_u32)]
        addr: u32,
    },

    /// Write a 32-bit register
    WriteReg {
        /// Transport to use
        #[arg(short, long, help = transport_help())]
        transport: String,

        /// Register address (hex or decimal)
        #[arg(value_parser = parse_hex_u32)]
        addr: u32,

        /// Value to write (hex or decimal)
        #[arg(value_parser = parse_hex_u32)]
        value: u32,
    },

    /// Read chip memory to a file
    Read {
        /// Transport to use
        #[arg(short, long, help = transport_help())]
        transport: String,

        /// Start address (0 reads the function 1 data port)
        #[arg(long, value_parser = parse_hex_u32)]
        addr: u32,

        /// Number of bytes to read
        #[arg(long, value_parser = parse_hex_u32)]
        len: u32,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write a file to chip memory
    Write {
        /// Transport to use
        #[arg(short, long, help = transport_help())]
        transport: String,

        /// Start address (0 writes the function 1 data port)
        #[arg(long, value_parser = parse_hex_u32)]
        addr: u32,

        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Route interrupt lines and show the pending status
    Irq {
        /// Transport to use
        #[arg(short, long, help = transport_help())]
        transport: String,

        /// Number of interrupt lines to route
        #[arg(long, default_value = "1")]
        lines: u32,
    },

    /// Ask the device to reset itself
    Reset {
        /// Transport to use
        #[arg(short, long, help = transport_help())]
        transport: String,
    },

    /// List available transports
    ListTransports,
}
