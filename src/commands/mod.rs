//! CLI command implementations
//!
//! Every command opens a transport, negotiates the bus where needed and
//! drives it through the `HostInterface` the WLAN stack would use.

mod irq;
mod list;
mod probe;
mod read;
mod reg;
mod write;

use indicatif::{ProgressBar, ProgressStyle};
use wilchif_core::host::HostInterface;

use crate::transports::{self, Bus};

pub use irq::run_irq;
pub use list::list_transports;
pub use probe::{run_probe, run_reset};
pub use read::run_read;
pub use reg::{run_read_reg, run_write_reg};
pub use write::run_write;

/// Chunk size for memory transfers (4 KiB)
const CHUNK_SIZE: usize = 4096;

/// Open a transport and negotiate the bus
fn open_ready(transport: &str) -> Result<Bus, Box<dyn std::error::Error>> {
    let bus = transports::open_transport(transport)?;
    bus.init(false)?;
    Ok(bus)
}

/// Address of the chunk starting `offset` bytes into a transfer
///
/// Address 0 is a FIFO and does not advance.
fn chunk_addr(base: u32, offset: usize) -> u32 {
    if base == 0 {
        0
    } else {
        base.wrapping_add(offset as u32)
    }
}

/// Byte-count progress bar
fn progress_bar(total: u64, phase: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{bytes}}/{{total_bytes}} ({{bytes_per_sec}}, {{eta}}) {}",
                phase
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_addr() {
        assert_eq!(chunk_addr(0, 4096), 0);
        assert_eq!(chunk_addr(0x30000, 0), 0x30000);
        assert_eq!(chunk_addr(0x30000, 8192), 0x32000);
    }
}
