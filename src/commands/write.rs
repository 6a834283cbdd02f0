//! Write command implementation

use std::fs;
use std::path::Path;

use wilchif_core::host::HostInterface;
use wilchif_sdio::align_word;

use super::{chunk_addr, open_ready, progress_bar, CHUNK_SIZE};

/// Write the contents of `input` to chip memory at `addr`
pub fn run_write(
    transport: &str,
    addr: u32,
    input: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;
    if data.is_empty() {
        return Err(format!("{:?} is empty", input).into());
    }

    let bus = open_ready(transport)?;
    write_with_progress(&bus, addr, &data)?;

    println!("Wrote {} bytes to 0x{:08x}", data.len(), addr);
    Ok(())
}

/// Write memory in chunks with a progress bar
///
/// A trailing partial word is padded with zeroes.
pub fn write_with_progress(
    hif: &dyn HostInterface,
    addr: u32,
    data: &[u8],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut padded = [0u8; CHUNK_SIZE];

    let pb = progress_bar(data.len() as u64, "Writing");
    for (i, chunk) in data.chunks(CHUNK_SIZE).enumerate() {
        let buf = &mut padded[..align_word(chunk.len() as u32) as usize];
        buf.fill(0);
        buf[..chunk.len()].copy_from_slice(chunk);

        let offset = i * CHUNK_SIZE;
        hif.block_write(chunk_addr(addr, offset), buf, chunk.len() as u32)?;
        pb.set_position((offset + chunk.len()) as u64);
    }

    pb.finish_with_message("Write complete");
    Ok(())
}
