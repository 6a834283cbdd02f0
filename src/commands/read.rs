//! Read command implementation

use std::fs::File;
use std::io::Write;
use std::path::Path;

use wilchif_core::host::HostInterface;
use wilchif_sdio::align_word;

use super::{chunk_addr, open_ready, progress_bar, CHUNK_SIZE};

/// Read `len` bytes of chip memory at `addr` into `output`
pub fn run_read(
    transport: &str,
    addr: u32,
    len: u32,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let bus = open_ready(transport)?;
    let data = read_with_progress(&bus, addr, len as usize)?;

    let mut file = File::create(output)?;
    file.write_all(&data)?;

    println!("Wrote {} bytes to {:?}", data.len(), output);
    Ok(())
}

/// Read memory in chunks with a progress bar
pub fn read_with_progress(
    hif: &dyn HostInterface,
    addr: u32,
    len: usize,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut data = Vec::with_capacity(len);
    let mut chunk = vec![0u8; CHUNK_SIZE];

    let pb = progress_bar(len as u64, "Reading");
    while data.len() < len {
        let chunk_len = std::cmp::min(CHUNK_SIZE, len - data.len());
        // Transfers move whole words
        let buf = &mut chunk[..align_word(chunk_len as u32) as usize];
        hif.block_read(chunk_addr(addr, data.len()), buf, chunk_len as u32)?;

        data.extend_from_slice(&buf[..chunk_len]);
        pb.set_position(data.len() as u64);
    }

    pb.finish_with_message("Read complete");
    Ok(data)
}
