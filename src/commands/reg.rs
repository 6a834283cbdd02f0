//! Register read/write commands

use wilchif_core::host::HostInterface;

use super::open_ready;

/// Read and print one 32-bit register
pub fn run_read_reg(transport: &str, addr: u32) -> Result<(), Box<dyn std::error::Error>> {
    let bus = open_ready(transport)?;
    let value = bus.read_reg(addr)?;
    println!("0x{:08x}: 0x{:08x}", addr, value);
    Ok(())
}

/// Write one 32-bit register
pub fn run_write_reg(
    transport: &str,
    addr: u32,
    value: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let bus = open_ready(transport)?;
    bus.write_reg(addr, value)?;
    log::info!("Wrote 0x{:08x} to 0x{:08x}", value, addr);
    Ok(())
}
