//! Probe command implementation

use wilchif_core::chip::regs;
use wilchif_core::host::HostInterface;

use super::open_ready;
use crate::transports;

/// Negotiate the bus and print what was found
pub fn run_probe(transport: &str) -> Result<(), Box<dyn std::error::Error>> {
    let bus = open_ready(transport)?;
    let state = bus.state();
    let chip_id = bus.read_reg(regs::CHIPID)?;

    println!("Found WILC device:");
    match state.variant {
        Some(variant) => println!("  Chip:       {}", variant),
        None => println!("  Chip:       unknown"),
    }
    println!("  Chip ID:    0x{:08x}", chip_id);
    println!("  Block size: {} bytes", state.block_size);
    println!("  Interrupts: {:?}", state.irq_mode);
    if let Some(hz) = bus.with_host(|host| host.clock_hz()) {
        println!("  Bus clock:  {} kHz", hz / 1000);
    }

    bus.deinit()?;
    Ok(())
}

/// Send the reset request
///
/// The bus is not negotiated first; the request goes out as a raw CMD52.
pub fn run_reset(transport: &str) -> Result<(), Box<dyn std::error::Error>> {
    let bus = transports::open_transport(transport)?;
    bus.reset()?;
    println!("Reset request sent");
    Ok(())
}
