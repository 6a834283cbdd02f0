//! Interrupt command implementation

use wilchif_core::host::HostInterface;
use wilchif_core::irq::MAX_NUM_INT;

use super::open_ready;

/// Route `lines` interrupt lines and print the decoded status
pub fn run_irq(transport: &str, lines: u32) -> Result<(), Box<dyn std::error::Error>> {
    let bus = open_ready(transport)?;
    bus.sync_interrupts(lines)?;
    bus.enable_interrupts()?;

    let status = bus.read_interrupt_status();
    bus.disable_interrupts();
    let status = status?;

    println!("Interrupt status: 0x{:08x}", status.raw());
    println!("  Pending DMA: {} words", status.dma_words());
    let pending: Vec<String> = (0..MAX_NUM_INT)
        .filter(|&line| status.has_line(line))
        .map(|line| format!("INT_{}", line))
        .collect();
    if pending.is_empty() {
        println!("  Flags:       none");
    } else {
        println!("  Flags:       {}", pending.join(" "));
    }
    Ok(())
}
