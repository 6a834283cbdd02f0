//! List command implementation

use crate::transports;

/// List all available transports
pub fn list_transports() {
    let transports = transports::available_transports();
    if transports.is_empty() {
        println!("No transports compiled in");
        return;
    }

    println!("Available transports:");
    println!();
    for t in &transports {
        if t.aliases.is_empty() {
            println!("  {:<10} - {}", t.name, t.description);
        } else {
            println!(
                "  {:<10} - {} (aliases: {})",
                t.name,
                t.description,
                t.aliases.join(", ")
            );
        }
    }
    println!();
    println!("Options for every transport: irq=gpio|sdio, block_size=<bytes>");
}
