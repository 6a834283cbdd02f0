//! wilchif - WILC1000/WILC3000 SDIO host interface tool
//!
//! Drives the SDIO bus layer of a WILC WiFi chip from the command line:
//! negotiate the bus, poke registers, move chip memory to and from files,
//! and inspect interrupt status.
//!
//! # Architecture
//!
//! A transport string (`dummy:chip=wilc3000,irq=gpio`) selects an SDIO host
//! and bus options. The host is wrapped in `wilchif_sdio::SdioBus`, and every
//! command talks to it only through `HostInterface`, the same interface a
//! WLAN stack would use.

mod cli;
mod commands;
mod transports;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    match cli.command {
        Commands::Probe { transport } => commands::run_probe(&transport),
        Commands::ReadReg { transport, addr } => commands::run_read_reg(&transport, addr),
        Commands::WriteReg {
            transport,
            addr,
            value,
        } => commands::run_write_reg(&transport, addr, value),
        Commands::Read {
            transport,
            addr,
            len,
            output,
        } => commands::run_read(&transport, addr, len, &output),
        Commands::Write {
            transport,
            addr,
            input,
        } => commands::run_write(&transport, addr, &input),
        Commands::Irq { transport, lines } => commands::run_irq(&transport, lines),
        Commands::Reset { transport } => commands::run_reset(&transport),
        Commands::ListTransports => {
            commands::list_transports();
            Ok(())
        }
    }
}
