//! f25loader - Host-side driver for the 25-series SPI flash external loader
//!
//! Runs the loader entry points (initialize, read, write, erase, checksum,
//! verify) against an emulated chip whose contents persist in an image
//! file, and prints the device record the host programming tool would read.

mod cli;
mod commands;
mod session;

use clap::Parser;
use cli::{Cli, Commands};
use session::{load_table, Session};

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

    let table = match load_table(cli.chip_db.as_deref()) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    if let Commands::ListChips = cli.command {
        commands::list_chips(table);
        return Ok(());
    }

    let mut session = Session::open(table, cli.jedec_id, cli.image.as_deref())?;

    match cli.command {
        Commands::Probe => commands::run_probe(&session),
        Commands::Read {
            address,
            length,
            output,
        } => commands::run_read(&mut session, address, length, &output),
        Commands::Write {
            address,
            input,
            erase,
            verify,
        } => commands::run_write(&mut session, address, &input, erase, verify),
        Commands::Erase {
            start: Some(start),
            end: Some(end),
            mass: false,
        } => commands::run_erase(&mut session, start, end),
        Commands::Erase { .. } => commands::run_mass_erase(&mut session),
        Commands::Checksum {
            address,
            length,
            init,
        } => commands::run_checksum(&mut session, address, length, init),
        Commands::Verify {
            address,
            input,
            leading,
            trailing,
        } => commands::run_verify(&mut session, address, &input, leading, trailing),
        Commands::StorageInfo { name, output } => {
            commands::run_storage_info(&session, name.as_deref(), output.as_deref())
        }
        Commands::ListChips => Ok(()),
    }
}
