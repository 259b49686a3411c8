//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Parse a misalignment skip (0..=15 bytes)
fn parse_skip(s: &str) -> Result<u8, String> {
    let value = parse_hex_u32(s)?;
    if value > 0xF {
        return Err(format!("Skip of {} bytes does not fit in 4 bits", value));
    }
    Ok(value as u8)
}

#[derive(Parser)]
#[command(name = "f25loader")]
#[command(author, version, about = "25-series SPI flash external loader", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// RON file with additional device descriptors
    #[arg(long, global = true)]
    pub chip_db: Option<PathBuf>,

    /// Flash image backing the emulated chip (created if missing)
    #[arg(long, global = true)]
    pub image: Option<PathBuf>,

    /// Identification code the emulated chip answers with
    #[arg(long, global = true, value_parser = parse_hex_u32, default_value = "0xEF4018")]
    pub jedec_id: u32,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Identify the flash chip
    Probe,

    /// Read flash contents to file
    Read {
        /// Host start address (hex, e.g., 0x90000000)
        #[arg(short, long, value_parser = parse_hex_u32, default_value = "0x90000000")]
        address: u32,

        /// Number of bytes to read (defaults to the whole device)
        #[arg(short, long, value_parser = parse_hex_u32)]
        length: Option<u32>,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write file to flash
    Write {
        /// Host start address (hex, e.g., 0x90000000)
        #[arg(short, long, value_parser = parse_hex_u32, default_value = "0x90000000")]
        address: u32,

        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Erase the covered sectors before writing
        #[arg(long)]
        erase: bool,

        /// Verify after writing
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        verify: bool,
    },

    /// Erase a sector range or the whole chip
    Erase {
        /// First host address of the range
        #[arg(long, value_parser = parse_hex_u32, required_unless_present = "mass")]
        start: Option<u32>,

        /// Last host address of the range (inclusive)
        #[arg(long, value_parser = parse_hex_u32, required_unless_present = "mass")]
        end: Option<u32>,

        /// Erase the entire chip
        #[arg(long, conflicts_with_all = ["start", "end"])]
        mass: bool,
    },

    /// Compute the loader checksum of a range
    Checksum {
        /// Host start address
        #[arg(short, long, value_parser = parse_hex_u32, default_value = "0x90000000")]
        address: u32,

        /// Number of bytes
        #[arg(short, long, value_parser = parse_hex_u32)]
        length: u32,

        /// Initial accumulator value
        #[arg(long, value_parser = parse_hex_u32, default_value = "0")]
        init: u32,
    },

    /// Verify flash contents against file
    Verify {
        /// Host start address
        #[arg(short, long, value_parser = parse_hex_u32, default_value = "0x90000000")]
        address: u32,

        /// Input file path to verify against
        #[arg(short, long)]
        input: PathBuf,

        /// Leading bytes excluded from the checksum
        #[arg(long, value_parser = parse_skip, default_value = "0")]
        leading: u8,

        /// Trailing bytes excluded from the checksum
        #[arg(long, value_parser = parse_skip, default_value = "0")]
        trailing: u8,
    },

    /// Show the device record published to the host tool
    StorageInfo {
        /// Device name in the record (defaults to the chip type)
        #[arg(long)]
        name: Option<String>,

        /// Write the binary record to a file instead of dumping it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List supported chips
    ListChips,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_parse_hex_u32() {
        assert_eq!(parse_hex_u32("0x90000000"), Ok(0x9000_0000));
        assert_eq!(parse_hex_u32("0XFF"), Ok(0xFF));
        assert_eq!(parse_hex_u32("4096"), Ok(4096));
        assert!(parse_hex_u32("0xZZ").is_err());
    }

    #[test]
    fn test_parse_skip_range() {
        assert_eq!(parse_skip("3"), Ok(3));
        assert!(parse_skip("16").is_err());
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_erase_requires_range_or_mass() {
        assert!(Cli::try_parse_from(["f25loader", "erase"]).is_err());
        assert!(Cli::try_parse_from(["f25loader", "erase", "--mass"]).is_ok());
        assert!(Cli::try_parse_from(["f25loader", "erase", "--mass", "--start", "0"]).is_err());
        let cli = Cli::try_parse_from([
            "f25loader", "erase", "--start", "0x1000", "--end", "0x1FFF",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Erase {
                start: Some(0x1000),
                end: Some(0x1FFF),
                mass: false
            }
        ));
    }
}
