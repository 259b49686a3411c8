//! Probe command implementation

use crate::commands::format_size;
use crate::session::Session;

/// Show the identified chip and bus parameters
pub fn run_probe(session: &Session) -> Result<(), Box<dyn std::error::Error>> {
    let device = session.device()?;
    let ctx = session.loader.context();
    let config = session.loader.config();

    println!("Found flash chip:");
    println!("  Type:     {}", device.type_name);
    println!(
        "  Size:     {} bytes ({})",
        device.size(),
        format_size(device.size())
    );
    println!("  Pages:    {}", device.pages);
    println!("  Sectors:  {}", device.sectors);
    println!(
        "  JEDEC ID: {:02X} {:04X}",
        device.manufacturer(),
        device.device()
    );
    println!(
        "  SPI clock: {} Hz (bus {} Hz / {})",
        ctx.divider().clock_hz(config.bus_clock_hz),
        config.bus_clock_hz,
        ctx.divider().divisor()
    );
    Ok(())
}
