//! List commands implementation

use crate::commands::format_size;
use f25loader_core::chip::DeviceDescriptor;

/// List all devices the loader can identify
pub fn list_chips(table: &[DeviceDescriptor]) {
    println!("Supported flash chips:");
    println!();
    println!(
        "{:<20} {:>10} {:>8} {:>8} {:>10}",
        "Type", "Size", "Pages", "Sectors", "JEDEC ID"
    );
    println!("{}", "-".repeat(60));

    for device in table {
        let jedec_str = format!("{:02X} {:04X}", device.manufacturer(), device.device());
        println!(
            "{:<20} {:>10} {:>8} {:>8} {:>10}",
            device.type_name,
            format_size(device.size()),
            device.pages,
            device.sectors,
            jedec_str
        );
    }
}
