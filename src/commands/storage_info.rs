//! Storage info command implementation

use crate::session::{Session, SessionError};
use f25loader_core::loader::StorageInfo;
use std::fs;
use std::path::Path;
use zerocopy::IntoBytes;

/// Show or save the device record for the identified chip
pub fn run_storage_info(
    session: &Session,
    name: Option<&str>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let device = session.device()?;
    let default_name = device.type_name.replace('/', "_");
    let info = session
        .loader
        .storage_info(name.unwrap_or(&default_name))?;
    let record = info.to_record();

    print_info(&info);

    match output {
        Some(path) => {
            fs::write(path, record.as_bytes()).map_err(|e| SessionError::io(path, e))?;
            println!("Wrote {} byte record to {:?}", record.as_bytes().len(), path);
        }
        None => {
            println!();
            print!("{}", hex_dump(record.as_bytes()));
        }
    }
    Ok(())
}

fn print_info(info: &StorageInfo) {
    println!("Device name:   {}", info.name());
    println!("Device type:   {:?}", info.device_class);
    println!("Start address: 0x{:08X}", info.start_address);
    println!("Size:          0x{:08X}", info.size);
    println!("Page size:     {}", info.page_size);
    println!("Erase value:   0x{:02X}", info.erase_value);
    for group in info.sectors() {
        println!("Sectors:       {} x {} bytes", group.count, group.size);
    }
}

/// Offset-prefixed hex dump, 16 bytes per line
fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::new();
    for (row, line) in bytes.chunks(16).enumerate() {
        let hex: Vec<String> = line.iter().map(|b| format!("{:02X}", b)).collect();
        out.push_str(&format!("{:04X}: {}\n", row * 16, hex.join(" ")));
    }
    out
}
