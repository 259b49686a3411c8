//! Write command implementation

use crate::commands::{byte_progress, spinner, verify, CHUNK_SIZE};
use crate::session::{Session, SessionError};
use f25loader_core::flash::Misalignment;
use std::fs;
use std::path::Path;

/// Run the write command
pub fn run_write(
    session: &mut Session,
    address: u32,
    input: &Path,
    erase: bool,
    verify_after: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input).map_err(|e| SessionError::io(input, e))?;
    println!("Read {} bytes from {:?}", data.len(), input);

    let device = session.device()?;
    let offset = session.loader.config().mask(address);
    if offset as u64 + data.len() as u64 > device.size() as u64 {
        return Err(format!(
            "Write of {} bytes at 0x{:08X} exceeds chip size ({} bytes)",
            data.len(),
            address,
            device.size()
        )
        .into());
    }
    if data.is_empty() {
        println!("Nothing to write");
        return Ok(());
    }

    if erase {
        let end = address.wrapping_add(data.len() as u32 - 1);
        let pb = spinner(format!("Erasing 0x{:08X}..=0x{:08X}", address, end))?;
        let sectors = session.loader.sector_erase(address, end)?;
        pb.finish_with_message(format!("Erased {} sector(s)", sectors));
    }

    let pb = byte_progress(data.len() as u64, "Writing")?;
    let mut written = 0usize;
    for chunk in data.chunks(CHUNK_SIZE) {
        session
            .loader
            .write(address.wrapping_add(written as u32), chunk)?;
        written += chunk.len();
        pb.set_position(written as u64);
    }
    pb.finish_with_message("Write complete");

    session.save()?;

    if verify_after {
        let checksum = verify::verify_data(session, address, &data, Misalignment::NONE)?;
        println!("Verification passed (checksum 0x{:08X})", checksum);
    }

    println!("Wrote {} bytes at 0x{:08X}", data.len(), address);
    Ok(())
}
