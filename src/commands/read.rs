//! Read command implementation

use crate::commands::{byte_progress, CHUNK_SIZE};
use crate::session::{Session, SessionError};
use std::fs;
use std::path::Path;

/// Run the read command
pub fn run_read(
    session: &mut Session,
    address: u32,
    length: Option<u32>,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let device = session.device()?;
    let length = length.unwrap_or(device.size()) as usize;

    let data = read_with_progress(session, address, length)?;
    fs::write(output, &data).map_err(|e| SessionError::io(output, e))?;

    println!("Wrote {} bytes to {:?}", data.len(), output);
    Ok(())
}

/// Read `length` bytes from host address `address` with a progress bar
pub fn read_with_progress(
    session: &mut Session,
    address: u32,
    length: usize,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut data = vec![0u8; length];
    let pb = byte_progress(length as u64, "Reading")?;

    let mut offset = 0usize;
    for chunk in data.chunks_mut(CHUNK_SIZE) {
        session
            .loader
            .read(address.wrapping_add(offset as u32), chunk)?;
        offset += chunk.len();
        pb.set_position(offset as u64);
    }

    pb.finish_with_message("Read complete");
    Ok(data)
}
