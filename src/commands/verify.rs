//! Verify command implementation

use crate::commands::spinner;
use crate::session::{Session, SessionError};
use f25loader_core::flash::Misalignment;
use std::fs;
use std::path::Path;

/// Run the verify command
pub fn run_verify(
    session: &mut Session,
    address: u32,
    input: &Path,
    leading: u8,
    trailing: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let expected = fs::read(input).map_err(|e| SessionError::io(input, e))?;
    println!("Read {} bytes from {:?}", expected.len(), input);

    let checksum = verify_data(
        session,
        address,
        &expected,
        Misalignment::new(leading, trailing),
    )?;
    println!("Verification passed (checksum 0x{:08X})", checksum);
    Ok(())
}

/// Verify `data` at `address` through the loader's word-based entry point
///
/// The buffer is padded to a whole word with the bytes already in flash,
/// and the padding is excluded from the checksum. Returns the checksum.
pub fn verify_data(
    session: &mut Session,
    address: u32,
    data: &[u8],
    misalignment: Misalignment,
) -> Result<u32, Box<dyn std::error::Error>> {
    let pad = (4 - data.len() % 4) % 4;
    let mut ram = data.to_vec();
    if pad > 0 {
        let mut tail = [0u8; 3];
        session
            .loader
            .read(address.wrapping_add(data.len() as u32), &mut tail[..pad])?;
        ram.extend_from_slice(&tail[..pad]);
    }

    // The word padding must stay out of the checksum, so it has to fit the
    // 4-bit trailing skip together with the requested one
    let trailing = misalignment.trailing() as usize + pad;
    if trailing > 0xF {
        return Err(SessionError::SkipTooLarge { trailing }.into());
    }
    let misalignment = Misalignment::new(misalignment.leading() as u8, trailing as u8);
    let size_words = (ram.len() / 4) as u32;

    let pb = spinner(format!("Verifying {} bytes at 0x{:08X}", data.len(), address))?;
    let combined = session
        .loader
        .verify(address, &ram, size_words, misalignment)?;
    let checksum = (combined >> 32) as u32;
    let mismatch = combined as u32;

    if mismatch != 0 {
        pb.abandon_with_message("Verification failed!");
        return Err(SessionError::VerifyMismatch { address: mismatch }.into());
    }

    pb.finish_with_message("Verification passed");
    Ok(checksum)
}
