//! Checksum command implementation

use crate::session::Session;

/// Print the loader checksum of `length` bytes at `address`
pub fn run_checksum(
    session: &mut Session,
    address: u32,
    length: u32,
    init: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let checksum = session.loader.checksum(address, length, init)?;
    println!(
        "Checksum 0x{:08X}+0x{:X}: 0x{:08X}",
        address, length, checksum
    );
    Ok(())
}
