//! Erase command implementation

use crate::commands::spinner;
use crate::session::Session;

/// Erase every sector touching the inclusive range `[start, end]`
pub fn run_erase(
    session: &mut Session,
    start: u32,
    end: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    if end < start {
        return Err(format!("End 0x{:08X} lies before start 0x{:08X}", end, start).into());
    }

    let pb = spinner(format!("Erasing 0x{:08X}..=0x{:08X}", start, end))?;
    let sectors = session.loader.sector_erase(start, end)?;
    pb.finish_with_message(format!("Erased {} sector(s)", sectors));

    session.save()?;
    Ok(())
}

/// Erase the entire chip
pub fn run_mass_erase(session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
    let size = session.device()?.size();

    let pb = spinner(format!("Erasing {} bytes (this may take a while)...", size))?;
    session.loader.mass_erase()?;
    pb.finish_with_message(format!("Erased {} bytes", size));

    session.save()?;
    Ok(())
}
