//! CLI command implementations
//!
//! Each command runs against an initialized [`Session`](crate::session::Session)
//! and goes through the same loader entry points a host programming tool
//! would call.

mod checksum;
mod erase;
mod list;
mod probe;
mod read;
mod storage_info;
mod verify;
mod write;

pub use checksum::run_checksum;
pub use erase::{run_erase, run_mass_erase};
pub use list::list_chips;
pub use probe::run_probe;
pub use read::run_read;
pub use storage_info::run_storage_info;
pub use verify::run_verify;
pub use write::run_write;

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Chunk size for progress-reported reads and writes (one sector)
const CHUNK_SIZE: usize = 4096;

/// Byte progress bar with an operation label
fn byte_progress(total: u64, label: &str) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{bytes}}/{{total_bytes}} ({{bytes_per_sec}}, {{eta}}) {}",
                label
            ))?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Spinner for single long-running loader calls
fn spinner(message: String) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

pub(crate) fn format_size(bytes: u32) -> String {
    if bytes >= 1024 * 1024 {
        format!("{} MiB", bytes / (1024 * 1024))
    } else if bytes >= 1024 {
        format!("{} KiB", bytes / 1024)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(16 * 1024 * 1024), "16 MiB");
        assert_eq!(format_size(128 * 1024), "128 KiB");
        assert_eq!(format_size(100), "100 B");
    }
}
