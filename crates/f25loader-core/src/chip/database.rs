//! Descriptor database for runtime loading
//!
//! Extends the built-in [`KNOWN_DEVICES`](super::KNOWN_DEVICES) table with
//! devices described in RON files:
//!
//! ```ron
//! [
//!     (id: 0xEF4017, pages: 32768, sectors: 2048, name: "W25Q64/64Mb"),
//! ]
//! ```

use alloc::{boxed::Box, format, string::String, vec::Vec};
use std::fs;
use std::io;
use std::path::Path;

use super::table::KNOWN_DEVICES;
use super::types::{DeviceDescriptor, MAX_DEVICE_SIZE, PAGES_PER_SECTOR, PAGE_SIZE};

/// Error type for descriptor database operations
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// I/O error reading files
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// RON parsing error
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// One descriptor entry (RON format)
#[derive(Debug, Clone, serde::Deserialize)]
struct DescriptorDef {
    id: u32,
    pages: u32,
    sectors: u32,
    name: String,
}

impl DescriptorDef {
    fn validate(&self) -> Result<(), DatabaseError> {
        if self.id > 0xFF_FFFF {
            return Err(DatabaseError::Validation(format!(
                "{}: identification code 0x{:X} is wider than 24 bits",
                self.name, self.id
            )));
        }
        if self.sectors == 0 || self.pages == 0 {
            return Err(DatabaseError::Validation(format!(
                "{}: page and sector counts must be non-zero",
                self.name
            )));
        }
        if self.sectors.checked_mul(PAGES_PER_SECTOR) != Some(self.pages) {
            return Err(DatabaseError::Validation(format!(
                "{}: {} sectors do not hold {} pages",
                self.name, self.sectors, self.pages
            )));
        }
        match self.pages.checked_mul(PAGE_SIZE) {
            Some(size) if size <= MAX_DEVICE_SIZE => {}
            _ => {
                return Err(DatabaseError::Validation(format!(
                    "{}: {} pages exceed the 16 MiB reachable with 3-byte addresses",
                    self.name, self.pages
                )))
            }
        }
        Ok(())
    }

    fn into_descriptor(self) -> DeviceDescriptor {
        // Descriptors live for the rest of the program, like the built-in table.
        let type_name: &'static str = Box::leak(self.name.into_boxed_str());
        DeviceDescriptor::new(self.id, self.pages, self.sectors, type_name)
    }
}

/// Descriptor table assembled at runtime
#[derive(Debug, Clone)]
pub struct DescriptorDatabase {
    devices: Vec<DeviceDescriptor>,
}

impl DescriptorDatabase {
    /// Create an empty database
    pub fn new() -> Self {
        Self {
            devices: Vec::new(),
        }
    }

    /// Create a database seeded with the built-in table
    pub fn with_builtin() -> Self {
        Self {
            devices: KNOWN_DEVICES.to_vec(),
        }
    }

    /// Parse descriptors from a RON string, returning how many were added
    ///
    /// Entries are appended after existing ones, so built-in descriptors win
    /// on duplicate codes.
    pub fn load_str(&mut self, source: &str) -> Result<usize, DatabaseError> {
        let defs: Vec<DescriptorDef> = ron::from_str(source)?;
        for def in &defs {
            def.validate()?;
        }
        let count = defs.len();
        for def in defs {
            if self.devices.iter().any(|d| d.id == def.id) {
                log::warn!(
                    "Duplicate identification code 0x{:06X} ({}), first entry wins",
                    def.id,
                    def.name
                );
            }
            self.devices.push(def.into_descriptor());
        }
        Ok(count)
    }

    /// Load descriptors from a RON file
    pub fn load_file(&mut self, path: &Path) -> Result<usize, DatabaseError> {
        let source = fs::read_to_string(path)?;
        let count = self.load_str(&source)?;
        log::debug!("Loaded {} descriptors from {}", count, path.display());
        Ok(count)
    }

    /// Number of descriptors
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Whether the database is empty
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// The descriptors, in match order
    pub fn devices(&self) -> &[DeviceDescriptor] {
        &self.devices
    }

    /// Turn the database into a table usable for the rest of the program
    pub fn into_static(self) -> &'static [DeviceDescriptor] {
        self.devices.leak()
    }
}

impl Default for DescriptorDatabase {
    fn default() -> Self {
        Self::with_builtin()
    }
}
