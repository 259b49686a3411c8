//! Loader session against the emulated chip
//!
//! Builds the descriptor table, brings up a [`Loader`] on a [`DummyFlash`]
//! and persists the flash contents to an image file between runs.

use f25loader_core::chip::{find_by_id, DatabaseError, DescriptorDatabase, DeviceDescriptor};
use f25loader_core::loader::{Loader, LoaderConfig};
use f25loader_dummy::{DummyConfig, DummyFlash};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Errors raised by the CLI outside the flash layer
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Image or output file could not be accessed
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Descriptor file could not be loaded
    #[error("failed to load chip database: {0}")]
    Database(#[from] DatabaseError),
    /// Flash operation failed
    #[error("flash operation failed: {0}")]
    Flash(#[from] f25loader_core::Error),
    /// Image file is larger than the emulated device
    #[error("image is {image} bytes but the device holds {device}")]
    ImageTooLarge { image: usize, device: usize },
    /// Trailing skip plus word padding does not fit the 4-bit field
    #[error("trailing skip of {trailing} bytes (including word padding) exceeds 15")]
    SkipTooLarge { trailing: usize },
    /// Verification found a differing byte
    #[error("verify failed at 0x{address:08X}")]
    VerifyMismatch { address: u32 },
}

impl SessionError {
    pub fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Emulated device size when the identification code is unknown
const FALLBACK_SIZE: usize = 16 * 1024 * 1024;

/// Build the descriptor table: built-in devices, then `chip_db` entries
pub fn load_table(chip_db: Option<&Path>) -> Result<&'static [DeviceDescriptor], SessionError> {
    let mut db = DescriptorDatabase::with_builtin();
    if let Some(path) = chip_db {
        db.load_file(path)?;
    }
    log::debug!("Loaded {} device descriptors", db.len());
    Ok(db.into_static())
}

/// An initialized loader plus where its contents persist
pub struct Session {
    pub loader: Loader<DummyFlash>,
    image: Option<PathBuf>,
}

impl Session {
    /// Create the emulated chip and run loader bring-up on it
    pub fn open(
        table: &'static [DeviceDescriptor],
        jedec_id: u32,
        image: Option<&Path>,
    ) -> Result<Self, SessionError> {
        let size = find_by_id(table, jedec_id).map_or(FALLBACK_SIZE, |d| d.size() as usize);
        let config = DummyConfig {
            jedec_id,
            size,
            ..DummyConfig::default()
        };

        let flash = match image {
            Some(path) if path.exists() => {
                let data = fs::read(path).map_err(|e| SessionError::io(path, e))?;
                if data.len() > size {
                    return Err(SessionError::ImageTooLarge {
                        image: data.len(),
                        device: size,
                    });
                }
                log::debug!("Loaded {} bytes from {}", data.len(), path.display());
                DummyFlash::with_data(config, &data)
            }
            _ => DummyFlash::new(config),
        };

        let loader_config = LoaderConfig {
            table,
            ..LoaderConfig::default()
        };
        let mut loader = Loader::new(flash, loader_config);
        loader.initialize()?;

        Ok(Self {
            loader,
            image: image.map(Path::to_path_buf),
        })
    }

    /// The identified device
    pub fn device(&self) -> Result<DeviceDescriptor, SessionError> {
        Ok(*self.loader.context().require_device()?)
    }

    /// Write the flash contents back to the image file, if any
    pub fn save(&self) -> Result<(), SessionError> {
        if let Some(path) = &self.image {
            fs::write(path, self.loader.context().bus().data())
                .map_err(|e| SessionError::io(path, e))?;
            log::debug!("Saved flash image to {}", path.display());
        }
        Ok(())
    }
}
