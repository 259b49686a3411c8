//! Error types for f25loader-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.
//!
//! A verification mismatch is deliberately absent: verify reports the
//! failing address as data (see [`crate::flash::VerifyOutcome`]).

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Bus errors
    /// A byte exchange or chip-select transition failed
    SpiTransferFailed,
    /// The bus was used outside a framed transaction
    NoTransaction,

    // Chip errors
    /// Identification code did not match any known device
    ChipNotFound,
    /// Operation requires an identified device
    ChipNotSupported,

    // Operation errors
    /// The busy-wait strategy gave up before write-in-progress cleared
    Timeout,

    // Address/size errors
    /// Size is not a multiple of the required granularity
    InvalidAlignment,
    /// Provided buffer is too small for the operation
    BufferTooSmall,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpiTransferFailed => write!(f, "SPI transfer failed"),
            Self::NoTransaction => write!(f, "SPI bus used outside a transaction"),
            Self::ChipNotFound => write!(f, "flash chip not found"),
            Self::ChipNotSupported => write!(f, "flash chip not identified"),
            Self::Timeout => write!(f, "operation timed out"),
            Self::InvalidAlignment => write!(f, "invalid alignment"),
            Self::BufferTooSmall => write!(f, "buffer too small"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
