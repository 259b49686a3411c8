//! Flash chip types and the known-device table
//!
//! This module provides the descriptor type identifying a flash chip, the
//! immutable table of supported parts, the device geometry constants and
//! status register decoding.

mod status;
mod table;
mod types;

#[cfg(feature = "std")]
mod database;

pub use status::{BlockProtect, StatusFlags, StatusRegister};
pub use table::{find_by_id, KNOWN_DEVICES};
pub use types::*;

#[cfg(feature = "std")]
pub use database::*;
