//! High-level flash operations
//!
//! This module provides identification, page-aware programming, range
//! erase, and the checksum/verify engine, all operating on a
//! [`DriverContext`].

mod checksum;
mod context;
mod operations;

#[cfg(test)]
pub(crate) mod testing;

pub use checksum::{checksum, verify, Misalignment, VerifyOutcome, VERIFY_BURST_LEN};
pub use context::{DriverContext, WaitStrategy};
pub use operations::*;
