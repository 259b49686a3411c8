//! SPI bus primitives
//!
//! This module provides the byte-level bus abstraction the driver talks
//! through, the standard 25-series opcodes, address encoding and clock
//! divider negotiation.

mod address;
mod bus;
mod clock;
pub mod opcodes;

pub use address::{encode_24bit, ADDRESS_BYTES};
pub use bus::{with_transaction, ChipSelect, SpiBus, Transaction, DUMMY_BYTE};
pub use clock::ClockDivider;
