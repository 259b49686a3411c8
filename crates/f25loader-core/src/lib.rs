//! f25loader-core - Core driver for 25-series SPI NOR flash external loaders
//!
//! This crate implements the flash-control layer of an external loader: the
//! piece of code a debug probe downloads into target RAM so that a host
//! programming tool can read, write, erase and verify an off-chip SPI NOR
//! flash. It is `no_std` and allocation free.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`) and the RON
//!   descriptor database
//! - `alloc` - Enable heap allocation
//! - `embedded-hal` - Adapter for `embedded-hal` 1.0 SPI buses
//!
//! # Example
//!
//! ```ignore
//! use f25loader_core::loader::{Loader, LoaderConfig};
//!
//! fn bring_up<B: f25loader_core::spi::SpiBus>(bus: B) {
//!     let mut loader = Loader::new(bus, LoaderConfig::default());
//!     match loader.initialize() {
//!         Ok(device) => log::info!("Found {} ({} bytes)", device.type_name, device.size()),
//!         Err(e) => log::error!("Init failed: {}", e),
//!     }
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(any(feature = "alloc", test))]
extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod chip;
pub mod error;
pub mod flash;
#[cfg(feature = "embedded-hal")]
pub mod hal;
pub mod loader;
pub mod protocol;
pub mod spi;

pub use error::{Error, Result};
