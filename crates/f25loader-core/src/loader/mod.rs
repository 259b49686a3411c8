//! Host-facing loader surface
//!
//! A debug probe downloads the loader into target RAM and the host tool
//! calls a fixed set of entry points: initialize, read, write, mass erase,
//! sector erase, checksum and verify. [`Loader`] implements those entry
//! points on top of a [`DriverContext`]. Host addresses are masked into the
//! device window here before anything reaches the flash layer.
//!
//! Every entry point except checksum runs inside an [`InterruptWindow`]
//! and lights the activity indicator while it talks to the flash.

mod guard;
mod storage_info;

pub use guard::{
    ActivityIndicator, ActivityLight, InterruptControl, InterruptWindow, NoIndicator, NoInterrupts,
};
pub use storage_info::*;

use crate::chip::{DeviceDescriptor, KNOWN_DEVICES};
use crate::error::{Error, Result};
use crate::flash::{self, DriverContext, Misalignment, WaitStrategy};
use crate::spi::{ChipSelect, ClockDivider, SpiBus};

/// Default mask applied to host addresses
pub const DEFAULT_ADDRESS_MASK: u32 = 0x0FFF_FFFF;
/// Default maximum serial clock of the flash
pub const DEFAULT_MAX_CLOCK_HZ: u32 = 50_000_000;
/// Default SPI peripheral bus clock (APB2 of an 84 MHz F401)
pub const DEFAULT_BUS_CLOCK_HZ: u32 = 84_000_000;

/// Loader configuration
#[derive(Debug, Clone, Copy)]
pub struct LoaderConfig {
    /// Mask applied to every host address
    pub address_mask: u32,
    /// Clock feeding the SPI peripheral
    pub bus_clock_hz: u32,
    /// Fastest serial clock the flash accepts
    pub max_clock_hz: u32,
    /// Chip select the flash sits behind
    pub chip_select: ChipSelect,
    /// Busy-wait strategy for program and erase
    pub wait: WaitStrategy,
    /// Devices to match identification against
    pub table: &'static [DeviceDescriptor],
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            address_mask: DEFAULT_ADDRESS_MASK,
            bus_clock_hz: DEFAULT_BUS_CLOCK_HZ,
            max_clock_hz: DEFAULT_MAX_CLOCK_HZ,
            chip_select: ChipSelect::default(),
            wait: WaitStrategy::Unbounded,
            table: KNOWN_DEVICES,
        }
    }
}

impl LoaderConfig {
    /// Mask a host address into the device window
    pub const fn mask(&self, address: u32) -> u32 {
        address & self.address_mask
    }
}

/// External loader entry points
pub struct Loader<B, I = NoInterrupts, L = NoIndicator> {
    ctx: DriverContext<B>,
    config: LoaderConfig,
    interrupts: I,
    indicator: L,
}

impl<B: SpiBus> Loader<B> {
    /// Create a loader without interrupt control or indicator
    pub fn new(bus: B, config: LoaderConfig) -> Self {
        Self::with_platform(bus, config, NoInterrupts, NoIndicator)
    }
}

impl<B: SpiBus, I: InterruptControl, L: ActivityIndicator> Loader<B, I, L> {
    /// Create a loader with platform hooks
    ///
    /// The clock divider is negotiated here from the configured bus and
    /// flash clocks.
    pub fn with_platform(bus: B, config: LoaderConfig, interrupts: I, indicator: L) -> Self {
        let divider = ClockDivider::negotiate(config.bus_clock_hz, config.max_clock_hz);
        let ctx =
            DriverContext::new(bus, config.chip_select, divider).with_wait_strategy(config.wait);
        Self {
            ctx,
            config,
            interrupts,
            indicator,
        }
    }

    /// Identify the flash
    ///
    /// If the chip does not answer with a known code and the bus has an
    /// alternate pin mapping, identification is retried once on it.
    pub fn initialize(&mut self) -> Result<DeviceDescriptor> {
        let _irq = InterruptWindow::open(&mut self.interrupts);
        let _led = ActivityLight::on(&mut self.indicator);

        if let Some(device) = flash::identify(&mut self.ctx, self.config.table)? {
            log::info!("Found {} ({} bytes)", device.type_name, device.size());
            return Ok(device);
        }

        if self.ctx.use_alternate_pins()? {
            log::debug!("Retrying identification on alternate pins");
            if let Some(device) = flash::identify(&mut self.ctx, self.config.table)? {
                log::info!(
                    "Found {} ({} bytes) on alternate pins",
                    device.type_name,
                    device.size()
                );
                return Ok(device);
            }
        }

        Err(Error::ChipNotFound)
    }

    /// Read `buf.len()` bytes from host address `address`
    pub fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<()> {
        let _irq = InterruptWindow::open(&mut self.interrupts);
        let _led = ActivityLight::on(&mut self.indicator);
        flash::read_range(&mut self.ctx, self.config.mask(address), buf)
    }

    /// Program `data` at host address `address`
    pub fn write(&mut self, address: u32, data: &[u8]) -> Result<()> {
        let _irq = InterruptWindow::open(&mut self.interrupts);
        let _led = ActivityLight::on(&mut self.indicator);
        flash::program_range(&mut self.ctx, self.config.mask(address), data)
    }

    /// Erase the whole chip
    pub fn mass_erase(&mut self) -> Result<()> {
        let _irq = InterruptWindow::open(&mut self.interrupts);
        let _led = ActivityLight::on(&mut self.indicator);
        log::debug!("Mass erase");
        flash::erase_chip(&mut self.ctx)
    }

    /// Erase every sector touching the inclusive host range `[start, end]`
    ///
    /// Returns the number of sectors erased.
    pub fn sector_erase(&mut self, start: u32, end: u32) -> Result<u32> {
        let start = self.config.mask(start);
        let end = self.config.mask(end);
        let _irq = InterruptWindow::open(&mut self.interrupts);
        let _led = ActivityLight::on(&mut self.indicator);
        flash::erase_full_range(&mut self.ctx, start, end)
    }

    /// Checksum `size` bytes at host address `start`, continuing from `initial`
    pub fn checksum(&mut self, start: u32, size: u32, initial: u32) -> Result<u32> {
        let _led = ActivityLight::on(&mut self.indicator);
        flash::checksum(&mut self.ctx, self.config.mask(start), size, initial)
    }

    /// Compare `size_words` words of flash at `memory_address` against `ram`
    ///
    /// Returns the checksum in the upper 32 bits and, on mismatch, the host
    /// address of the first differing byte in the lower 32 bits (zero when
    /// everything matched).
    pub fn verify(
        &mut self,
        memory_address: u32,
        ram: &[u8],
        size_words: u32,
        misalignment: Misalignment,
    ) -> Result<u64> {
        let size = size_words.checked_mul(4).ok_or(Error::BufferTooSmall)? as usize;
        let expected = ram.get(..size).ok_or(Error::BufferTooSmall)?;

        let _irq = InterruptWindow::open(&mut self.interrupts);
        let _led = ActivityLight::on(&mut self.indicator);
        let outcome = flash::verify(
            &mut self.ctx,
            self.config.mask(memory_address),
            expected,
            misalignment,
        )?;
        Ok(outcome.combined(memory_address))
    }

    /// The identified device, if any
    pub fn device(&self) -> Option<&DeviceDescriptor> {
        self.ctx.device()
    }

    /// Describe the identified device for the host
    pub fn storage_info(&self, name: &str) -> Result<StorageInfo> {
        StorageInfo::uniform(name, self.ctx.require_device()?)
    }
}

impl<B, I, L> Loader<B, I, L> {
    /// Configuration in use
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Driver context
    pub fn context(&self) -> &DriverContext<B> {
        &self.ctx
    }

    /// Mutable driver context
    pub fn context_mut(&mut self) -> &mut DriverContext<B> {
        &mut self.ctx
    }

    /// Release the bus
    pub fn into_bus(self) -> B {
        self.ctx.into_bus()
    }
}
