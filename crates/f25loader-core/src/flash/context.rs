//! Driver context - runtime state for flash operations

use crate::chip::DeviceDescriptor;
use crate::error::{Error, Result};
use crate::spi::{with_transaction, ChipSelect, ClockDivider, SpiBus, Transaction};

/// How to wait for the write-in-progress bit to clear
///
/// The chip gives no completion signal other than the status register, so
/// every program and erase polls it. `Unbounded` polls back-to-back until
/// the bit clears and blocks forever on an unresponsive chip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WaitStrategy {
    /// Poll until the bit clears, however long that takes
    #[default]
    Unbounded,
    /// Give up with [`Error::Timeout`] after `max_polls` busy reads
    Bounded {
        /// Busy status reads tolerated before giving up
        max_polls: u32,
        /// Delay between polls in microseconds (0 = back-to-back)
        poll_delay_us: u32,
    },
}

/// Runtime context for flash operations
///
/// Owns the bus the flash sits on together with the parameters every
/// transaction needs, and the descriptor of the identified device. Only
/// identification changes the descriptor; program and erase operations
/// never do.
#[derive(Debug)]
pub struct DriverContext<B> {
    bus: B,
    chip_select: ChipSelect,
    divider: ClockDivider,
    wait: WaitStrategy,
    device: Option<DeviceDescriptor>,
}

impl<B: SpiBus> DriverContext<B> {
    /// Create an unidentified context bound to `bus`
    pub fn new(bus: B, chip_select: ChipSelect, divider: ClockDivider) -> Self {
        Self {
            bus,
            chip_select,
            divider,
            wait: WaitStrategy::Unbounded,
            device: None,
        }
    }

    /// Replace the busy-wait strategy
    pub fn with_wait_strategy(mut self, wait: WaitStrategy) -> Self {
        self.wait = wait;
        self
    }

    /// Run `f` inside one chip-selected transaction
    pub fn transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Transaction<'_, B>) -> Result<T>,
    {
        with_transaction(&mut self.bus, self.chip_select, self.divider, f)
    }

    /// Delay on the underlying bus
    pub(crate) fn delay_us(&mut self, us: u32) {
        self.bus.delay_us(us);
    }

    /// Switch the bus to its alternate pin mapping, if any
    pub(crate) fn use_alternate_pins(&mut self) -> Result<bool> {
        self.bus.use_alternate_pins()
    }

    pub(crate) fn set_device(&mut self, device: Option<DeviceDescriptor>) {
        self.device = device;
    }
}

impl<B> DriverContext<B> {
    /// The identified device, if any
    pub fn device(&self) -> Option<&DeviceDescriptor> {
        self.device.as_ref()
    }

    /// The identified device, or [`Error::ChipNotSupported`]
    pub fn require_device(&self) -> Result<&DeviceDescriptor> {
        self.device.as_ref().ok_or(Error::ChipNotSupported)
    }

    /// Check if a device has been identified
    pub fn is_identified(&self) -> bool {
        self.device.is_some()
    }

    /// Page count of the identified device (0 when unidentified)
    pub fn pages(&self) -> u32 {
        self.device.map_or(0, |d| d.pages)
    }

    /// Sector count of the identified device (0 when unidentified)
    pub fn sectors(&self) -> u32 {
        self.device.map_or(0, |d| d.sectors)
    }

    /// Type string of the identified device
    pub fn type_name(&self) -> Option<&'static str> {
        self.device.map(|d| d.type_name)
    }

    /// Size of the identified device in bytes (0 when unidentified)
    pub fn total_size(&self) -> u32 {
        self.device.map_or(0, |d| d.size())
    }

    /// Chip select the device sits behind
    pub fn chip_select(&self) -> ChipSelect {
        self.chip_select
    }

    /// Negotiated clock divider
    pub fn divider(&self) -> ClockDivider {
        self.divider
    }

    /// Busy-wait strategy in use
    pub fn wait_strategy(&self) -> WaitStrategy {
        self.wait
    }

    /// Borrow the bus
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Mutably borrow the bus
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Release the bus
    pub fn into_bus(self) -> B {
        self.bus
    }
}
