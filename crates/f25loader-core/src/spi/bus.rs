//! Byte-level SPI bus trait and framed transactions

use super::address::encode_24bit;
use super::clock::ClockDivider;
use crate::error::Result;

/// Byte clocked out while only the device is talking
pub const DUMMY_BYTE: u8 = 0xFF;

/// Identity of the chip-select line a device sits behind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ChipSelect(pub u8);

/// SPI bus trait
///
/// This trait represents the serial bus driver the loader runs on top of.
/// Every exchange with the flash happens between [`begin`](SpiBus::begin)
/// and [`end`](SpiBus::end), which assert and release the chip-select line.
/// Asserting chip select is the only mutual-exclusion mechanism; the driver
/// is the sole owner of the bus.
///
/// ## Example: Bitbanged bus
///
/// ```ignore
/// impl SpiBus for MyBus {
///     fn begin(&mut self, cs: ChipSelect, divider: ClockDivider) -> Result<()> {
///         self.set_prescaler(divider.divisor());
///         self.pins[cs.0 as usize].set_low();
///         Ok(())
///     }
///
///     fn exchange(&mut self, byte: u8) -> Result<u8> {
///         Ok(self.shift(byte))
///     }
///
///     fn end(&mut self) -> Result<()> {
///         self.release_all();
///         Ok(())
///     }
/// }
/// ```
pub trait SpiBus {
    /// Open a transaction: configure the clock and assert chip select
    fn begin(&mut self, cs: ChipSelect, divider: ClockDivider) -> Result<()>;

    /// Clock one byte out and return the byte clocked in
    fn exchange(&mut self, byte: u8) -> Result<u8>;

    /// Close the transaction: release chip select
    fn end(&mut self) -> Result<()>;

    /// Delay for the specified number of microseconds
    ///
    /// Only bounded busy-wait strategies with a poll delay call this.
    fn delay_us(&mut self, _us: u32) {}

    /// Switch to the board's alternate pin mapping, if it has one
    ///
    /// Returns `Ok(false)` when no alternate mapping exists. Bring-up uses
    /// this to retry identification once on a second MISO pin.
    fn use_alternate_pins(&mut self) -> Result<bool> {
        Ok(false)
    }
}

impl<T: SpiBus + ?Sized> SpiBus for &mut T {
    fn begin(&mut self, cs: ChipSelect, divider: ClockDivider) -> Result<()> {
        (**self).begin(cs, divider)
    }

    fn exchange(&mut self, byte: u8) -> Result<u8> {
        (**self).exchange(byte)
    }

    fn end(&mut self) -> Result<()> {
        (**self).end()
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }

    fn use_alternate_pins(&mut self) -> Result<bool> {
        (**self).use_alternate_pins()
    }
}

/// An open, chip-selected exchange with the device
///
/// Only obtainable through [`with_transaction`], which guarantees the
/// chip-select line is released on every exit path.
pub struct Transaction<'a, B: SpiBus + ?Sized> {
    bus: &'a mut B,
}

impl<B: SpiBus + ?Sized> Transaction<'_, B> {
    /// Exchange a single byte
    pub fn exchange(&mut self, byte: u8) -> Result<u8> {
        self.bus.exchange(byte)
    }

    /// Send a byte, discarding what comes back
    pub fn send(&mut self, byte: u8) -> Result<()> {
        self.bus.exchange(byte).map(|_| ())
    }

    /// Send a 24-bit address as three separate exchanges, MSB first
    pub fn send_address(&mut self, address: u32) -> Result<()> {
        for byte in encode_24bit(address) {
            self.send(byte)?;
        }
        Ok(())
    }

    /// Send every byte of `data`
    pub fn write_all(&mut self, data: &[u8]) -> Result<()> {
        for &byte in data {
            self.send(byte)?;
        }
        Ok(())
    }

    /// Fill `buf` by clocking out dummy bytes
    pub fn read_into(&mut self, buf: &mut [u8]) -> Result<()> {
        for slot in buf.iter_mut() {
            *slot = self.bus.exchange(DUMMY_BYTE)?;
        }
        Ok(())
    }
}

/// Run `f` inside one chip-selected transaction
///
/// Chip select is released even when `f` fails; the first error wins.
pub fn with_transaction<B, T, F>(
    bus: &mut B,
    cs: ChipSelect,
    divider: ClockDivider,
    f: F,
) -> Result<T>
where
    B: SpiBus + ?Sized,
    F: FnOnce(&mut Transaction<'_, B>) -> Result<T>,
{
    bus.begin(cs, divider)?;
    let result = f(&mut Transaction { bus: &mut *bus });
    let end = bus.end();
    let value = result?;
    end?;
    Ok(value)
}
