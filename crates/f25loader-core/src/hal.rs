//! `embedded-hal` 1.0 bus adapter
//!
//! Binds an `embedded_hal::spi::SpiBus` and a GPIO chip-select pin to the
//! loader's byte-level [`SpiBus`](crate::spi::SpiBus). The SPI clock is
//! configured when the peripheral is created, so the negotiated divider is
//! ignored here.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus as HalSpiBus;

use crate::error::{Error, Result};
use crate::spi::{ChipSelect, ClockDivider, SpiBus};

/// Loader bus over an `embedded-hal` SPI bus and chip-select pin
pub struct HalBus<SPI, CS, D> {
    spi: SPI,
    cs: CS,
    delay: D,
}

impl<SPI, CS, D> HalBus<SPI, CS, D>
where
    SPI: HalSpiBus<u8>,
    CS: OutputPin,
    D: DelayNs,
{
    /// Wrap the peripherals; chip select is driven high (released)
    pub fn new(spi: SPI, mut cs: CS, delay: D) -> Result<Self> {
        cs.set_high().map_err(|_| Error::SpiTransferFailed)?;
        Ok(Self { spi, cs, delay })
    }

    /// Give back the peripherals
    pub fn release(self) -> (SPI, CS, D) {
        (self.spi, self.cs, self.delay)
    }
}

impl<SPI, CS, D> SpiBus for HalBus<SPI, CS, D>
where
    SPI: HalSpiBus<u8>,
    CS: OutputPin,
    D: DelayNs,
{
    fn begin(&mut self, _cs: ChipSelect, _divider: ClockDivider) -> Result<()> {
        self.cs.set_low().map_err(|_| Error::SpiTransferFailed)
    }

    fn exchange(&mut self, byte: u8) -> Result<u8> {
        let mut buf = [byte];
        self.spi
            .transfer_in_place(&mut buf)
            .map_err(|_| Error::SpiTransferFailed)?;
        Ok(buf[0])
    }

    fn end(&mut self) -> Result<()> {
        // Flush before releasing chip select so the last byte is on the wire
        let flushed = self.spi.flush().map_err(|_| Error::SpiTransferFailed);
        let released = self.cs.set_high().map_err(|_| Error::SpiTransferFailed);
        flushed.and(released)
    }

    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }
}
