//! SPI clock divider negotiation

/// Power-of-two divider applied to the SPI peripheral's bus clock
///
/// The serial clock is `bus_hz / divisor`. Valid divisors are 2 through
/// 256, matching the prescaler of a typical microcontroller SPI block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClockDivider(u8);

impl ClockDivider {
    /// Divide by 2 (fastest)
    pub const DIV_2: Self = Self(0);
    /// Divide by 256 (slowest)
    pub const DIV_256: Self = Self(7);

    /// Pick the fastest divider whose clock does not exceed `max_hz`
    ///
    /// Saturates at divide-by-256 when even that is too fast.
    pub fn negotiate(bus_hz: u32, max_hz: u32) -> Self {
        let mut shift = 0u8;
        while shift < Self::DIV_256.0 && bus_hz >> (shift + 1) > max_hz {
            shift += 1;
        }
        let divider = Self(shift);
        log::debug!(
            "SPI clock: {} Hz / {} = {} Hz (max {} Hz)",
            bus_hz,
            divider.divisor(),
            divider.clock_hz(bus_hz),
            max_hz
        );
        divider
    }

    /// Register encoding of the divider (0 = /2 ... 7 = /256)
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// The divisor value
    pub const fn divisor(self) -> u32 {
        2 << self.0
    }

    /// Serial clock resulting from `bus_hz`
    pub const fn clock_hz(self, bus_hz: u32) -> u32 {
        bus_hz / self.divisor()
    }
}

impl Default for ClockDivider {
    fn default() -> Self {
        Self::DIV_256
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negotiate_exact_fit() {
        let div = ClockDivider::negotiate(100_000_000, 50_000_000);
        assert_eq!(div, ClockDivider::DIV_2);
        assert_eq!(div.clock_hz(100_000_000), 50_000_000);
    }

    #[test]
    fn test_negotiate_rounds_down_speed() {
        // 84 MHz APB2 with a 25 MHz part: /2 = 42 MHz, /4 = 21 MHz
        let div = ClockDivider::negotiate(84_000_000, 25_000_000);
        assert_eq!(div.divisor(), 4);
        assert_eq!(div.bits(), 1);
    }

    #[test]
    fn test_negotiate_saturates() {
        let div = ClockDivider::negotiate(84_000_000, 1_000);
        assert_eq!(div, ClockDivider::DIV_256);
        assert_eq!(div.divisor(), 256);
    }
}
