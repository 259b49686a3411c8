//! Status register decoding

use bitflags::bitflags;

use crate::spi::opcodes;

bitflags! {
    /// Raw status register bits
    ///
    /// Bits 5 and 6 are reserved and dropped on decode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StatusFlags: u8 {
        /// Write in progress
        const WIP = opcodes::SR_WIP;
        /// Write enable latch
        const WEL = opcodes::SR_WEL;
        /// Block protect bit 0
        const BP0 = opcodes::SR_BP0;
        /// Block protect bit 1
        const BP1 = opcodes::SR_BP1;
        /// Block protect bit 2
        const BP2 = opcodes::SR_BP2;
        /// Status register protect
        const SRP = opcodes::SR_SRP;

        /// All block protect bits
        const BP = Self::BP0.bits() | Self::BP1.bits() | Self::BP2.bits();
    }
}

/// Block protect level (status bits 2..=4)
///
/// Level 0 leaves the array unprotected; the meaning of higher levels is
/// device specific.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BlockProtect(u8);

impl BlockProtect {
    /// Nothing protected
    pub const NONE: Self = Self(0);

    /// Create from a 3-bit level, masking anything wider
    pub const fn from_level(level: u8) -> Self {
        Self(level & 0x07)
    }

    /// The 3-bit level
    pub const fn level(self) -> u8 {
        self.0
    }

    /// Whether any part of the array is protected
    pub const fn is_protected(self) -> bool {
        self.0 != 0
    }
}

/// Decoded snapshot of the status register
///
/// Re-read on every poll; never cached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusRegister {
    /// A program or erase cycle is running
    pub write_in_progress: bool,
    /// Write enable latch is set
    pub write_enable_latch: bool,
    /// Block protect level
    pub block_protect: BlockProtect,
    /// Status register is protected
    pub status_register_protect: bool,
}

impl From<u8> for StatusRegister {
    fn from(raw: u8) -> Self {
        let flags = StatusFlags::from_bits_truncate(raw);
        Self {
            write_in_progress: flags.contains(StatusFlags::WIP),
            write_enable_latch: flags.contains(StatusFlags::WEL),
            block_protect: BlockProtect::from_level((flags & StatusFlags::BP).bits() >> 2),
            status_register_protect: flags.contains(StatusFlags::SRP),
        }
    }
}

impl From<StatusRegister> for u8 {
    fn from(status: StatusRegister) -> u8 {
        let mut flags = StatusFlags::from_bits_truncate(status.block_protect.level() << 2);
        flags.set(StatusFlags::WIP, status.write_in_progress);
        flags.set(StatusFlags::WEL, status.write_enable_latch);
        flags.set(StatusFlags::SRP, status.status_register_protect);
        flags.bits()
    }
}
