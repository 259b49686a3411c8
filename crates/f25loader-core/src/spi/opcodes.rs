//! 25-series SPI flash opcodes
//!
//! Every opcode is sent as the first byte of a transaction. Only 3-byte
//! addressing is supported, which covers devices up to 16 MiB.

// ============================================================================
// Write control
// ============================================================================

/// Write Enable - required before any write/erase operation
pub const WREN: u8 = 0x06;
/// Write Disable - clears WEL bit in status register
pub const WRDI: u8 = 0x04;

// ============================================================================
// Status register operations
// ============================================================================

/// Read Status Register
pub const RDSR: u8 = 0x05;
/// Write Status Register (not used by the loader flows)
pub const WRSR: u8 = 0x01;

// ============================================================================
// Identification
// ============================================================================

/// Read JEDEC identification (manufacturer + 16-bit device ID)
pub const RDID: u8 = 0x9F;

// ============================================================================
// Read / program
// ============================================================================

/// Read Data with 3-byte address
pub const READ: u8 = 0x03;
/// Page Program with 3-byte address
pub const PP: u8 = 0x02;

// ============================================================================
// Erase commands - 3-byte address
// ============================================================================

/// Sector Erase 4KB
pub const SE_20: u8 = 0x20;
/// Block Erase 32KB
pub const BE_52: u8 = 0x52;
/// Block Erase 64KB
pub const BE_D8: u8 = 0xD8;
/// Chip Erase (entire chip)
pub const CE_C7: u8 = 0xC7;

// ============================================================================
// Power management
// ============================================================================

/// Deep Power Down
pub const DP: u8 = 0xB9;
/// Release from Deep Power Down
pub const RDP: u8 = 0xAB;

// ============================================================================
// Status register bit definitions
// ============================================================================

/// Write In Progress / Busy
pub const SR_WIP: u8 = 0x01;
/// Write Enable Latch
pub const SR_WEL: u8 = 0x02;
/// Block Protect bit 0
pub const SR_BP0: u8 = 0x04;
/// Block Protect bit 1
pub const SR_BP1: u8 = 0x08;
/// Block Protect bit 2
pub const SR_BP2: u8 = 0x10;
/// Status Register Protect
pub const SR_SRP: u8 = 0x80;
