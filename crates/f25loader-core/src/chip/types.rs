//! Flash chip type definitions

/// Programming page size in bytes
///
/// A single page-program command never crosses a boundary of this size.
pub const PAGE_SIZE: u32 = 256;
/// Pages in one erase sector
pub const PAGES_PER_SECTOR: u32 = 16;
/// Smallest erase granularity in bytes (4 KiB)
pub const SECTOR_SIZE: u32 = PAGE_SIZE * PAGES_PER_SECTOR;
/// 32 KiB block erase granularity
pub const BLOCK32_SIZE: u32 = 1 << 15;
/// 64 KiB block erase granularity
pub const BLOCK64_SIZE: u32 = 1 << 16;
/// Value of every byte after an erase
pub const ERASED_VALUE: u8 = 0xFF;
/// Largest device reachable with 3-byte addresses (16 MiB)
pub const MAX_DEVICE_SIZE: u32 = 1 << 24;

/// Known flash device
///
/// Maps a 24-bit JEDEC identification code (manufacturer byte followed by
/// the 16-bit device ID) to the device geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// 24-bit identification code as read by RDID, big-endian
    pub id: u32,
    /// Number of programming pages
    pub pages: u32,
    /// Number of erase sectors
    pub sectors: u32,
    /// Human-readable type string (e.g. "W25Q128/128Mb")
    pub type_name: &'static str,
}

impl DeviceDescriptor {
    /// Create a new descriptor
    pub const fn new(id: u32, pages: u32, sectors: u32, type_name: &'static str) -> Self {
        Self {
            id,
            pages,
            sectors,
            type_name,
        }
    }

    /// JEDEC manufacturer ID (first RDID byte)
    pub const fn manufacturer(&self) -> u8 {
        (self.id >> 16) as u8
    }

    /// JEDEC device ID (second and third RDID bytes)
    pub const fn device(&self) -> u16 {
        self.id as u16
    }

    /// Total device size in bytes
    pub const fn size(&self) -> u32 {
        self.pages * PAGE_SIZE
    }
}

/// Assemble the 24-bit identification code from the three RDID bytes
pub const fn id_from_bytes(bytes: [u8; 3]) -> u32 {
    (bytes[0] as u32) << 16 | (bytes[1] as u32) << 8 | bytes[2] as u32
}
