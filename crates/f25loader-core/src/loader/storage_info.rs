//! Device descriptor record read by the host programming tool
//!
//! The host locates this record in the loader image and reads it to learn
//! where the external memory is mapped, how large it is and how it is
//! divided into sectors. [`StorageInfo::to_record`] produces the fixed C
//! layout it expects.

use heapless::{String, Vec};
use zerocopy::little_endian::{U16, U32};
use zerocopy::{FromBytes, FromZeros, Immutable, IntoBytes, KnownLayout};

use crate::chip::{DeviceDescriptor, ERASED_VALUE, PAGE_SIZE, SECTOR_SIZE};
use crate::error::{Error, Result};

/// Capacity of the NUL-padded name field
pub const NAME_LEN: usize = 100;
/// Number of sector slots in the record, including the terminating pair
pub const SECTOR_SLOTS: usize = 10;
/// Address the external memory is mapped at on the host side
pub const DEFAULT_START_ADDRESS: u32 = 0x9000_0000;
/// Size of the encoded record in bytes
pub const RECORD_SIZE: usize = core::mem::size_of::<StorageInfoRecord>();

/// Device class tag understood by the host tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
#[allow(missing_docs)]
pub enum DeviceClass {
    McuFlash = 1,
    NandFlash = 2,
    NorFlash = 3,
    Sram = 4,
    Psram = 5,
    PcCard = 6,
    SpiFlash = 7,
    I2cFlash = 8,
    Sdram = 9,
    I2cEeprom = 10,
}

/// Run of equally sized sectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorGroup {
    /// Number of sectors in the run
    pub count: u32,
    /// Size of each sector in bytes
    pub size: u32,
}

/// Device description published to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageInfo {
    name: String<{ NAME_LEN - 1 }>,
    /// Device class
    pub device_class: DeviceClass,
    /// Host-side start address
    pub start_address: u32,
    /// Device size in bytes
    pub size: u32,
    /// Programming page size in bytes
    pub page_size: u32,
    /// Content of erased memory
    pub erase_value: u8,
    sectors: Vec<SectorGroup, { SECTOR_SLOTS - 1 }>,
}

impl StorageInfo {
    /// Create a record with no sectors
    ///
    /// Fails with [`Error::BufferTooSmall`] if `name` does not fit with its
    /// terminating NUL.
    pub fn new(
        name: &str,
        device_class: DeviceClass,
        start_address: u32,
        size: u32,
    ) -> Result<Self> {
        let mut stored = String::new();
        stored.push_str(name).map_err(|_| Error::BufferTooSmall)?;
        Ok(Self {
            name: stored,
            device_class,
            start_address,
            size,
            page_size: PAGE_SIZE,
            erase_value: ERASED_VALUE,
            sectors: Vec::new(),
        })
    }

    /// Describe an identified SPI flash as one run of 4 KiB sectors
    pub fn uniform(name: &str, device: &DeviceDescriptor) -> Result<Self> {
        let mut info = Self::new(
            name,
            DeviceClass::SpiFlash,
            DEFAULT_START_ADDRESS,
            device.size(),
        )?;
        info.add_sectors(device.sectors, SECTOR_SIZE)?;
        Ok(info)
    }

    /// Append a run of sectors
    ///
    /// The sector size must be a non-zero multiple of the page size. An
    /// empty run is ignored, since a zero count terminates the host's list.
    pub fn add_sectors(&mut self, count: u32, size: u32) -> Result<()> {
        if size == 0 || size % self.page_size != 0 {
            return Err(Error::InvalidAlignment);
        }
        if count == 0 {
            return Ok(());
        }
        self.sectors
            .push(SectorGroup { count, size })
            .map_err(|_| Error::BufferTooSmall)
    }

    /// Device name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sector runs in address order
    pub fn sectors(&self) -> &[SectorGroup] {
        &self.sectors
    }

    /// Bytes covered by the sector runs
    pub fn sector_coverage(&self) -> u64 {
        self.sectors
            .iter()
            .map(|g| u64::from(g.count) * u64::from(g.size))
            .sum()
    }

    /// Encode into the host's fixed record layout
    pub fn to_record(&self) -> StorageInfoRecord {
        let mut record = StorageInfoRecord::new_zeroed();
        record.name[..self.name.len()].copy_from_slice(self.name.as_bytes());
        record.device_type = U16::new(self.device_class as u16);
        record.start_address = U32::new(self.start_address);
        record.size = U32::new(self.size);
        record.page_size = U32::new(self.page_size);
        record.erase_value = self.erase_value;
        for (slot, group) in record.sectors.iter_mut().zip(&self.sectors) {
            slot.count = U32::new(group.count);
            slot.size = U32::new(group.size);
        }
        record
    }
}

const W25Q128_SIZE: u32 = 0x0100_0000;

impl Default for StorageInfo {
    /// 128 Mbit part behind the F401 board's SPI1
    fn default() -> Self {
        Self {
            name: String::try_from("F401_W25Q128_LED").unwrap_or_default(),
            device_class: DeviceClass::SpiFlash,
            start_address: DEFAULT_START_ADDRESS,
            size: W25Q128_SIZE,
            page_size: PAGE_SIZE,
            erase_value: ERASED_VALUE,
            sectors: Vec::from_slice(&[SectorGroup {
                count: W25Q128_SIZE / SECTOR_SIZE,
                size: SECTOR_SIZE,
            }])
            .unwrap_or_default(),
        }
    }
}

/// One (count, size) slot of the encoded record
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct SectorRecord {
    /// Number of sectors
    pub count: U32,
    /// Sector size in bytes
    pub size: U32,
}

/// Encoded device record
///
/// Field offsets follow the host's C structure, padding included. Multibyte
/// fields are little-endian.
#[derive(Debug, Clone, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct StorageInfoRecord {
    /// NUL-padded device name
    pub name: [u8; NAME_LEN],
    /// [`DeviceClass`] tag
    pub device_type: U16,
    _pad0: [u8; 2],
    /// Host-side start address
    pub start_address: U32,
    /// Device size in bytes
    pub size: U32,
    /// Programming page size
    pub page_size: U32,
    /// Content of erased memory
    pub erase_value: u8,
    _pad1: [u8; 3],
    /// Sector runs, terminated by a zero pair
    pub sectors: [SectorRecord; SECTOR_SLOTS],
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::{find_by_id, KNOWN_DEVICES};

    #[test]
    fn test_record_layout() {
        assert_eq!(RECORD_SIZE, 200);
    }

    #[test]
    fn test_default_record_bytes() {
        let record = StorageInfo::default().to_record();
        let bytes = record.as_bytes();

        assert_eq!(&bytes[..16], b"F401_W25Q128_LED");
        assert!(bytes[16..100].iter().all(|&b| b == 0));
        assert_eq!(bytes[100..102], [7, 0]);
        assert_eq!(bytes[104..108], 0x9000_0000u32.to_le_bytes());
        assert_eq!(bytes[108..112], 0x0100_0000u32.to_le_bytes());
        assert_eq!(bytes[112..116], 256u32.to_le_bytes());
        assert_eq!(bytes[116], 0xFF);
        assert_eq!(bytes[120..124], 4096u32.to_le_bytes());
        assert_eq!(bytes[124..128], 4096u32.to_le_bytes());
        assert!(bytes[128..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_uniform_matches_device() {
        let device = find_by_id(KNOWN_DEVICES, 0xC84013).unwrap();
        let info = StorageInfo::uniform("G25Q41", device).unwrap();
        assert_eq!(info.size, 512 * 1024);
        assert_eq!(info.sectors(), &[SectorGroup { count: 128, size: 4096 }]);
        assert_eq!(info.sector_coverage(), u64::from(info.size));
    }

    #[test]
    fn test_name_too_long() {
        let long = [b'x'; NAME_LEN];
        let name = core::str::from_utf8(&long).unwrap();
        assert_eq!(
            StorageInfo::new(name, DeviceClass::SpiFlash, 0, 0),
            Err(Error::BufferTooSmall)
        );
        assert!(StorageInfo::new(&name[1..], DeviceClass::SpiFlash, 0, 0).is_ok());
    }

    #[test]
    fn test_add_sectors_rules() {
        let mut info = StorageInfo::new("mixed", DeviceClass::NorFlash, 0, 0).unwrap();
        assert_eq!(info.add_sectors(1, 100), Err(Error::InvalidAlignment));
        info.add_sectors(0, 4096).unwrap();
        assert!(info.sectors().is_empty());
        for _ in 0..SECTOR_SLOTS - 1 {
            info.add_sectors(2, 4096).unwrap();
        }
        assert_eq!(info.add_sectors(2, 4096), Err(Error::BufferTooSmall));
    }
}
