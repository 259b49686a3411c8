//! Built-in table of supported devices

use super::types::DeviceDescriptor;

/// Devices the loader recognises out of the box
pub static KNOWN_DEVICES: &[DeviceDescriptor] = &[
    //                      ID      pages  sectors
    DeviceDescriptor::new(0xC84011, 512, 32, "G25D10/1Mb"),
    DeviceDescriptor::new(0xC84013, 2048, 128, "G25Q41/4Mb"),
    DeviceDescriptor::new(0xC84017, 32768, 2048, "G25Q64/64Mb"),
    DeviceDescriptor::new(0x1F8401, 2048, 128, "AT25SF041/4Mb"),
    DeviceDescriptor::new(0xEF4015, 8192, 512, "25Q16/16Mb"),
    DeviceDescriptor::new(0xEF4018, 65536, 4096, "W25Q128/128Mb"),
];

/// Find a descriptor by exact identification code
///
/// Linear scan; the first match wins if a table carries duplicates.
pub fn find_by_id(table: &[DeviceDescriptor], id: u32) -> Option<&DeviceDescriptor> {
    table.iter().find(|desc| desc.id == id)
}
