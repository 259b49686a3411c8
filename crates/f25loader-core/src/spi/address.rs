//! Address encoding

/// Number of address bytes sent after an addressed opcode
pub const ADDRESS_BYTES: usize = 3;

/// Encode an address as 3 bytes, most significant byte first
///
/// Bits above 23 are dropped; the device only decodes 24 address bits.
pub const fn encode_24bit(address: u32) -> [u8; ADDRESS_BYTES] {
    [(address >> 16) as u8, (address >> 8) as u8, address as u8]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_msb_first() {
        assert_eq!(encode_24bit(0x00123456), [0x12, 0x34, 0x56]);
        assert_eq!(encode_24bit(0x000000FF), [0x00, 0x00, 0xFF]);
    }

    #[test]
    fn test_encode_drops_upper_byte() {
        assert_eq!(encode_24bit(0x90ABCDEF), [0xAB, 0xCD, 0xEF]);
    }
}
