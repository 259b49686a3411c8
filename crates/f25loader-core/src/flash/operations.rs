//! High-level flash operations

use crate::chip::{find_by_id, DeviceDescriptor, BLOCK32_SIZE, BLOCK64_SIZE, PAGE_SIZE, SECTOR_SIZE};
use crate::error::Result;
use crate::protocol;
use crate::spi::{opcodes, SpiBus};

use super::context::DriverContext;

// =============================================================================
// Geometry helpers
// =============================================================================

/// Iterator splitting a write into page-program chunks
///
/// Yields `(address, length)` pairs in ascending address order. No chunk
/// crosses a [`PAGE_SIZE`] boundary and the chunks cover the write exactly.
#[derive(Debug, Clone)]
pub struct PageChunks {
    addr: u32,
    remaining: usize,
}

impl Iterator for PageChunks {
    type Item = (u32, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let to_boundary = (PAGE_SIZE - self.addr % PAGE_SIZE) as usize;
        let len = core::cmp::min(to_boundary, self.remaining);
        let chunk = (self.addr, len);
        self.addr = self.addr.wrapping_add(len as u32);
        self.remaining -= len;
        Some(chunk)
    }
}

/// Split a `len`-byte write at `addr` into page-program chunks
pub fn page_chunks(addr: u32, len: usize) -> PageChunks {
    PageChunks {
        addr,
        remaining: len,
    }
}

/// Iterator over the sector indices covering an inclusive byte range
#[derive(Debug, Clone)]
pub struct SectorRange {
    next: Option<u32>,
    end: u32,
}

impl Iterator for SectorRange {
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next.filter(|&start| start <= self.end)?;
        self.next = start.checked_add(SECTOR_SIZE);
        Some(start / SECTOR_SIZE)
    }
}

/// Sector indices whose union covers `[start, end]`
///
/// `start` is rounded down to its sector boundary; iteration stops once the
/// advancing sector address passes `end`. Empty when `end` lies before the
/// rounded start.
pub fn sector_range(start: u32, end: u32) -> SectorRange {
    SectorRange {
        next: Some(start - start % SECTOR_SIZE),
        end,
    }
}

// =============================================================================
// Identification
// =============================================================================

/// Identify the chip against `table`
///
/// Reads the identification code and adopts the first descriptor whose code
/// matches exactly. On no match the context becomes unidentified, so page
/// and sector counts read back as zero.
pub fn identify<B: SpiBus>(
    ctx: &mut DriverContext<B>,
    table: &[DeviceDescriptor],
) -> Result<Option<DeviceDescriptor>> {
    let id = protocol::read_identification(ctx)?;
    let found = find_by_id(table, id).copied();

    match &found {
        Some(device) => log::debug!(
            "Identified {} (0x{:06X}): {} pages, {} sectors",
            device.type_name,
            id,
            device.pages,
            device.sectors
        ),
        None => log::warn!("Unknown identification code 0x{:06X}", id),
    }

    ctx.set_device(found);
    Ok(found)
}

// =============================================================================
// Read / program
// =============================================================================

/// Read flash contents in a single transaction
pub fn read_range<B: SpiBus>(ctx: &mut DriverContext<B>, addr: u32, buf: &mut [u8]) -> Result<()> {
    protocol::read_data(ctx, addr, buf)
}

/// Program data to flash
///
/// Splits `data` at page boundaries and waits for each page program to
/// finish before issuing the next. The target region must be erased first.
pub fn program_range<B: SpiBus>(ctx: &mut DriverContext<B>, addr: u32, data: &[u8]) -> Result<()> {
    ctx.require_device()?;

    let mut offset = 0usize;
    for (chunk_addr, len) in page_chunks(addr, data.len()) {
        log::trace!("Page program 0x{:06X} ({} bytes)", chunk_addr, len);
        protocol::page_program(ctx, chunk_addr, &data[offset..offset + len])?;
        offset += len;
    }

    Ok(())
}

// =============================================================================
// Erase
// =============================================================================

/// Erase one 4 KiB sector by index
pub fn erase_sector<B: SpiBus>(ctx: &mut DriverContext<B>, index: u32) -> Result<()> {
    ctx.require_device()?;
    protocol::erase_block(ctx, opcodes::SE_20, index.wrapping_mul(SECTOR_SIZE))
}

/// Erase one 32 KiB block by index
pub fn erase_block32<B: SpiBus>(ctx: &mut DriverContext<B>, index: u32) -> Result<()> {
    ctx.require_device()?;
    protocol::erase_block(ctx, opcodes::BE_52, index.wrapping_mul(BLOCK32_SIZE))
}

/// Erase one 64 KiB block by index
pub fn erase_block64<B: SpiBus>(ctx: &mut DriverContext<B>, index: u32) -> Result<()> {
    ctx.require_device()?;
    protocol::erase_block(ctx, opcodes::BE_D8, index.wrapping_mul(BLOCK64_SIZE))
}

/// Erase the entire chip
pub fn erase_chip<B: SpiBus>(ctx: &mut DriverContext<B>) -> Result<()> {
    ctx.require_device()?;
    protocol::chip_erase(ctx)
}

/// Erase every sector touching `[start, end]`
///
/// Bytes before `start` in its sector are erased too. Returns the number of
/// sectors erased.
pub fn erase_full_range<B: SpiBus>(
    ctx: &mut DriverContext<B>,
    start: u32,
    end: u32,
) -> Result<u32> {
    ctx.require_device()?;

    let mut erased = 0u32;
    for index in sector_range(start, end) {
        log::debug!("Erasing sector {} at 0x{:06X}", index, index * SECTOR_SIZE);
        erase_sector(ctx, index)?;
        erased += 1;
    }

    Ok(erased)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::KNOWN_DEVICES;
    use crate::error::Error;
    use crate::flash::testing::ScriptedBus;
    use crate::spi::{ChipSelect, ClockDivider};
    use alloc::vec;
    use alloc::vec::Vec;

    fn w25q128() -> DeviceDescriptor {
        *find_by_id(KNOWN_DEVICES, 0xEF4018).unwrap()
    }

    fn identified(bus: ScriptedBus) -> DriverContext<ScriptedBus> {
        let mut ctx = DriverContext::new(bus, ChipSelect(0), ClockDivider::DIV_2);
        ctx.set_device(Some(w25q128()));
        ctx
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    #[test]
    fn test_page_chunks_straddling_boundary() {
        let chunks: Vec<_> = page_chunks(0xFF, 2).collect();
        assert_eq!(chunks, vec![(0xFF, 1), (0x100, 1)]);
    }

    #[test]
    fn test_page_chunks_aligned_multi_page() {
        let chunks: Vec<_> = page_chunks(0x1000, 600).collect();
        assert_eq!(chunks, vec![(0x1000, 256), (0x1100, 256), (0x1200, 88)]);
    }

    #[test]
    fn test_page_chunks_never_cross_boundary() {
        for addr in [0u32, 1, 17, 255, 256, 0x1234, 0xFFFF01] {
            for len in [0usize, 1, 255, 256, 257, 1000] {
                let chunks: Vec<_> = page_chunks(addr, len).collect();
                assert_eq!(chunks.iter().map(|c| c.1).sum::<usize>(), len);
                let mut expected_addr = addr;
                for (chunk_addr, chunk_len) in chunks {
                    assert_eq!(chunk_addr, expected_addr);
                    assert!(chunk_len > 0);
                    assert!(chunk_len as u32 <= PAGE_SIZE - chunk_addr % PAGE_SIZE);
                    expected_addr += chunk_len as u32;
                }
            }
        }
    }

    #[test]
    fn test_sector_range_rounds_start_down() {
        let sectors: Vec<_> = sector_range(0x1800, 0x2000).collect();
        assert_eq!(sectors, vec![1, 2]);
    }

    #[test]
    fn test_sector_range_inclusive_end() {
        assert_eq!(sector_range(0x0000, 0x0FFF).collect::<Vec<_>>(), vec![0]);
        assert_eq!(sector_range(0x0000, 0x1000).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(sector_range(0x0FFF, 0x0FFF).collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_sector_range_covers_request() {
        for (start, end) in [(0u32, 0u32), (5, 9000), (0x3FFF, 0x4000), (0x10000, 0x1FFFF)] {
            let sectors: Vec<_> = sector_range(start, end).collect();
            let low = sectors[0] * SECTOR_SIZE;
            let high = (sectors[sectors.len() - 1] + 1) * SECTOR_SIZE;
            assert!(low <= start - start % SECTOR_SIZE);
            assert!(high > end);
            assert!(sectors.windows(2).all(|w| w[1] == w[0] + 1));
        }
    }

    #[test]
    fn test_sector_range_empty_when_end_before_start() {
        assert_eq!(sector_range(0x5000, 0x1000).count(), 0);
    }

    #[test]
    fn test_sector_range_stops_at_top_of_address_space() {
        assert_eq!(sector_range(u32::MAX - 10, u32::MAX).count(), 1);
    }

    // =========================================================================
    // Identification
    // =========================================================================

    #[test]
    fn test_identify_match() {
        let mut bus = ScriptedBus::new();
        bus.respond(opcodes::RDID, &[0xEF, 0x40, 0x18]);
        let mut ctx = DriverContext::new(bus, ChipSelect(0), ClockDivider::DIV_2);

        let found = identify(&mut ctx, KNOWN_DEVICES).unwrap();
        assert_eq!(found, Some(w25q128()));
        assert_eq!(ctx.pages(), 65536);
        assert_eq!(ctx.sectors(), 4096);
        assert_eq!(ctx.type_name(), Some("W25Q128/128Mb"));
    }

    #[test]
    fn test_identify_no_match_leaves_counts_zero() {
        let mut bus = ScriptedBus::new();
        bus.respond(opcodes::RDID, &[0xEF, 0x40, 0x19]);
        let mut ctx = DriverContext::new(bus, ChipSelect(0), ClockDivider::DIV_2);

        assert_eq!(identify(&mut ctx, KNOWN_DEVICES).unwrap(), None);
        assert!(!ctx.is_identified());
        assert_eq!(ctx.pages(), 0);
        assert_eq!(ctx.sectors(), 0);
    }

    #[test]
    fn test_identify_is_idempotent() {
        let mut bus = ScriptedBus::new();
        bus.respond(opcodes::RDID, &[0xC8, 0x40, 0x17]);
        let mut ctx = DriverContext::new(bus, ChipSelect(0), ClockDivider::DIV_2);

        let first = identify(&mut ctx, KNOWN_DEVICES).unwrap();
        let second = identify(&mut ctx, KNOWN_DEVICES).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.unwrap().type_name, "G25Q64/64Mb");
    }

    // =========================================================================
    // Program / erase
    // =========================================================================

    #[test]
    fn test_program_range_splits_at_page_boundary() {
        let mut ctx = identified(ScriptedBus::new());
        program_range(&mut ctx, 0xFF, &[0xAA, 0xBB]).unwrap();

        assert_eq!(ctx.bus().page_programs(), vec![(0xFF, 1), (0x100, 1)]);
        let pp = ctx.bus().frames_for(opcodes::PP);
        assert_eq!(pp[0][4..], [0xAA]);
        assert_eq!(pp[1][4..], [0xBB]);
    }

    #[test]
    fn test_program_range_waits_between_pages() {
        let mut bus = ScriptedBus::new();
        bus.status = vec![0x01, 0x00, 0x01, 0x01, 0x00];
        let mut ctx = identified(bus);
        program_range(&mut ctx, 0x80, &[0u8; 256]).unwrap();

        let opcodes_seen: Vec<u8> = ctx.bus().frames.iter().map(|f| f[0]).collect();
        assert_eq!(
            opcodes_seen,
            vec![
                opcodes::WREN,
                opcodes::PP,
                opcodes::RDSR,
                opcodes::RDSR,
                opcodes::WREN,
                opcodes::PP,
                opcodes::RDSR,
                opcodes::RDSR,
                opcodes::RDSR,
            ]
        );
    }

    #[test]
    fn test_unidentified_rejects_mutation() {
        let mut ctx = DriverContext::new(ScriptedBus::new(), ChipSelect(0), ClockDivider::DIV_2);
        assert_eq!(program_range(&mut ctx, 0, &[0]), Err(Error::ChipNotSupported));
        assert_eq!(erase_sector(&mut ctx, 0), Err(Error::ChipNotSupported));
        assert_eq!(erase_block32(&mut ctx, 0), Err(Error::ChipNotSupported));
        assert_eq!(erase_block64(&mut ctx, 0), Err(Error::ChipNotSupported));
        assert_eq!(erase_chip(&mut ctx), Err(Error::ChipNotSupported));
        assert_eq!(erase_full_range(&mut ctx, 0, 10), Err(Error::ChipNotSupported));
        assert!(ctx.bus().frames.is_empty());
    }

    #[test]
    fn test_erase_granularities() {
        let mut ctx = identified(ScriptedBus::new());
        erase_sector(&mut ctx, 3).unwrap();
        erase_block32(&mut ctx, 3).unwrap();
        erase_block64(&mut ctx, 3).unwrap();

        assert_eq!(
            ctx.bus().erases(),
            vec![
                (opcodes::SE_20, 0x3000),
                (opcodes::BE_52, 0x18000),
                (opcodes::BE_D8, 0x30000),
            ]
        );
    }

    #[test]
    fn test_erase_full_range_unaligned() {
        let mut ctx = identified(ScriptedBus::new());
        let erased = erase_full_range(&mut ctx, 0x1234, 0x3000).unwrap();

        assert_eq!(erased, 3);
        assert_eq!(
            ctx.bus().erases(),
            vec![
                (opcodes::SE_20, 0x1000),
                (opcodes::SE_20, 0x2000),
                (opcodes::SE_20, 0x3000),
            ]
        );
    }

    #[test]
    fn test_read_range_single_transaction() {
        let memory: Vec<u8> = (0..=255u8).collect();
        let mut ctx = DriverContext::new(
            ScriptedBus::with_memory(memory),
            ChipSelect(0),
            ClockDivider::DIV_2,
        );
        let mut buf = [0u8; 4];
        read_range(&mut ctx, 0x10, &mut buf).unwrap();

        assert_eq!(buf, [0x10, 0x11, 0x12, 0x13]);
        assert_eq!(ctx.bus().frames.len(), 1);
        assert_eq!(ctx.bus().frames[0][..4], [opcodes::READ, 0x00, 0x00, 0x10]);
    }
}
