//! Checksum and verify engines
//!
//! The checksum is an additive byte sum computed word by word. Each word is
//! fetched one byte past its aligned address, which is what host tools
//! compare against, so the offset must not be corrected here.

use crate::error::Result;
use crate::protocol;
use crate::spi::SpiBus;

use super::context::DriverContext;

/// Bytes fetched per read burst while verifying
pub const VERIFY_BURST_LEN: usize = 256;

const WORD: u32 = 4;

/// Packed misalignment descriptor passed by the host
///
/// Bits 0..=3 hold the number of leading bytes to skip, bits 16..=19 the
/// number of trailing bytes to drop from the checksummed region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Misalignment(pub u32);

impl Misalignment {
    /// No skipped bytes at either end
    pub const NONE: Self = Self(0);

    /// Pack leading and trailing skips
    pub const fn new(leading: u8, trailing: u8) -> Self {
        Self((leading as u32 & 0xF) | ((trailing as u32 & 0xF) << 16))
    }

    /// Leading bytes to skip
    pub const fn leading(self) -> u32 {
        self.0 & 0xF
    }

    /// Trailing bytes to drop
    pub const fn trailing(self) -> u32 {
        (self.0 >> 16) & 0xF
    }
}

/// Result of a verify pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyOutcome {
    /// Checksum of the region, for diagnostics
    pub checksum: u32,
    /// Offset of the first differing byte, if any
    pub mismatch_offset: Option<u32>,
}

impl VerifyOutcome {
    /// Whether flash matched the expected bytes
    pub fn is_match(&self) -> bool {
        self.mismatch_offset.is_none()
    }

    /// Host encoding: checksum in the upper half, failing address (or 0)
    /// in the lower half
    pub fn combined(&self, base_address: u32) -> u64 {
        let low = self
            .mismatch_offset
            .map_or(0, |offset| base_address.wrapping_add(offset));
        (u64::from(self.checksum) << 32) | u64::from(low)
    }
}

/// Additive checksum of `size` bytes starting at `start`
///
/// `start` is rounded down and `size` rounded up to whole words. In the
/// first word only the bytes from the true start offset are summed; in the
/// last word of a padded region the padding count selects which bytes are
/// summed. The sum wraps modulo 2^32.
pub fn checksum<B: SpiBus>(
    ctx: &mut DriverContext<B>,
    start: u32,
    size: u32,
    initial: u32,
) -> Result<u32> {
    let mut lead = (start % WORD) as usize;
    let mut addr = start - start % WORD;
    let total = u64::from(size).next_multiple_of(u64::from(WORD));
    let pad = (total - u64::from(size)) as usize;

    let mut sum = initial;
    let mut word = [0u8; WORD as usize];
    let mut done = 0u64;

    while done < total {
        protocol::read_data(ctx, addr.wrapping_add(1), &mut word)?;

        let summed: &[u8] = if lead != 0 {
            let bytes = &word[lead..];
            lead = 0;
            bytes
        } else if pad != 0 && total - done <= u64::from(WORD) {
            &word[pad - 1..3]
        } else {
            &word
        };
        sum = summed
            .iter()
            .fold(sum, |acc, &b| acc.wrapping_add(u32::from(b)));

        addr = addr.wrapping_add(WORD);
        done += u64::from(WORD);
    }

    log::trace!("Checksum 0x{:06X}+{}: 0x{:08X}", start, size, sum);
    Ok(sum)
}

/// Compare flash at `address` against `expected`
///
/// Computes the diagnostic checksum over the region narrowed by
/// `misalignment`, then streams flash in [`VERIFY_BURST_LEN`] bursts and
/// stops at the first differing byte. Bytes past a mismatch are never read.
pub fn verify<B: SpiBus>(
    ctx: &mut DriverContext<B>,
    address: u32,
    expected: &[u8],
    misalignment: Misalignment,
) -> Result<VerifyOutcome> {
    let size = expected.len() as u32;
    let checksum = checksum(
        ctx,
        address.wrapping_add(misalignment.leading()),
        size.saturating_sub(misalignment.trailing()),
        0,
    )?;

    let mut burst = [0u8; VERIFY_BURST_LEN];
    let mut offset = 0usize;

    for chunk in expected.chunks(VERIFY_BURST_LEN) {
        let flash = &mut burst[..chunk.len()];
        protocol::read_data(ctx, address.wrapping_add(offset as u32), flash)?;

        if let Some(pos) = flash.iter().zip(chunk).position(|(a, b)| a != b) {
            let mismatch = (offset + pos) as u32;
            log::debug!(
                "Verify mismatch at offset {} (flash 0x{:02X}, expected 0x{:02X})",
                mismatch,
                flash[pos],
                chunk[pos]
            );
            return Ok(VerifyOutcome {
                checksum,
                mismatch_offset: Some(mismatch),
            });
        }
        offset += chunk.len();
    }

    Ok(VerifyOutcome {
        checksum,
        mismatch_offset: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flash::testing::ScriptedBus;
    use crate::spi::{opcodes, ChipSelect, ClockDivider};
    use alloc::vec::Vec;

    /// Memory where byte `i` holds `i + 1`
    fn counting_ctx() -> DriverContext<ScriptedBus> {
        let memory: Vec<u8> = (0..1024u32).map(|i| (i + 1) as u8).collect();
        DriverContext::new(
            ScriptedBus::with_memory(memory),
            ChipSelect(0),
            ClockDivider::DIV_2,
        )
    }

    fn bursts(ctx: &DriverContext<ScriptedBus>) -> usize {
        // Checksum words are 4-byte reads; anything longer is a verify burst
        ctx.bus()
            .frames_for(opcodes::READ)
            .iter()
            .filter(|f| f.len() > 8)
            .count()
    }

    #[test]
    fn test_misalignment_fields() {
        let mis = Misalignment(0x0003_0002);
        assert_eq!(mis.leading(), 2);
        assert_eq!(mis.trailing(), 3);
        assert_eq!(Misalignment::new(2, 3), mis);
        assert_eq!(Misalignment::NONE.leading(), 0);
    }

    #[test]
    fn test_checksum_reads_one_past_each_word() {
        let mut ctx = counting_ctx();
        // Word at 0 is fetched from 1..5 -> 2 + 3 + 4 + 5
        assert_eq!(checksum(&mut ctx, 0, 4, 0).unwrap(), 14);
        let reads = ctx.bus().frames_for(opcodes::READ);
        assert_eq!(reads.len(), 1);
        assert_eq!(reads[0][..4], [opcodes::READ, 0x00, 0x00, 0x01]);
    }

    #[test]
    fn test_checksum_leading_and_trailing_words() {
        let mut ctx = counting_ctx();
        // start 2, size 6: words fetched from 1 and 5.
        // Leading word sums bytes 2..=3 -> 4 + 5.
        // Trailing word (2 bytes padding) sums bytes 1..=2 -> 7 + 8.
        assert_eq!(checksum(&mut ctx, 2, 6, 0).unwrap(), 24);
        assert_eq!(ctx.bus().frames_for(opcodes::READ).len(), 2);
    }

    #[test]
    fn test_checksum_empty_region_returns_initial() {
        let mut ctx = counting_ctx();
        assert_eq!(checksum(&mut ctx, 0x40, 0, 0x1234).unwrap(), 0x1234);
        assert!(ctx.bus().frames.is_empty());
    }

    #[test]
    fn test_checksum_wraps() {
        let mut ctx = counting_ctx();
        assert_eq!(checksum(&mut ctx, 0, 4, u32::MAX).unwrap(), 13);
    }

    #[test]
    fn test_checksum_is_deterministic() {
        let mut ctx = counting_ctx();
        let first = checksum(&mut ctx, 0x13, 301, 0).unwrap();
        let second = checksum(&mut ctx, 0x13, 301, 0).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_verify_full_match() {
        let mut ctx = counting_ctx();
        let expected: Vec<u8> = (0x100..0x100 + 600u32).map(|i| (i + 1) as u8).collect();
        let outcome = verify(&mut ctx, 0x100, &expected, Misalignment::NONE).unwrap();

        assert!(outcome.is_match());
        assert_eq!(outcome.combined(0x9000_0100) & 0xFFFF_FFFF, 0);
        assert_eq!(outcome.combined(0x9000_0100) >> 32, u64::from(outcome.checksum));
        assert_eq!(bursts(&ctx), 3);
    }

    #[test]
    fn test_verify_reports_first_mismatch() {
        let mut ctx = counting_ctx();
        let mut expected: Vec<u8> = (0x100..0x100 + 64u32).map(|i| (i + 1) as u8).collect();
        expected[37] ^= 0xFF;
        expected[50] ^= 0xFF;
        let outcome = verify(&mut ctx, 0x100, &expected, Misalignment::NONE).unwrap();

        assert_eq!(outcome.mismatch_offset, Some(37));
        assert_eq!(outcome.combined(0x9000_0100) as u32, 0x9000_0100 + 37);
    }

    #[test]
    fn test_verify_stops_after_mismatching_burst() {
        let mut ctx = counting_ctx();
        let mut expected: Vec<u8> = (0..800u32).map(|i| (i + 1) as u8).collect();
        expected[10] = 0;
        verify(&mut ctx, 0, &expected, Misalignment::NONE).unwrap();
        assert_eq!(bursts(&ctx), 1);
    }

    #[test]
    fn test_verify_checksum_honours_misalignment() {
        let expected: Vec<u8> = (0..16u32).map(|i| (i + 1) as u8).collect();

        let mut ctx = counting_ctx();
        let outcome = verify(&mut ctx, 0, &expected, Misalignment::new(1, 2)).unwrap();

        let mut reference = counting_ctx();
        let direct = checksum(&mut reference, 1, 14, 0).unwrap();
        assert_eq!(outcome.checksum, direct);
        assert!(outcome.is_match());
    }
}
