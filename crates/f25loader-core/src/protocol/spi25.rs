//! SPI25 protocol implementation
//!
//! This module implements the 25-series command sequences the loader uses.
//! Each function frames exactly the transactions it documents; mutating
//! commands are preceded by write enable and followed by a busy-wait on
//! the status register.

use crate::chip::{id_from_bytes, StatusRegister};
use crate::error::{Error, Result};
use crate::flash::{DriverContext, WaitStrategy};
use crate::spi::{opcodes, SpiBus, DUMMY_BYTE};

/// Read the 24-bit identification code
#[inline]
pub fn read_identification<B: SpiBus>(ctx: &mut DriverContext<B>) -> Result<u32> {
    let mut id = [0u8; 3];
    ctx.transaction(|t| {
        t.send(opcodes::RDID)?;
        t.read_into(&mut id)
    })?;
    Ok(id_from_bytes(id))
}

/// Read and decode the status register
pub fn read_status<B: SpiBus>(ctx: &mut DriverContext<B>) -> Result<StatusRegister> {
    let raw = ctx.transaction(|t| {
        t.send(opcodes::RDSR)?;
        t.exchange(DUMMY_BYTE)
    })?;
    Ok(StatusRegister::from(raw))
}

/// Send the Write Enable command
pub fn write_enable<B: SpiBus>(ctx: &mut DriverContext<B>) -> Result<()> {
    ctx.transaction(|t| t.send(opcodes::WREN))
}

/// Send the Write Disable command
pub fn write_disable<B: SpiBus>(ctx: &mut DriverContext<B>) -> Result<()> {
    ctx.transaction(|t| t.send(opcodes::WRDI))
}

/// Wait for the WIP (Write In Progress) bit to clear
///
/// Every poll is a fresh status transaction. With
/// [`WaitStrategy::Unbounded`] this never returns if the bit never clears.
pub fn wait_ready<B: SpiBus>(ctx: &mut DriverContext<B>) -> Result<()> {
    let mut polls = 0u32;
    loop {
        if !read_status(ctx)?.write_in_progress {
            if polls > 0 {
                log::trace!("Ready after {} busy polls", polls);
            }
            return Ok(());
        }
        polls = polls.saturating_add(1);

        if let WaitStrategy::Bounded {
            max_polls,
            poll_delay_us,
        } = ctx.wait_strategy()
        {
            if polls >= max_polls {
                log::warn!("Write in progress still set after {} polls", polls);
                return Err(Error::Timeout);
            }
            if poll_delay_us > 0 {
                ctx.delay_us(poll_delay_us);
            }
        }
    }
}

/// Read data starting at `addr`
///
/// One transaction regardless of length; the chip auto-increments its
/// internal address pointer.
pub fn read_data<B: SpiBus>(ctx: &mut DriverContext<B>, addr: u32, buf: &mut [u8]) -> Result<()> {
    ctx.transaction(|t| {
        t.send(opcodes::READ)?;
        t.send_address(addr)?;
        t.read_into(buf)
    })
}

/// Program a single page (up to one page of bytes)
///
/// The data must not cross a page boundary.
pub fn page_program<B: SpiBus>(ctx: &mut DriverContext<B>, addr: u32, data: &[u8]) -> Result<()> {
    write_enable(ctx)?;
    ctx.transaction(|t| {
        t.send(opcodes::PP)?;
        t.send_address(addr)?;
        t.write_all(data)
    })?;
    wait_ready(ctx)
}

/// Erase the sector/block containing `addr` with the given erase opcode
pub fn erase_block<B: SpiBus>(ctx: &mut DriverContext<B>, opcode: u8, addr: u32) -> Result<()> {
    write_enable(ctx)?;
    ctx.transaction(|t| {
        t.send(opcode)?;
        t.send_address(addr)
    })?;
    wait_ready(ctx)
}

/// Erase the entire chip
pub fn chip_erase<B: SpiBus>(ctx: &mut DriverContext<B>) -> Result<()> {
    write_enable(ctx)?;
    ctx.transaction(|t| t.send(opcodes::CE_C7))?;
    wait_ready(ctx)
}

/// Enter deep power-down
///
/// The chip ignores everything but [`release_power_down`] afterwards.
pub fn deep_power_down<B: SpiBus>(ctx: &mut DriverContext<B>) -> Result<()> {
    ctx.transaction(|t| t.send(opcodes::DP))
}

/// Release from deep power-down
pub fn release_power_down<B: SpiBus>(ctx: &mut DriverContext<B>) -> Result<()> {
    ctx.transaction(|t| t.send(opcodes::RDP))
}
