//! f25loader-dummy - In-memory 25-series flash emulator for testing
//!
//! This crate provides a bus that has an emulated SPI NOR flash chip behind
//! it. The emulator speaks the byte-level protocol: it answers each
//! exchanged byte the way a real chip would and carries out mutating
//! commands when chip select is released. It's useful for testing and
//! development without real hardware.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
use alloc::vec;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use f25loader_core::chip::{
    DeviceDescriptor, StatusFlags, BLOCK32_SIZE, BLOCK64_SIZE, ERASED_VALUE, PAGE_SIZE,
    SECTOR_SIZE,
};
use f25loader_core::error::{Error, Result};
use f25loader_core::spi::{opcodes, ChipSelect, ClockDivider, SpiBus};

/// Configuration for the dummy flash
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// 24-bit identification code returned by RDID
    pub jedec_id: u32,
    /// Flash size in bytes
    pub size: usize,
    /// Status reads that report busy after each program or erase
    pub busy_polls: u32,
    /// Never clear write-in-progress once a program or erase starts
    pub stuck_busy: bool,
    /// The chip only drives MISO on the bus's alternate pin mapping
    pub miso_on_alternate: bool,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            jedec_id: 0xEF4018, // Winbond W25Q128
            size: 16 * 1024 * 1024,
            busy_polls: 1,
            stuck_busy: false,
            miso_on_alternate: false,
        }
    }
}

impl DummyConfig {
    /// Configuration emulating `device`
    pub fn for_device(device: &DeviceDescriptor) -> Self {
        Self {
            jedec_id: device.id,
            size: device.size() as usize,
            ..Self::default()
        }
    }
}

/// One completed transaction as seen by the chip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedTransaction {
    /// First byte of the transaction
    pub opcode: u8,
    /// Address, for addressed commands
    pub address: Option<u32>,
    /// Bytes exchanged after the opcode and address
    pub data_len: usize,
    /// The chip was busy and ignored the command
    pub while_busy: bool,
}

/// Dummy flash chip on its own bus
///
/// Emulates a flash chip in memory for testing purposes.
#[cfg(feature = "alloc")]
pub struct DummyFlash {
    config: DummyConfig,
    data: Vec<u8>,
    protect_bits: u8,
    write_enabled: bool,
    busy_remaining: u32,
    hung: bool,
    powered_down: bool,
    alternate_active: bool,
    open: bool,
    frame: Vec<u8>,
    frame_len: usize,
    log: Vec<LoggedTransaction>,
}

#[cfg(feature = "alloc")]
impl DummyFlash {
    /// Create a new, fully erased dummy flash
    pub fn new(config: DummyConfig) -> Self {
        let data = vec![ERASED_VALUE; config.size];
        Self {
            config,
            data,
            protect_bits: 0,
            write_enabled: false,
            busy_remaining: 0,
            hung: false,
            powered_down: false,
            alternate_active: false,
            open: false,
            frame: Vec::new(),
            frame_len: 0,
            log: Vec::new(),
        }
    }

    /// Create a new dummy flash with default configuration (W25Q128)
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Create a dummy flash with pre-filled data
    pub fn with_data(config: DummyConfig, initial_data: &[u8]) -> Self {
        let mut flash = Self::new(config);
        let len = core::cmp::min(initial_data.len(), flash.data.len());
        flash.data[..len].copy_from_slice(&initial_data[..len]);
        flash
    }

    /// Get a reference to the flash data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a mutable reference to the flash data
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Every completed transaction, oldest first
    pub fn transactions(&self) -> &[LoggedTransaction] {
        &self.log
    }

    /// Forget recorded transactions
    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// (address, length) of every page program sent, accepted or not
    pub fn page_programs(&self) -> Vec<(u32, usize)> {
        self.log
            .iter()
            .filter(|t| t.opcode == opcodes::PP)
            .filter_map(|t| t.address.map(|a| (a, t.data_len)))
            .collect()
    }

    /// (opcode, address) of every addressed erase
    pub fn erases(&self) -> Vec<(u8, u32)> {
        self.log
            .iter()
            .filter(|t| matches!(t.opcode, opcodes::SE_20 | opcodes::BE_52 | opcodes::BE_D8))
            .filter_map(|t| t.address.map(|a| (t.opcode, a)))
            .collect()
    }

    /// Commands sent while a program or erase was still running
    pub fn busy_violations(&self) -> usize {
        self.log.iter().filter(|t| t.while_busy).count()
    }

    /// Whether the chip is in deep power-down
    pub fn is_powered_down(&self) -> bool {
        self.powered_down
    }

    /// Current status register value
    pub fn status(&self) -> u8 {
        let mut status = StatusFlags::from_bits_retain(self.protect_bits);
        status.set(StatusFlags::WIP, self.is_busy());
        status.set(StatusFlags::WEL, self.write_enabled);
        status.bits()
    }

    fn is_busy(&self) -> bool {
        self.hung || self.busy_remaining > 0
    }

    fn index(&self, addr: u32) -> usize {
        addr as usize % self.data.len()
    }

    fn respond(&mut self, index: usize) -> u8 {
        match self.frame[0] {
            opcodes::RDID if index <= 3 => (self.config.jedec_id >> (8 * (3 - index))) as u8,
            opcodes::RDSR => {
                let status = self.status();
                self.busy_remaining = self.busy_remaining.saturating_sub(1);
                status
            }
            opcodes::READ if index >= 4 && !self.data.is_empty() => {
                let addr = frame_address(&self.frame).unwrap_or(0);
                self.data[(self.index(addr) + index - 4) % self.data.len()]
            }
            _ => 0xFF,
        }
    }

    /// Consume the write enable latch for a mutating command
    fn take_write_enable(&mut self, opcode: u8) -> bool {
        if !self.write_enabled {
            log::debug!("dummy: 0x{:02X} ignored, write enable latch clear", opcode);
            return false;
        }
        self.write_enabled = false;
        true
    }

    fn start_busy(&mut self) {
        if self.config.stuck_busy {
            self.hung = true;
        } else {
            self.busy_remaining = self.config.busy_polls;
        }
    }

    fn handle_page_program(&mut self, addr: u32, payload: &[u8]) {
        let page = PAGE_SIZE as usize;
        let base = self.index(addr) & !(page - 1);
        let offset = self.index(addr) % page;
        // Programming can only change 1 -> 0, and wraps within the page
        for (i, &byte) in payload.iter().enumerate() {
            let idx = (base + (offset + i) % page) % self.data.len();
            self.data[idx] &= byte;
        }
    }

    fn handle_erase(&mut self, addr: u32, erase_size: u32) {
        let erase_size = erase_size as usize;
        let start = self.index(addr) & !(erase_size - 1);
        let end = core::cmp::min(start + erase_size, self.data.len());
        self.data[start..end].fill(ERASED_VALUE);
    }

    fn execute(&mut self, opcode: u8, address: Option<u32>, frame: &[u8]) {
        match (opcode, address) {
            (opcodes::WREN, _) => self.write_enabled = true,
            (opcodes::WRDI, _) => self.write_enabled = false,
            (opcodes::WRSR, _) => {
                if let Some(&value) = frame.get(1) {
                    if self.take_write_enable(opcode) {
                        let writable = StatusFlags::BP | StatusFlags::SRP;
                        self.protect_bits = value & writable.bits();
                        self.start_busy();
                    }
                }
            }
            (opcodes::PP, Some(addr)) => {
                if self.take_write_enable(opcode) {
                    self.handle_page_program(addr, &frame[4..]);
                    self.start_busy();
                }
            }
            (opcodes::SE_20, Some(addr)) => {
                if self.take_write_enable(opcode) {
                    self.handle_erase(addr, SECTOR_SIZE);
                    self.start_busy();
                }
            }
            (opcodes::BE_52, Some(addr)) => {
                if self.take_write_enable(opcode) {
                    self.handle_erase(addr, BLOCK32_SIZE);
                    self.start_busy();
                }
            }
            (opcodes::BE_D8, Some(addr)) => {
                if self.take_write_enable(opcode) {
                    self.handle_erase(addr, BLOCK64_SIZE);
                    self.start_busy();
                }
            }
            (opcodes::CE_C7, _) => {
                if self.take_write_enable(opcode) {
                    self.data.fill(ERASED_VALUE);
                    self.start_busy();
                }
            }
            (opcodes::DP, _) => self.powered_down = true,
            (opcodes::RDID | opcodes::RDSR | opcodes::READ | opcodes::RDP, _) => {}
            _ => log::debug!("dummy: unsupported or truncated command 0x{:02X}", opcode),
        }
    }
}

/// Address carried by bytes 1..=3 of a frame
#[cfg(feature = "alloc")]
fn frame_address(frame: &[u8]) -> Option<u32> {
    match frame.get(1..4) {
        Some(&[a, b, c]) => Some(u32::from_be_bytes([0, a, b, c])),
        _ => None,
    }
}

#[cfg(feature = "alloc")]
impl SpiBus for DummyFlash {
    fn begin(&mut self, _cs: ChipSelect, _divider: ClockDivider) -> Result<()> {
        if self.open {
            return Err(Error::NoTransaction);
        }
        self.open = true;
        Ok(())
    }

    fn exchange(&mut self, byte: u8) -> Result<u8> {
        if !self.open {
            return Err(Error::NoTransaction);
        }

        let index = self.frame_len;
        self.frame_len += 1;
        // READ payload is only dummy bytes; keep the header alone
        if self.frame.len() < 4 || self.frame[0] != opcodes::READ {
            self.frame.push(byte);
        }

        let ignored = self.powered_down || (self.is_busy() && self.frame[0] != opcodes::RDSR);
        let reply = if index == 0 || ignored {
            0xFF
        } else {
            self.respond(index)
        };

        if self.config.miso_on_alternate && !self.alternate_active {
            return Ok(0xFF);
        }
        Ok(reply)
    }

    fn end(&mut self) -> Result<()> {
        if !self.open {
            return Err(Error::NoTransaction);
        }
        self.open = false;

        let frame = core::mem::take(&mut self.frame);
        let len = core::mem::take(&mut self.frame_len);
        let Some(&opcode) = frame.first() else {
            return Ok(());
        };

        let addressed = matches!(
            opcode,
            opcodes::READ | opcodes::PP | opcodes::SE_20 | opcodes::BE_52 | opcodes::BE_D8
        );
        let address = if addressed { frame_address(&frame) } else { None };

        let while_busy = self.is_busy() && opcode != opcodes::RDSR && !self.powered_down;
        self.log.push(LoggedTransaction {
            opcode,
            address,
            data_len: len.saturating_sub(if addressed { 4 } else { 1 }),
            while_busy,
        });

        if self.powered_down {
            if opcode == opcodes::RDP {
                log::debug!("dummy: released from deep power-down");
                self.powered_down = false;
            }
            return Ok(());
        }
        if while_busy {
            log::warn!("dummy: 0x{:02X} ignored, write in progress", opcode);
            return Ok(());
        }

        self.execute(opcode, address, &frame);
        Ok(())
    }

    fn delay_us(&mut self, _us: u32) {
        // No delay needed for in-memory operations
    }

    fn use_alternate_pins(&mut self) -> Result<bool> {
        if self.config.miso_on_alternate && !self.alternate_active {
            log::debug!("dummy: switched to alternate MISO pin");
            self.alternate_active = true;
            return Ok(true);
        }
        Ok(false)
    }
}
