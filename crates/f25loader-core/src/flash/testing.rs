//! Scripted bus for unit tests

use alloc::vec::Vec;

use crate::error::{Error, Result};
use crate::spi::{opcodes, ChipSelect, ClockDivider, SpiBus};

/// Records every transaction and answers from a small script
///
/// Status reads pop from `status` (idle once empty, or busy forever with
/// `stuck_busy`). READ streams from `memory`. Mutating commands are only
/// recorded.
#[derive(Debug, Default)]
pub(crate) struct ScriptedBus {
    pub frames: Vec<Vec<u8>>,
    pub responses: Vec<(u8, Vec<u8>)>,
    pub status: Vec<u8>,
    pub stuck_busy: bool,
    pub memory: Vec<u8>,
    pub delayed_us: u32,
    pub alternate: Option<Vec<u8>>,
    open: bool,
    current: Vec<u8>,
}

impl ScriptedBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_memory(memory: Vec<u8>) -> Self {
        Self {
            memory,
            ..Self::default()
        }
    }

    pub fn respond(&mut self, opcode: u8, bytes: &[u8]) {
        self.responses.push((opcode, bytes.to_vec()));
    }

    /// Frames with the given opcode
    pub fn frames_for(&self, opcode: u8) -> Vec<&Vec<u8>> {
        self.frames.iter().filter(|f| f.first() == Some(&opcode)).collect()
    }

    /// (address, payload length) of every page program
    pub fn page_programs(&self) -> Vec<(u32, usize)> {
        self.frames_for(opcodes::PP)
            .into_iter()
            .map(|f| (frame_address(f), f.len() - 4))
            .collect()
    }

    /// (opcode, address) of every addressed erase
    pub fn erases(&self) -> Vec<(u8, u32)> {
        self.frames
            .iter()
            .filter(|f| matches!(f[0], opcodes::SE_20 | opcodes::BE_52 | opcodes::BE_D8))
            .map(|f| (f[0], frame_address(f)))
            .collect()
    }

    fn answer(&mut self, index: usize) -> u8 {
        let opcode = self.current[0];
        match opcode {
            opcodes::RDSR if index == 1 => {
                if self.stuck_busy {
                    opcodes::SR_WIP
                } else if self.status.is_empty() {
                    0x00
                } else {
                    self.status.remove(0)
                }
            }
            opcodes::READ if index >= 4 && !self.memory.is_empty() => {
                let addr = frame_address(&self.current) as usize + index - 4;
                self.memory[addr % self.memory.len()]
            }
            _ => self
                .responses
                .iter()
                .find(|(op, _)| *op == opcode)
                .and_then(|(_, bytes)| bytes.get(index - 1).copied())
                .unwrap_or(0xFF),
        }
    }
}

pub(crate) fn frame_address(frame: &[u8]) -> u32 {
    (frame[1] as u32) << 16 | (frame[2] as u32) << 8 | frame[3] as u32
}

impl SpiBus for ScriptedBus {
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
        let index = self.current.len();
        self.current.push(byte);
        if index == 0 {
            return Ok(0xFF);
        }
        Ok(self.answer(index))
    }

    fn end(&mut self) -> Result<()> {
        self.open = false;
        let frame = core::mem::take(&mut self.current);
        self.frames.push(frame);
        Ok(())
    }

    fn delay_us(&mut self, us: u32) {
        self.delayed_us += us;
    }

    fn use_alternate_pins(&mut self) -> Result<bool> {
        match self.alternate.take() {
            Some(id) => {
                self.responses.retain(|(op, _)| *op != opcodes::RDID);
                self.respond(opcodes::RDID, &id);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
