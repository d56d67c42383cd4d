//! Register boards.
//!
//! The breadboard computer has three kinds of latch:
//! - [`Register`]: generic 8-bit latch (A, B and the output register)
//! - [`InstructionRegister`]: 8-bit latch that only exposes its low nibble
//! - [`AddressRegister`]: 4-bit memory address latch with no bus driver
//!
//! All of them follow the same per-tick priority: rising-edge capture, then
//! level-sensitive clear, then level-sensitive drive.

use std::fmt;
use crate::cpu::bus::{Bus, Edge, EdgeDetector};
use crate::cpu::signals::LatchLines;
use serde::{Serialize, Deserialize};

/// Generic 8-bit register board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Register {
    buf: u8,
    edge: EdgeDetector,
}

impl Register {
    /// Create a register holding zero.
    pub const fn new() -> Self {
        Self { buf: 0, edge: EdgeDetector::new() }
    }

    /// Run the register logic for one tick.
    pub fn tick(&mut self, clk: bool, lines: LatchLines, bus: &mut Bus) {
        if self.edge.sample(clk) == Edge::Rising && lines.load {
            self.buf = bus.read();
        }
        if lines.clear {
            self.buf = 0;
        }
        if lines.drive {
            bus.drive(self.buf);
        }
    }

    /// The latched value.
    #[inline]
    pub fn value(&self) -> u8 {
        self.buf
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08b}", self.buf)
    }
}

/// Instruction register board.
///
/// The high nibble (the opcode) goes only to the control unit. Only the low
/// nibble, the operand, is ever driven onto the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InstructionRegister {
    buf: u8,
    edge: EdgeDetector,
}

impl InstructionRegister {
    pub const fn new() -> Self {
        Self { buf: 0, edge: EdgeDetector::new() }
    }

    pub fn tick(&mut self, clk: bool, lines: LatchLines, bus: &mut Bus) {
        if self.edge.sample(clk) == Edge::Rising && lines.load {
            self.buf = bus.read();
        }
        if lines.clear {
            self.buf = 0;
        }
        if lines.drive {
            bus.drive(self.operand());
        }
    }

    /// The full latched instruction byte.
    #[inline]
    pub fn value(&self) -> u8 {
        self.buf
    }

    /// High nibble.
    pub fn opcode(&self) -> u8 {
        self.buf >> 4
    }

    /// Low nibble.
    pub fn operand(&self) -> u8 {
        self.buf & 0x0f
    }
}

impl fmt::Display for InstructionRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04b} {:04b}", self.opcode(), self.operand())
    }
}

/// Memory address register board.
///
/// Four bits wide, wired only to the memory board's address input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AddressRegister {
    buf: u8,
    edge: EdgeDetector,
}

impl AddressRegister {
    pub const fn new() -> Self {
        Self { buf: 0, edge: EdgeDetector::new() }
    }

    /// `lines.drive` is ignored: there is no path from this board to the bus.
    pub fn tick(&mut self, clk: bool, lines: LatchLines, bus: &Bus) {
        if self.edge.sample(clk) == Edge::Rising && lines.load {
            self.buf = bus.read() & 0x0f;
        }
        if lines.clear {
            self.buf = 0;
        }
    }

    /// The latched address, always below 16.
    #[inline]
    pub fn value(&self) -> u8 {
        self.buf
    }
}

impl fmt::Display for AddressRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04b}", self.buf)
    }
}
