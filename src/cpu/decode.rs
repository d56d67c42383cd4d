//! Instruction encoding.
//!
//! Every instruction is one byte: the high nibble selects the operation, the
//! low nibble is an operand (a memory address or an immediate value) for the
//! operations that take one.

use std::fmt;
use serde::{Serialize, Deserialize};

/// The operation encoded in an instruction's high nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    /// 0x0: do nothing.
    Nop,
    /// 0x1: A := [addr]
    Lda,
    /// 0x2: A := A + [addr], latch flags
    Add,
    /// 0x3: A := A - [addr], latch flags
    Sub,
    /// 0x4: [addr] := A
    Sta,
    /// 0x5: A := immediate nibble
    Ldi,
    /// 0x6: PC := addr
    Jmp,
    /// 0x7: PC := addr if the carry flag is set
    Jc,
    /// 0x8: PC := addr if the zero flag is set
    Jz,
    /// 0xE: OUT := A
    Out,
    /// 0xF: stop the clock
    Hlt,
    /// Any other high nibble. The hardware has no trap, so it executes as a
    /// no-op.
    Undefined(u8),
}

impl Opcode {
    /// Every defined opcode, in encoding order.
    pub const ALL: [Opcode; 11] = [
        Opcode::Nop,
        Opcode::Lda,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Sta,
        Opcode::Ldi,
        Opcode::Jmp,
        Opcode::Jc,
        Opcode::Jz,
        Opcode::Out,
        Opcode::Hlt,
    ];

    /// Decode a high nibble. Bits above the low four are ignored.
    pub fn from_nibble(nibble: u8) -> Self {
        match nibble & 0x0f {
            0x0 => Opcode::Nop,
            0x1 => Opcode::Lda,
            0x2 => Opcode::Add,
            0x3 => Opcode::Sub,
            0x4 => Opcode::Sta,
            0x5 => Opcode::Ldi,
            0x6 => Opcode::Jmp,
            0x7 => Opcode::Jc,
            0x8 => Opcode::Jz,
            0xe => Opcode::Out,
            0xf => Opcode::Hlt,
            other => Opcode::Undefined(other),
        }
    }

    /// The high nibble for this opcode.
    pub fn nibble(self) -> u8 {
        match self {
            Opcode::Nop => 0x0,
            Opcode::Lda => 0x1,
            Opcode::Add => 0x2,
            Opcode::Sub => 0x3,
            Opcode::Sta => 0x4,
            Opcode::Ldi => 0x5,
            Opcode::Jmp => 0x6,
            Opcode::Jc => 0x7,
            Opcode::Jz => 0x8,
            Opcode::Out => 0xe,
            Opcode::Hlt => 0xf,
            Opcode::Undefined(n) => n & 0x0f,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Nop => "NOP",
            Opcode::Lda => "LDA",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Sta => "STA",
            Opcode::Ldi => "LDI",
            Opcode::Jmp => "JMP",
            Opcode::Jc => "JC",
            Opcode::Jz => "JZ",
            Opcode::Out => "OUT",
            Opcode::Hlt => "HLT",
            Opcode::Undefined(_) => "???",
        }
    }

    /// Look up a mnemonic, ignoring case.
    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(mnemonic))
    }

    /// Whether the low nibble means anything for this opcode.
    pub fn takes_operand(self) -> bool {
        !matches!(self, Opcode::Nop | Opcode::Out | Opcode::Hlt | Opcode::Undefined(_))
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A decoded instruction byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    /// Low nibble, always below 16.
    pub operand: u8,
}

impl Instruction {
    /// Build an instruction. The operand is masked to four bits.
    pub fn new(opcode: Opcode, operand: u8) -> Self {
        Self { opcode, operand: operand & 0x0f }
    }
}

/// Split an instruction byte.
pub fn decode(byte: u8) -> Instruction {
    Instruction {
        opcode: Opcode::from_nibble(byte >> 4),
        operand: byte & 0x0f,
    }
}

/// Pack an instruction into its byte.
pub fn encode(instr: &Instruction) -> u8 {
    instr.opcode.nibble() << 4 | (instr.operand & 0x0f)
}
