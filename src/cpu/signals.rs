//! The control-signal vector.
//!
//! The control unit recomputes a fresh [`ControlSignals`] value on every
//! tick. Nothing accumulates: a line that is not asserted this tick is low.
//! The orchestrator splits the vector into the small line bundles below so
//! each board only sees the wires it is connected to.

use std::fmt;
use serde::{Serialize, Deserialize};

/// Every control line driven by the control unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControlSignals {
    /// CLR: clear every register, counter and flag latch.
    pub clear: bool,

    /// AI: bus into the A register.
    pub a_in: bool,
    /// AO: A register onto the bus.
    pub a_out: bool,

    /// BI: bus into the B register.
    pub b_in: bool,

    /// OI: bus into the output register.
    pub out_in: bool,

    /// MI: bus into the memory address register.
    pub mar_in: bool,

    /// II: bus into the instruction register.
    pub ir_in: bool,
    /// IO: instruction register operand nibble onto the bus.
    pub ir_out: bool,

    /// EO: arithmetic result onto the bus.
    pub alu_out: bool,
    /// SU: select subtraction.
    pub subtract: bool,
    /// FI: latch the carry and zero flags.
    pub flags_in: bool,

    /// CO: program counter onto the bus.
    pub pc_out: bool,
    /// J: bus into the program counter.
    pub jump: bool,
    /// CE: increment the program counter.
    pub pc_enable: bool,

    /// RI: bus into memory at the current address.
    pub ram_in: bool,
    /// RO: memory at the current address onto the bus.
    pub ram_out: bool,
}

/// Lines wired to a latch board (A, B, output and instruction registers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LatchLines {
    pub clear: bool,
    pub load: bool,
    pub drive: bool,
}

/// Lines wired to the arithmetic unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AluLines {
    pub clear: bool,
    pub drive: bool,
    pub subtract: bool,
    pub flags_in: bool,
}

/// Lines wired to the program counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterLines {
    pub clear: bool,
    pub drive: bool,
    pub load: bool,
    pub count: bool,
}

/// Lines wired to the memory board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryLines {
    pub write: bool,
    pub drive: bool,
}

impl ControlSignals {
    /// All lines low.
    pub const fn idle() -> Self {
        Self {
            clear: false,
            a_in: false,
            a_out: false,
            b_in: false,
            out_in: false,
            mar_in: false,
            ir_in: false,
            ir_out: false,
            alu_out: false,
            subtract: false,
            flags_in: false,
            pc_out: false,
            jump: false,
            pc_enable: false,
            ram_in: false,
            ram_out: false,
        }
    }

    pub fn a_register(&self) -> LatchLines {
        LatchLines { clear: self.clear, load: self.a_in, drive: self.a_out }
    }

    /// The B register has no drive path; it only feeds the arithmetic unit.
    pub fn b_register(&self) -> LatchLines {
        LatchLines { clear: self.clear, load: self.b_in, drive: false }
    }

    pub fn output_register(&self) -> LatchLines {
        LatchLines { clear: self.clear, load: self.out_in, drive: false }
    }

    pub fn instruction_register(&self) -> LatchLines {
        LatchLines { clear: self.clear, load: self.ir_in, drive: self.ir_out }
    }

    pub fn address_register(&self) -> LatchLines {
        LatchLines { clear: self.clear, load: self.mar_in, drive: false }
    }

    pub fn alu(&self) -> AluLines {
        AluLines {
            clear: self.clear,
            drive: self.alu_out,
            subtract: self.subtract,
            flags_in: self.flags_in,
        }
    }

    pub fn counter(&self) -> CounterLines {
        CounterLines {
            clear: self.clear,
            drive: self.pc_out,
            load: self.jump,
            count: self.pc_enable,
        }
    }

    pub fn memory(&self) -> MemoryLines {
        MemoryLines { write: self.ram_in, drive: self.ram_out }
    }

    /// Short names of the asserted lines, in a fixed order.
    pub fn active(&self) -> Vec<&'static str> {
        let lines = [
            (self.clear, "CLR"),
            (self.a_in, "AI"),
            (self.a_out, "AO"),
            (self.b_in, "BI"),
            (self.out_in, "OI"),
            (self.mar_in, "MI"),
            (self.ir_in, "II"),
            (self.ir_out, "IO"),
            (self.alu_out, "EO"),
            (self.subtract, "SU"),
            (self.flags_in, "FI"),
            (self.pc_out, "CO"),
            (self.jump, "J"),
            (self.pc_enable, "CE"),
            (self.ram_in, "RI"),
            (self.ram_out, "RO"),
        ];
        lines
            .iter()
            .filter(|(on, _)| *on)
            .map(|(_, name)| *name)
            .collect()
    }

    /// Number of boards asked to drive the bus.
    pub fn drivers(&self) -> usize {
        [self.a_out, self.ir_out, self.alu_out, self.pc_out, self.ram_out]
            .iter()
            .filter(|on| **on)
            .count()
    }
}

impl fmt::Display for ControlSignals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let active = self.active();
        if active.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", active.join(", "))
        }
    }
}
