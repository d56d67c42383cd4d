//! Control logic board: the micro-sequencer.
//!
//! Each instruction takes five micro-steps. Steps 0 and 1 fetch the next
//! instruction; steps 2 to 4 execute it. The step counter advances on every
//! falling clock edge, so the signals for a step are set up half a period
//! before the rising edge that acts on them.

use std::fmt;
use crate::cpu::alu::Flags;
use crate::cpu::bus::{Edge, EdgeDetector};
use crate::cpu::decode::Opcode;
use crate::cpu::signals::ControlSignals;
use serde::{Serialize, Deserialize};
use tracing::{event, Level};

/// Number of micro-steps per instruction.
pub const MICRO_STEPS: u8 = 5;

/// Ticks for which a reset holds CLR asserted (one full clock period).
const RESET_TICKS: u8 = 2;

/// The control unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControlUnit {
    step: u8,
    halt: bool,
    reset_hold: u8,
    signals: ControlSignals,
    edge: EdgeDetector,
}

impl ControlUnit {
    pub const fn new() -> Self {
        Self {
            step: 0,
            halt: false,
            reset_hold: 0,
            signals: ControlSignals::idle(),
            edge: EdgeDetector::new(),
        }
    }

    /// Run the micro-sequencer for one tick.
    ///
    /// `instruction` is the instruction register's full byte and `flags` the
    /// arithmetic unit's latched flags.
    pub fn tick(&mut self, clk: bool, instruction: u8, flags: Flags) {
        let falling = self.edge.sample(clk) == Edge::Falling;
        if falling {
            self.step += 1;
            if self.step == MICRO_STEPS {
                self.step = 0;
            }
        }

        self.signals = ControlSignals::idle();

        if self.reset_hold > 0 {
            self.signals.clear = true;
            self.step = 0;
            self.halt = false;
            self.reset_hold -= 1;
            if self.reset_hold == 0 {
                event!(Level::DEBUG, "reset released");
            }
            return;
        }

        match self.step {
            0 => {
                self.signals.pc_out = true;
                self.signals.mar_in = true;
            }
            1 => {
                self.signals.ram_out = true;
                self.signals.ir_in = true;
                self.signals.pc_enable = true;
            }
            step => {
                let opcode = Opcode::from_nibble(instruction >> 4);
                if step == 2 && falling {
                    match opcode {
                        Opcode::Hlt => event!(Level::DEBUG, "halt latched"),
                        Opcode::Undefined(nibble) => {
                            event!(Level::DEBUG, nibble, "undefined opcode, no signals");
                        }
                        _ => {}
                    }
                }
                self.execute(opcode, step, flags);
            }
        }
    }

    /// Signals for the execute phase (steps 2 to 4).
    fn execute(&mut self, opcode: Opcode, step: u8, flags: Flags) {
        let s = &mut self.signals;
        match (opcode, step) {
            (Opcode::Lda | Opcode::Add | Opcode::Sub | Opcode::Sta, 2) => {
                s.ir_out = true;
                s.mar_in = true;
            }

            (Opcode::Lda, 3) => {
                s.ram_out = true;
                s.a_in = true;
            }

            (Opcode::Add | Opcode::Sub, 3) => {
                s.ram_out = true;
                s.b_in = true;
            }
            (Opcode::Add | Opcode::Sub, 4) => {
                s.alu_out = true;
                s.a_in = true;
                s.flags_in = true;
                s.subtract = opcode == Opcode::Sub;
            }

            (Opcode::Sta, 3) => {
                s.a_out = true;
                s.ram_in = true;
            }

            (Opcode::Ldi, 2) => {
                s.ir_out = true;
                s.a_in = true;
            }

            (Opcode::Jmp, 2) => {
                s.ir_out = true;
                s.jump = true;
            }
            (Opcode::Jc, 2) if flags.carry => {
                s.ir_out = true;
                s.jump = true;
            }
            (Opcode::Jz, 2) if flags.zero => {
                s.ir_out = true;
                s.jump = true;
            }

            (Opcode::Out, 2) => {
                s.a_out = true;
                s.out_in = true;
            }

            (Opcode::Hlt, 2) => {
                self.halt = true;
            }

            // NOP, undefined opcodes and every unused step.
            _ => {}
        }
    }

    /// Arm a reset. CLR is held for the next two ticks, then released with
    /// the step counter at 0 and the halt latch clear.
    pub fn reset(&mut self) {
        event!(Level::DEBUG, "reset armed");
        self.reset_hold = RESET_TICKS;
    }

    /// Signals derived on the last tick.
    #[inline]
    pub fn signals(&self) -> &ControlSignals {
        &self.signals
    }

    /// Current micro-step, 0 to 4.
    #[inline]
    pub fn step(&self) -> u8 {
        self.step
    }

    /// The halt latch.
    #[inline]
    pub fn halted(&self) -> bool {
        self.halt
    }

    /// Whether a reset is still holding CLR.
    pub fn resetting(&self) -> bool {
        self.reset_hold > 0
    }
}

impl fmt::Display for ControlUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{} [{}]", self.step, self.signals)?;
        if self.halt {
            write!(f, " HLT")?;
        }
        Ok(())
    }
}
