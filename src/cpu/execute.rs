//! The assembled machine.
//!
//! [`Cpu`] owns every board plus the bus, and defines the order in which the
//! boards run within a tick. That order is the whole timing model:
//!
//! 1. clock
//! 2. control unit
//! 3. A register
//! 4. B register
//! 5. output register
//! 6. arithmetic unit
//! 7. memory address register
//! 8. memory
//! 9. program counter
//! 10. instruction register
//!
//! If two boards ever drove the bus in one tick, the later one in this list
//! would win.

use std::fmt;
use crate::cpu::{
    AddressRegister, ArithmeticUnit, Bus, Clock, ControlSignals, ControlUnit, Flags,
    InstructionRegister, Memory, ProgramCounter, Register,
};
use crate::cpu::decode::{self, Instruction, Opcode};
use serde::{Serialize, Deserialize};
use tracing::{event, Level};

/// The breadboard computer.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cpu {
    /// Shared data bus.
    pub bus: Bus,
    /// Clock board.
    pub clock: Clock,
    /// Control logic board.
    pub control: ControlUnit,
    /// A register (accumulator).
    pub a: Register,
    /// B register (second arithmetic operand).
    pub b: Register,
    /// Output register.
    pub out: Register,
    /// Arithmetic unit.
    pub alu: ArithmeticUnit,
    /// Memory address register.
    pub mar: AddressRegister,
    /// RAM.
    pub mem: Memory,
    /// Program counter.
    pub pc: ProgramCounter,
    /// Instruction register.
    pub ir: InstructionRegister,
    /// Ticks executed since construction.
    pub ticks: u64,
}

impl Cpu {
    /// Create a powered-up machine: clock low, every board zeroed.
    pub fn new() -> Self {
        Self {
            bus: Bus::new(),
            clock: Clock::new(),
            control: ControlUnit::new(),
            a: Register::new(),
            b: Register::new(),
            out: Register::new(),
            alu: ArithmeticUnit::new(),
            mar: AddressRegister::new(),
            mem: Memory::new(),
            pc: ProgramCounter::new(),
            ir: InstructionRegister::new(),
            ticks: 0,
        }
    }

    /// Bulk-load a program image into memory from address 0.
    ///
    /// Returns `true` if the image was longer than memory and was truncated.
    #[must_use]
    pub fn load_memory(&mut self, bytes: &[u8]) -> bool {
        self.mem.load(bytes)
    }

    /// Advance the machine by half a clock period.
    pub fn tick(&mut self) {
        self.clock.tick(self.control.halted());
        let clk = self.clock.level();

        self.control.tick(clk, self.ir.value(), self.alu.flags());
        let s = *self.control.signals();
        self.tick_boards(clk, s);

        self.ticks += 1;
    }

    /// Every board after the control unit, in bus priority order.
    fn tick_boards(&mut self, clk: bool, s: ControlSignals) {
        self.a.tick(clk, s.a_register(), &mut self.bus);
        self.b.tick(clk, s.b_register(), &mut self.bus);
        self.out.tick(clk, s.output_register(), &mut self.bus);
        self.alu.tick(clk, s.alu(), self.a.value(), self.b.value(), &mut self.bus);
        self.mar.tick(clk, s.address_register(), &self.bus);
        self.mem.tick(clk, self.mar.value(), s.memory(), &mut self.bus);
        self.pc.tick(clk, s.counter(), &mut self.bus);
        self.ir.tick(clk, s.instruction_register(), &mut self.bus);
    }

    /// Advance by one full clock period (two ticks).
    pub fn full_step(&mut self) {
        self.tick();
        self.tick();
    }

    /// Tick at least once, then until the last micro-step of the current
    /// instruction is set up with the clock high.
    ///
    /// A halted clock is stuck low and never reaches that point, so this
    /// also returns as soon as the halt latch is set.
    pub fn run_to_instruction_boundary(&mut self) {
        self.tick();
        while !self.at_instruction_boundary() && !self.control.halted() {
            self.tick();
        }
    }

    /// Micro-step 4 with the clock high: one tick short of finishing the
    /// current instruction.
    pub fn at_instruction_boundary(&self) -> bool {
        self.control.step() == 4 && self.clock.level()
    }

    /// Tick until the halt latch is set.
    ///
    /// There is no iteration cap: a program that never halts keeps this
    /// looping. Use [`Cpu::run_limited`] to bound execution.
    pub fn run_to_halt(&mut self) {
        while !self.control.halted() {
            self.tick();
        }
    }

    /// Tick until halted or until `max_ticks` ticks have run.
    ///
    /// Returns the number of ticks executed.
    pub fn run_limited(&mut self, max_ticks: u64) -> u64 {
        let start = self.ticks;
        while !self.control.halted() && self.ticks - start < max_ticks {
            self.tick();
        }
        self.ticks - start
    }

    /// Reset the machine: hold CLR for one full clock period.
    ///
    /// Registers, counter and flags are cleared, the micro-step returns to 0
    /// and the halt latch is released. Memory is untouched.
    ///
    /// Nothing drives the bus while CLR is held, so the bus is zeroed too:
    /// the first fetch after reset may latch it into the address register.
    pub fn reset(&mut self) {
        self.control.reset();
        self.bus = Bus::new();
        while self.control.resetting() {
            self.tick();
        }
        event!(Level::DEBUG, ticks = self.ticks, "machine reset");
    }

    /// Current bus value.
    pub fn bus_value(&self) -> u8 {
        self.bus.read()
    }

    /// The output register, the machine's only display.
    pub fn output(&self) -> u8 {
        self.out.value()
    }

    /// Latched carry and zero flags.
    pub fn flags(&self) -> Flags {
        self.alu.flags()
    }

    /// Current micro-step, 0 to 4.
    pub fn micro_step(&self) -> u8 {
        self.control.step()
    }

    pub fn is_halted(&self) -> bool {
        self.control.halted()
    }

    /// The instruction currently latched in the instruction register.
    pub fn current_instruction(&self) -> Instruction {
        decode::decode(self.ir.value())
    }

    /// Whether the latched instruction has an undefined opcode.
    pub fn executing_undefined(&self) -> bool {
        matches!(self.current_instruction().opcode, Opcode::Undefined(_))
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Cpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cpu")
            .field("ticks", &self.ticks)
            .field("step", &self.control.step())
            .field("halted", &self.control.halted())
            .field("pc", &self.pc.value())
            .field("a", &self.a.value())
            .field("out", &self.out.value())
            .finish()
    }
}

impl fmt::Display for Cpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "bus:  {:08b}", self.bus.read())?;
        writeln!(f, "clk:  {}", if self.clock.level() { "high" } else { "low" })?;
        writeln!(f, "a:    {}", self.a)?;
        writeln!(f, "b:    {}", self.b)?;
        writeln!(f, "alu:  {}", self.alu)?;
        writeln!(f, "pc:   {}", self.pc)?;
        writeln!(f, "mar:  {}", self.mar)?;
        writeln!(f, "ram:  {:08b}", self.mem.read(self.mar.value()))?;
        writeln!(f, "ir:   {}", self.ir)?;
        writeln!(f, "cl:   {}", self.control)?;
        write!(f, "out:  {}", self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::assemble;

    /// product = factor1 * factor2 by repeated addition, counting factor1
    /// down to zero.
    const MULTIPLY: &str = "
        top:    lda prod
                add f2
                sta prod
                lda f1
                sub one
                sta f1
                jz done
                jmp top
        done:   lda prod
                out
                hlt
                .org 12
        one:    .byte 1
        prod:   .byte 0
        f1:     .byte 2
        f2:     .byte 4
    ";

    fn boot(program: &[u8]) -> Cpu {
        let mut cpu = Cpu::new();
        assert!(!cpu.load_memory(program));
        cpu
    }

    #[test]
    fn test_multiply_program() {
        let image = assemble(MULTIPLY).unwrap();
        let mut cpu = boot(&image);
        cpu.run_to_halt();

        assert!(cpu.is_halted());
        assert_eq!(cpu.output(), 8);
        assert_eq!(cpu.mem.read(13), 8);
        assert_eq!(cpu.mem.read(14), 0);
    }

    #[test]
    fn test_multiply_after_reset() {
        let image = assemble(MULTIPLY).unwrap();
        let mut cpu = boot(&image);
        cpu.run_to_halt();

        assert!(!cpu.load_memory(&image));
        cpu.reset();
        assert!(!cpu.is_halted());
        cpu.run_to_halt();
        assert_eq!(cpu.output(), 8);
    }

    #[test]
    fn test_add_sets_carry_for_jc() {
        // 0: LDA 15; 1: ADD 14; 2: JC 5; 3: OUT; 4: HLT; 5: LDI 7; 6: OUT; 7: HLT
        let mut image = [0u8; 16];
        image[..8].copy_from_slice(&[0x1f, 0x2e, 0x75, 0xe0, 0xf0, 0x57, 0xe0, 0xf0]);
        image[14] = 0xf2;
        image[15] = 0x0f;
        let mut cpu = boot(&image);
        cpu.run_to_halt();

        assert_eq!(cpu.output(), 7);
        assert!(cpu.flags().carry);
        assert_eq!(cpu.a.value(), 7);
    }

    #[test]
    fn test_sub_borrow_drives_jc() {
        // 0: LDI 3; 1: SUB 15 (5); 2: JC 5; 3: LDI 1; 4: HLT; 5: OUT; 6: HLT
        let mut image = [0u8; 16];
        image[..7].copy_from_slice(&[0x53, 0x3f, 0x75, 0x51, 0xf0, 0xe0, 0xf0]);
        image[15] = 5;
        let mut cpu = boot(&image);
        cpu.run_to_halt();

        assert_eq!(cpu.output(), 0xfe);
        assert_eq!(cpu.flags(), Flags { carry: true, zero: false });
    }

    #[test]
    fn test_store_writes_memory() {
        // LDI 9; STA 10; LDA 10; OUT; HLT
        let mut cpu = boot(&[0x59, 0x4a, 0x1a, 0xe0, 0xf0]);
        cpu.run_to_halt();
        assert_eq!(cpu.mem.read(10), 9);
        assert_eq!(cpu.output(), 9);
    }

    #[test]
    fn test_undefined_opcode_falls_through() {
        // ??? ; LDI 4 ; OUT ; HLT
        let mut cpu = boot(&[0x9f, 0x54, 0xe0, 0xf0]);

        cpu.run_to_instruction_boundary();
        assert!(cpu.executing_undefined());
        assert!(!cpu.is_halted());
        assert_eq!(cpu.pc.value(), 1);
        assert_eq!(cpu.a.value(), 0);

        cpu.run_to_halt();
        assert_eq!(cpu.output(), 4);
    }

    #[test]
    fn test_instruction_boundary_steps_one_instruction() {
        let mut cpu = boot(&[0x51, 0x52, 0x53, 0xf0]);
        for expected in 1..=3 {
            cpu.run_to_instruction_boundary();
            assert_eq!(cpu.micro_step(), 4);
            assert!(cpu.clock.level());
            assert_eq!(cpu.a.value(), expected);
            assert_eq!(cpu.pc.value(), expected);
        }
    }

    #[test]
    fn test_instruction_takes_ten_ticks() {
        let mut cpu = boot(&[0x00; 16]);
        cpu.run_to_instruction_boundary();
        let first = cpu.ticks;
        cpu.run_to_instruction_boundary();
        assert_eq!(cpu.ticks - first, 10);
    }

    #[test]
    fn test_instruction_boundary_stops_on_halt() {
        let mut cpu = boot(&[0x51, 0xf0]);
        cpu.run_to_instruction_boundary();
        cpu.run_to_instruction_boundary();
        assert!(cpu.is_halted());
        assert_eq!(cpu.micro_step(), 2);
        assert!(!cpu.at_instruction_boundary());
    }

    #[test]
    fn test_full_step_is_two_ticks() {
        let mut cpu = Cpu::new();
        cpu.full_step();
        assert_eq!(cpu.ticks, 2);
        assert!(!cpu.clock.level());
    }

    #[test]
    fn test_halt_stops_clock() {
        let mut cpu = boot(&[0xf0]);
        cpu.run_to_halt();
        let step = cpu.micro_step();
        let pc = cpu.pc.value();

        for _ in 0..10 {
            cpu.tick();
            assert!(!cpu.clock.level());
        }
        assert_eq!(cpu.micro_step(), step);
        assert_eq!(cpu.pc.value(), pc);
    }

    #[test]
    fn test_reset_clears_boards() {
        let mut cpu = boot(&[0x5f, 0x2f, 0xe0, 0xf0]);
        cpu.run_to_halt();
        assert_ne!(cpu.a.value(), 0);

        cpu.reset();
        assert!(!cpu.is_halted());
        assert_eq!(cpu.micro_step(), 0);
        assert_eq!(cpu.a.value(), 0);
        assert_eq!(cpu.b.value(), 0);
        assert_eq!(cpu.out.value(), 0);
        assert_eq!(cpu.pc.value(), 0);
        assert_eq!(cpu.mar.value(), 0);
        assert_eq!(cpu.ir.value(), 0);
        assert_eq!(cpu.flags(), Flags::default());
        assert_eq!(cpu.mem.read(0), 0x5f);
    }

    #[test]
    fn test_reset_mid_instruction_refetches_from_zero() {
        let mut cpu = boot(&[0x51, 0x52, 0x53, 0xf0]);
        cpu.run_to_instruction_boundary();
        // Clock low with step 0 driving PC=1 onto the bus.
        cpu.tick();
        assert!(!cpu.clock.level());
        assert_eq!(cpu.bus_value(), 1);

        cpu.reset();
        cpu.run_to_instruction_boundary();
        assert_eq!(cpu.a.value(), 1);
        assert_eq!(cpu.pc.value(), 1);
    }

    #[test]
    fn test_reset_takes_two_ticks() {
        let mut cpu = boot(&[0x51, 0xf0]);
        cpu.full_step();
        let before = cpu.ticks;
        cpu.reset();
        assert_eq!(cpu.ticks - before, 2);
        assert!(!cpu.control.resetting());
    }

    // The decode table never asserts two drivers; pin the order anyway.
    #[test]
    fn test_later_board_wins_the_bus() {
        let idle = ControlSignals::idle();
        let mut cpu = boot(&[0x9e]);

        // A = 0x33, B = 0x01, so the arithmetic unit holds 0x34.
        cpu.bus.drive(0x33);
        cpu.tick_boards(true, ControlSignals { a_in: true, ..idle });
        cpu.tick_boards(false, idle);
        cpu.bus.drive(0x01);
        cpu.tick_boards(true, ControlSignals { b_in: true, ..idle });
        assert_eq!((cpu.a.value(), cpu.b.value(), cpu.alu.result()), (0x33, 0x01, 0x34));

        let cases = [
            (ControlSignals { a_out: true, alu_out: true, ..idle }, 0x34),
            (ControlSignals { a_out: true, ram_out: true, ..idle }, 0x9e),
            (ControlSignals { alu_out: true, ram_out: true, ..idle }, 0x9e),
            (ControlSignals { a_out: true, pc_out: true, ..idle }, 0x00),
            (ControlSignals { ram_out: true, pc_out: true, ..idle }, 0x00),
            (ControlSignals { pc_out: true, ir_out: true, ..idle }, 0x00),
        ];
        for (signals, expected) in cases {
            cpu.bus.drive(0xaa);
            cpu.tick_boards(false, signals);
            assert_eq!(cpu.bus_value(), expected, "{}", signals);
        }

        // Memory against the instruction register operand: the register is
        // last, and its operand nibble differs from the memory cell.
        cpu.bus.drive(0x9e);
        cpu.tick_boards(true, ControlSignals { ir_in: true, ..idle });
        cpu.tick_boards(false, ControlSignals { ram_out: true, ir_out: true, ..idle });
        assert_eq!(cpu.bus_value(), 0x0e);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut cpu = boot(&[0x5f, 0x2f, 0xe0, 0xf0]);
        cpu.run_to_halt();

        cpu.reset();
        let mut once = cpu.clone();
        once.ticks = 0;

        cpu.reset();
        cpu.ticks = 0;
        assert_eq!(cpu, once);
    }

    #[test]
    fn test_run_limited_caps_endless_loop() {
        // JMP 0
        let mut cpu = boot(&[0x60]);
        let ran = cpu.run_limited(1000);
        assert_eq!(ran, 1000);
        assert!(!cpu.is_halted());
    }

    #[test]
    fn test_load_memory_reports_truncation() {
        let mut cpu = Cpu::new();
        assert!(cpu.load_memory(&[0u8; 20]));
        assert!(!cpu.load_memory(&[0u8; 16]));
    }
}
