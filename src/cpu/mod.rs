//! Board-level emulation of the 8-bit breadboard computer.
//!
//! This module implements every board of the machine:
//! - a shared 8-bit bus and a clock with halt input
//! - A, B and output registers, instruction register, memory address register
//! - an adder/subtractor with edge-latched carry and zero flags
//! - a 4-bit program counter and 16 bytes of RAM
//! - the control logic that sequences five micro-steps per instruction

pub mod bus;
pub mod signals;
pub mod clock;
pub mod registers;
pub mod alu;
pub mod counter;
pub mod memory;
pub mod decode;
pub mod control;
pub mod execute;

pub use bus::{Bus, Edge, EdgeDetector};
pub use signals::ControlSignals;
pub use clock::Clock;
pub use registers::{Register, InstructionRegister, AddressRegister};
pub use alu::{ArithmeticUnit, Flags};
pub use counter::ProgramCounter;
pub use memory::{Memory, MEMORY_SIZE};
pub use decode::{Instruction, Opcode};
pub use control::ControlUnit;
pub use execute::Cpu;
