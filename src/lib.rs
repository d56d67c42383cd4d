//! # Breadboard CPU Emulator
//!
//! A board-level emulator of the classic 8-bit breadboard computer.
//!
//! Every board (registers, arithmetic unit, program counter, memory and the
//! control logic) is modelled separately and connected through one shared
//! bus. The machine advances in half clock periods, so edge timing is
//! reproduced rather than just instruction semantics.

pub mod cpu;
pub mod asm;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use cpu::{Cpu, ControlSignals, Flags, Instruction, Memory, Opcode, MEMORY_SIZE};
pub use asm::{assemble, disassemble, AssemblerError, ImageError, load_image, save_image};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
