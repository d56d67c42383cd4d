//! TUI debugger for the breadboard emulator.
//!
//! Provides an interactive terminal-based debugger with:
//! - Board state and the bus, updated every tick
//! - Active control signals
//! - Memory view with disassembly
//! - Tick/step/instruction/run/breakpoint controls

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
