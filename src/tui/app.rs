//! Debugger application state and logic.

use crate::Cpu;
use crate::asm::disasm::disassemble_byte;
use crate::cpu::MEMORY_SIZE;
use std::collections::HashSet;

/// One row of the memory view.
pub struct MemoryRow {
    pub addr: u8,
    pub value: u8,
    pub text: String,
    pub is_pc: bool,
    pub is_mar: bool,
}

/// Debugger application state.
pub struct DebuggerApp {
    /// The machine being debugged.
    pub cpu: Cpu,
    /// Original image, reloaded on reset.
    pub program: Vec<u8>,
    /// Breakpoints (by address of the next fetch).
    pub breakpoints: HashSet<u8>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
}

impl DebuggerApp {
    /// Create a new debugger with a loaded program.
    pub fn new(program: Vec<u8>) -> Self {
        let mut app = Self {
            cpu: Cpu::new(),
            program,
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status: String::new(),
        };
        if !app.load_program() {
            app.status =
                "Ready. Press 't' to tick, 'i' for an instruction, 'r' to run, 'q' to quit.".into();
        }
        app
    }

    /// Copy the program into memory. On truncation, says so in the status
    /// line and returns `true`.
    fn load_program(&mut self) -> bool {
        let truncated = self.cpu.load_memory(&self.program);
        if truncated {
            self.status = format!(
                "Image is {} bytes, truncated to {}.",
                self.program.len(),
                MEMORY_SIZE
            );
        }
        truncated
    }

    /// Advance half a clock period.
    pub fn tick(&mut self) {
        if self.check_halted() {
            return;
        }
        self.cpu.tick();
        self.status = format!("Tick {}: {}", self.cpu.ticks, self.cpu.control);
    }

    /// Advance one full clock period.
    pub fn full_step(&mut self) {
        if self.check_halted() {
            return;
        }
        self.cpu.full_step();
        self.status = format!("Tick {}: {}", self.cpu.ticks, self.cpu.control);
    }

    /// Advance to the end of the current instruction.
    pub fn instruction(&mut self) {
        if self.check_halted() {
            return;
        }
        let pc = self.cpu.pc.value();
        self.cpu.run_to_instruction_boundary();
        let instr = disassemble_byte(self.cpu.ir.value());
        self.status = format!("PC={:02}: {}", pc, instr);
        if self.cpu.executing_undefined() {
            self.status.push_str(" (undefined, ran as NOP)");
        }
    }

    /// Run until halt or breakpoint.
    pub fn run(&mut self) {
        self.running = true;
        self.status = "Running...".into();
    }

    /// Pause continuous execution.
    pub fn pause(&mut self) {
        self.running = false;
        self.status = "Paused.".into();
    }

    /// Run one instruction of continuous execution.
    pub fn advance(&mut self) {
        if !self.running {
            return;
        }

        if self.cpu.is_halted() {
            self.running = false;
            self.status = format!("Halted after {} ticks, OUT={}", self.cpu.ticks, self.cpu.output());
            return;
        }

        self.instruction();

        // The next fetch starts one tick after the boundary.
        let next = self.cpu.pc.value();
        if self.cpu.at_instruction_boundary() && self.breakpoints.contains(&next) {
            self.running = false;
            self.status = format!("Breakpoint at PC={}", next);
        }
    }

    /// Toggle breakpoint at current PC.
    pub fn toggle_breakpoint(&mut self) {
        let pc = self.cpu.pc.value();
        if self.breakpoints.remove(&pc) {
            self.status = format!("Removed breakpoint at PC={}", pc);
        } else {
            self.breakpoints.insert(pc);
            self.status = format!("Set breakpoint at PC={}", pc);
        }
    }

    /// Reload the program and pulse reset.
    pub fn reset(&mut self) {
        self.running = false;
        if !self.load_program() {
            self.status = "Reset. Ready.".into();
        }
        self.cpu.reset();
    }

    /// Every memory cell with its disassembly.
    pub fn memory_view(&self) -> Vec<MemoryRow> {
        let pc = self.cpu.pc.value();
        let mar = self.cpu.mar.value();

        self.cpu
            .mem
            .cells()
            .iter()
            .enumerate()
            .map(|(addr, value)| {
                let addr = addr as u8;
                MemoryRow {
                    addr,
                    value: *value,
                    text: disassemble_byte(*value),
                    is_pc: addr == pc,
                    is_mar: addr == mar,
                }
            })
            .collect()
    }

    fn check_halted(&mut self) -> bool {
        if self.cpu.is_halted() {
            self.status = format!("Halted. OUT={}. Press 'x' to reset.", self.cpu.output());
            self.running = false;
            true
        } else {
            false
        }
    }
}

/// Run the debugger with a program image.
pub fn run_debugger(program: Vec<u8>) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = DebuggerApp::new(program);

    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('t') => {
                            app.running = false;
                            app.tick();
                        }
                        KeyCode::Char('s') => {
                            app.running = false;
                            app.full_step();
                        }
                        KeyCode::Char('i') => {
                            app.running = false;
                            app.instruction();
                        }
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => app.pause(),
                        KeyCode::Char('b') => app.toggle_breakpoint(),
                        KeyCode::Char('x') => app.reset(),
                        _ => {}
                    }
                }
            }
        }

        if app.running {
            app.advance();
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}
