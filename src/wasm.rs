//! WebAssembly bindings for the breadboard emulator.
//!
//! This module provides JavaScript-friendly wrappers around the core emulator.

use wasm_bindgen::prelude::*;
use js_sys::Uint8Array;
use crate::Cpu;
use crate::asm::assembler::assemble;
use crate::asm::disasm::disassemble_byte;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WebAssembly-friendly CPU wrapper.
#[wasm_bindgen]
pub struct WasmCpu {
    cpu: Cpu,
    program: Vec<u8>,
}

#[wasm_bindgen]
impl WasmCpu {
    /// Create a new CPU instance.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            cpu: Cpu::new(),
            program: Vec::new(),
        }
    }

    /// Assemble source code and load the image. Returns the image size.
    #[wasm_bindgen]
    pub fn load_asm(&mut self, source: &str) -> Result<usize, JsError> {
        let image = assemble(source)
            .map_err(|e| JsError::new(&format!("{}", e)))?;

        self.load_bytes(&image);
        Ok(image.len())
    }

    /// Load a raw memory image into a fresh machine.
    ///
    /// Returns `true` if the image was truncated to fit memory.
    #[wasm_bindgen]
    pub fn load_bytes(&mut self, bytes: &[u8]) -> bool {
        self.program = bytes.to_vec();
        self.cpu = Cpu::new();
        self.cpu.load_memory(bytes)
    }

    /// Advance half a clock period.
    #[wasm_bindgen]
    pub fn tick(&mut self) {
        self.cpu.tick();
    }

    /// Advance one full clock period.
    #[wasm_bindgen]
    pub fn full_step(&mut self) {
        self.cpu.full_step();
    }

    /// Run to the end of the current instruction. Returns its disassembly.
    #[wasm_bindgen]
    pub fn instruction(&mut self) -> Result<String, JsError> {
        if self.cpu.is_halted() {
            return Err(JsError::new("CPU is halted"));
        }

        self.cpu.run_to_instruction_boundary();
        Ok(disassemble_byte(self.cpu.ir.value()))
    }

    /// Run until halt or `max_ticks`. Returns the ticks executed.
    #[wasm_bindgen]
    pub fn run(&mut self, max_ticks: u32) -> u64 {
        self.cpu.run_limited(max_ticks as u64)
    }

    /// Reload the program and pulse reset.
    ///
    /// Returns `true` if the reloaded image was truncated to fit memory.
    #[wasm_bindgen]
    pub fn reset(&mut self) -> bool {
        let truncated = self.cpu.load_memory(&self.program);
        self.cpu.reset();
        truncated
    }

    #[wasm_bindgen]
    pub fn is_halted(&self) -> bool {
        self.cpu.is_halted()
    }

    /// Ticks since power-up.
    #[wasm_bindgen]
    pub fn ticks(&self) -> u64 {
        self.cpu.ticks
    }

    #[wasm_bindgen]
    pub fn clock(&self) -> bool {
        self.cpu.clock.level()
    }

    #[wasm_bindgen]
    pub fn micro_step(&self) -> u8 {
        self.cpu.micro_step()
    }

    #[wasm_bindgen]
    pub fn bus(&self) -> u8 {
        self.cpu.bus_value()
    }

    #[wasm_bindgen]
    pub fn a(&self) -> u8 {
        self.cpu.a.value()
    }

    #[wasm_bindgen]
    pub fn b(&self) -> u8 {
        self.cpu.b.value()
    }

    #[wasm_bindgen]
    pub fn alu(&self) -> u8 {
        self.cpu.alu.result()
    }

    #[wasm_bindgen]
    pub fn pc(&self) -> u8 {
        self.cpu.pc.value()
    }

    #[wasm_bindgen]
    pub fn mar(&self) -> u8 {
        self.cpu.mar.value()
    }

    #[wasm_bindgen]
    pub fn ir(&self) -> u8 {
        self.cpu.ir.value()
    }

    /// The output register.
    #[wasm_bindgen]
    pub fn output(&self) -> u8 {
        self.cpu.output()
    }

    #[wasm_bindgen]
    pub fn carry(&self) -> bool {
        self.cpu.flags().carry
    }

    #[wasm_bindgen]
    pub fn zero(&self) -> bool {
        self.cpu.flags().zero
    }

    /// Active control signals, e.g. "MI, CO".
    #[wasm_bindgen]
    pub fn signals(&self) -> String {
        self.cpu.control.signals().to_string()
    }

    /// All of memory as a byte array.
    #[wasm_bindgen]
    pub fn memory(&self) -> Uint8Array {
        Uint8Array::from(&self.cpu.mem.cells()[..])
    }

    /// Get the whole machine as a JSON string.
    #[wasm_bindgen]
    pub fn state_json(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.cpu)
            .map_err(|e| JsError::new(&format!("{}", e)))
    }
}

impl Default for WasmCpu {
    fn default() -> Self {
        Self::new()
    }
}

/// Assemble source code and return the memory image.
#[wasm_bindgen]
pub fn wasm_assemble(source: &str) -> Result<Vec<u8>, JsError> {
    let image = assemble(source)
        .map_err(|e| JsError::new(&format!("{}", e)))?;
    Ok(image.to_vec())
}

/// Disassemble a single byte.
#[wasm_bindgen]
pub fn wasm_disassemble(value: u8) -> String {
    disassemble_byte(value)
}
