//! Assembler and disassembler for breadboard programs.
//!
//! This module provides:
//! - A two-pass assembler (text → 16-byte memory image)
//! - A disassembler (image → readable text)
//! - Raw binary image files

pub mod assembler;
pub mod disasm;
pub mod image;

pub use assembler::{assemble, AssemblerError};
pub use disasm::{disassemble, disassemble_byte};
pub use image::{load_image, save_image, ImageError};
