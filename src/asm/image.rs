//! Program image files.
//!
//! An image is raw binary: one byte per memory cell, starting at address 0.
//! This is what `bbcpu-emu asm` writes and what `run` and `debug` accept
//! when the input is not assembly source.

use std::path::Path;
use thiserror::Error;

/// Read an image from disk.
///
/// The bytes are returned whole, even past 16; loading them into the machine
/// is what reports truncation.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, ImageError> {
    let bytes = std::fs::read(path.as_ref())?;
    if bytes.is_empty() {
        return Err(ImageError::Empty);
    }
    Ok(bytes)
}

/// Write an image to disk.
pub fn save_image<P: AsRef<Path>>(path: P, bytes: &[u8]) -> Result<(), ImageError> {
    std::fs::write(path.as_ref(), bytes)?;
    Ok(())
}

/// Errors that can occur while reading or writing images.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image file is empty")]
    Empty,
}
