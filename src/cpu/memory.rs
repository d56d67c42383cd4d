//! Memory board.
//!
//! Sixteen bytes of RAM, addressed by the low nibble of the memory address
//! register. The address is read continuously; only writes wait for a clock
//! edge.

use crate::cpu::bus::{Bus, Edge, EdgeDetector};
use crate::cpu::signals::MemoryLines;
use serde::{Serialize, Deserialize};
use tracing::{event, Level};

/// The number of addressable memory cells.
pub const MEMORY_SIZE: usize = 16;

/// The RAM board.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Memory {
    cells: [u8; MEMORY_SIZE],
    edge: EdgeDetector,
}

impl Memory {
    /// Create a memory with all cells zeroed.
    pub const fn new() -> Self {
        Self {
            cells: [0; MEMORY_SIZE],
            edge: EdgeDetector::new(),
        }
    }

    /// Run the memory logic for one tick.
    pub fn tick(&mut self, clk: bool, address: u8, lines: MemoryLines, bus: &mut Bus) {
        let index = Self::index(address);
        if self.edge.sample(clk) == Edge::Rising && lines.write {
            self.cells[index] = bus.read();
        }
        if lines.drive {
            bus.drive(self.cells[index]);
        }
    }

    /// Overwrite memory from address 0 with `bytes`.
    ///
    /// Cells past the end of `bytes` keep their old contents. Returns `true`
    /// if `bytes` was longer than memory and only the first
    /// [`MEMORY_SIZE`] bytes were written.
    #[must_use]
    pub fn load(&mut self, bytes: &[u8]) -> bool {
        let n = bytes.len().min(MEMORY_SIZE);
        self.cells[..n].copy_from_slice(&bytes[..n]);

        let truncated = bytes.len() > MEMORY_SIZE;
        if truncated {
            event!(
                Level::WARN,
                "program image is {} bytes, only the first {} were loaded",
                bytes.len(),
                MEMORY_SIZE
            );
        }
        truncated
    }

    /// Read a cell. Only the low nibble of `address` is used.
    #[inline]
    pub fn read(&self, address: u8) -> u8 {
        self.cells[Self::index(address)]
    }

    /// Write a cell directly, bypassing the bus. Only the low nibble of
    /// `address` is used.
    #[inline]
    pub fn write(&mut self, address: u8, value: u8) {
        self.cells[Self::index(address)] = value;
    }

    /// All cells, lowest address first.
    pub fn cells(&self) -> &[u8; MEMORY_SIZE] {
        &self.cells
    }

    fn index(address: u8) -> usize {
        (address & 0x0f) as usize
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.cells.iter().filter(|c| **c != 0).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &MEMORY_SIZE)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WRITE: MemoryLines = MemoryLines { write: true, drive: false };
    const DRIVE: MemoryLines = MemoryLines { write: false, drive: true };

    #[test]
    fn test_load_truncates_long_image() {
        let mut mem = Memory::new();
        let image: Vec<u8> = (1..=20).collect();

        assert!(mem.load(&image));
        assert_eq!(mem.cells()[..], image[..16]);
    }

    #[test]
    fn test_short_load_keeps_tail() {
        let mut mem = Memory::new();
        assert!(!mem.load(&[0xaa; 16]));
        assert!(!mem.load(&[1, 2, 3, 4, 5]));

        assert_eq!(mem.cells()[..5], [1, 2, 3, 4, 5]);
        assert!(mem.cells()[5..].iter().all(|c| *c == 0xaa));
    }

    #[test]
    fn test_write_on_rising_edge_only() {
        let mut mem = Memory::new();
        let mut bus = Bus::new();
        bus.drive(0x77);

        mem.tick(false, 3, WRITE, &mut bus);
        assert_eq!(mem.read(3), 0);
        mem.tick(true, 3, WRITE, &mut bus);
        assert_eq!(mem.read(3), 0x77);
    }

    #[test]
    fn test_drive_follows_address() {
        let mut mem = Memory::new();
        let mut bus = Bus::new();
        mem.write(1, 10);
        mem.write(2, 20);

        mem.tick(false, 1, DRIVE, &mut bus);
        assert_eq!(bus.read(), 10);
        mem.tick(false, 2, DRIVE, &mut bus);
        assert_eq!(bus.read(), 20);
    }

    #[test]
    fn test_address_uses_low_nibble() {
        let mut mem = Memory::new();
        mem.write(0x13, 9);
        assert_eq!(mem.read(0x03), 9);
    }
}
