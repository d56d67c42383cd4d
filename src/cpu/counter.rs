//! Program counter board.

use std::fmt;
use crate::cpu::bus::{Bus, Edge, EdgeDetector};
use crate::cpu::signals::CounterLines;
use serde::{Serialize, Deserialize};

/// 4-bit wrapping program counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgramCounter {
    count: u8,
    edge: EdgeDetector,
}

impl ProgramCounter {
    pub const fn new() -> Self {
        Self { count: 0, edge: EdgeDetector::new() }
    }

    /// Run the counter for one tick.
    ///
    /// On a rising edge J loads the low nibble of the bus; otherwise CE
    /// increments modulo 16. If both were asserted together, J wins. The
    /// decode table never does that.
    pub fn tick(&mut self, clk: bool, lines: CounterLines, bus: &mut Bus) {
        if self.edge.sample(clk) == Edge::Rising {
            if lines.load {
                self.count = bus.read() & 0x0f;
            } else if lines.count {
                self.count = (self.count + 1) & 0x0f;
            }
        }
        if lines.clear {
            self.count = 0;
        }
        if lines.drive {
            bus.drive(self.count);
        }
    }

    #[inline]
    pub fn value(&self) -> u8 {
        self.count
    }
}

impl fmt::Display for ProgramCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04b}", self.count)
    }
}
