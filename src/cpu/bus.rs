//! The shared data bus and clock-edge detection.
//!
//! Every board talks to every other board through one 8-bit cell. The cell
//! itself enforces nothing: at most one board drives it per tick, and that
//! discipline lives entirely in the control unit's decode table.

use serde::{Serialize, Deserialize};

/// The shared 8-bit data bus.
///
/// The bus holds the last value driven onto it until some board drives it
/// again. Boards that capture on a rising edge run before the driving board
/// in the tick order, so they latch the value driven during the previous
/// half period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Bus {
    value: u8,
}

impl Bus {
    /// Create an idle bus holding zero.
    pub const fn new() -> Self {
        Self { value: 0 }
    }

    /// Sample the bus.
    #[inline]
    pub fn read(&self) -> u8 {
        self.value
    }

    /// Drive a value onto the bus.
    ///
    /// If two boards drive in the same tick the later one in the tick order
    /// wins.
    #[inline]
    pub fn drive(&mut self, value: u8) {
        self.value = value;
    }
}

/// A clock transition seen between two consecutive ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Low to high.
    Rising,
    /// High to low.
    Falling,
    /// No transition.
    Steady,
}

/// Per-board memory of the previous clock level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EdgeDetector {
    previous: bool,
}

impl EdgeDetector {
    pub const fn new() -> Self {
        Self { previous: false }
    }

    /// Compare `level` against the level seen on the previous call and
    /// remember it for the next one.
    pub fn sample(&mut self, level: bool) -> Edge {
        let edge = match (self.previous, level) {
            (false, true) => Edge::Rising,
            (true, false) => Edge::Falling,
            _ => Edge::Steady,
        };
        self.previous = level;
        edge
    }
}
