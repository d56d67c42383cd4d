//! The clock board.

use serde::{Serialize, Deserialize};

/// Oscillator producing the timing reference for every other board.
///
/// One tick is half a clock period. The other boards never see the clock
/// object, only its level, and derive their own edges from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Clock {
    level: bool,
}

impl Clock {
    /// Create a clock sitting low.
    pub const fn new() -> Self {
        Self { level: false }
    }

    /// Advance half a period. While `halt` is asserted the oscillator is
    /// stopped and the output is held low.
    pub fn tick(&mut self, halt: bool) {
        self.level = if halt { false } else { !self.level };
    }

    /// Current clock level.
    #[inline]
    pub fn level(&self) -> bool {
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_toggles() {
        let mut clk = Clock::new();
        clk.tick(false);
        assert!(clk.level());
        clk.tick(false);
        assert!(!clk.level());
    }

    #[test]
    fn test_halt_forces_low() {
        let mut clk = Clock::new();
        clk.tick(false);
        assert!(clk.level());
        clk.tick(true);
        assert!(!clk.level());
        clk.tick(true);
        assert!(!clk.level());
    }
}
