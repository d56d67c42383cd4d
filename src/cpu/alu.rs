//! Arithmetic unit board.

use std::fmt;
use crate::cpu::bus::{Bus, Edge, EdgeDetector};
use crate::cpu::signals::AluLines;
use serde::{Serialize, Deserialize};

/// Carry and zero flag pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Flags {
    /// CF. For addition, the unsigned sum overflowed 8 bits. For
    /// subtraction, a borrow occurred (`a < b`).
    pub carry: bool,
    /// ZF: the result was zero.
    pub zero: bool,
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.carry, self.zero) {
            (false, false) => write!(f, "none"),
            (true, false) => write!(f, "CF"),
            (false, true) => write!(f, "ZF"),
            (true, true) => write!(f, "CF, ZF"),
        }
    }
}

/// Combinational adder/subtractor with edge-latched flags.
///
/// The result follows the A and B registers on every tick. The flags are
/// two-stage: `pending` is recomputed with the result, `committed` copies
/// `pending` only on a rising edge with FI asserted. Only the committed pair
/// is visible to the control unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArithmeticUnit {
    result: u8,
    pending: Flags,
    committed: Flags,
    edge: EdgeDetector,
}

impl ArithmeticUnit {
    pub const fn new() -> Self {
        Self {
            result: 0,
            pending: Flags { carry: false, zero: false },
            committed: Flags { carry: false, zero: false },
            edge: EdgeDetector::new(),
        }
    }

    /// Run the arithmetic unit for one tick.
    ///
    /// `a` and `b` are the live register buffers. The commit happens before
    /// the recomputation, so it latches the flags of the calculation that was
    /// on the bus when the edge arrived.
    pub fn tick(&mut self, clk: bool, lines: AluLines, a: u8, b: u8, bus: &mut Bus) {
        if self.edge.sample(clk) == Edge::Rising && lines.flags_in {
            self.committed = self.pending;
        }
        if lines.clear {
            self.committed = Flags::default();
        }

        let (result, carry) = compute(a, b, lines.subtract);
        self.result = result;
        self.pending = Flags { carry, zero: result == 0 };

        if lines.drive {
            bus.drive(self.result);
        }
    }

    /// The live combinational result.
    #[inline]
    pub fn result(&self) -> u8 {
        self.result
    }

    /// Flags of the live calculation, not yet latched.
    pub fn pending(&self) -> Flags {
        self.pending
    }

    /// Latched flags, as seen by the control unit.
    pub fn flags(&self) -> Flags {
        self.committed
    }
}

/// `a + b` or `a - b`, wrapping to 8 bits, with the carry (or borrow) bit.
pub fn compute(a: u8, b: u8, subtract: bool) -> (u8, bool) {
    if subtract {
        (a.wrapping_sub(b), a < b)
    } else {
        let sum = a as u16 + b as u16;
        (sum as u8, sum > 0xff)
    }
}

impl fmt::Display for ArithmeticUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08b} [{}]", self.result, self.committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const IDLE: AluLines = AluLines { clear: false, drive: false, subtract: false, flags_in: false };
    const LATCH: AluLines = AluLines { clear: false, drive: false, subtract: false, flags_in: true };

    #[test]
    fn test_add_overflow_sets_pending_carry() {
        let mut alu = ArithmeticUnit::new();
        let mut bus = Bus::new();
        alu.tick(false, IDLE, 0xf0, 0x10, &mut bus);
        assert_eq!(alu.result(), 0);
        assert_eq!(alu.pending(), Flags { carry: true, zero: true });
        assert_eq!(alu.flags(), Flags::default());
    }

    #[test]
    fn test_subtract_carry_is_borrow() {
        assert_eq!(compute(3, 5, true), (0xfe, true));
        assert_eq!(compute(5, 3, true), (2, false));
        assert_eq!(compute(5, 5, true), (0, false));
    }

    #[test]
    fn test_commit_uses_pending_from_before_the_edge() {
        let mut alu = ArithmeticUnit::new();
        let mut bus = Bus::new();

        // Low half: 1 - 1 = 0 is pending.
        let sub = AluLines { subtract: true, flags_in: true, ..IDLE };
        alu.tick(false, sub, 1, 1, &mut bus);
        assert!(alu.pending().zero);
        assert!(!alu.flags().zero);

        // On the edge the A register has already moved on to 0, so the
        // combinational result is now 0 - 1. The latched flags must still
        // describe 1 - 1.
        alu.tick(true, sub, 0, 1, &mut bus);
        assert_eq!(alu.flags(), Flags { carry: false, zero: true });
        assert_eq!(alu.pending(), Flags { carry: true, zero: false });
    }

    #[test]
    fn test_flags_hold_without_flag_in() {
        let mut alu = ArithmeticUnit::new();
        let mut bus = Bus::new();
        alu.tick(false, LATCH, 0, 0, &mut bus);
        alu.tick(true, LATCH, 0, 0, &mut bus);
        assert!(alu.flags().zero);

        alu.tick(false, IDLE, 1, 0, &mut bus);
        alu.tick(true, IDLE, 1, 0, &mut bus);
        assert!(alu.flags().zero);
    }

    #[test]
    fn test_clear_is_level_sensitive() {
        let mut alu = ArithmeticUnit::new();
        let mut bus = Bus::new();
        alu.tick(false, LATCH, 0xff, 0x01, &mut bus);
        alu.tick(true, LATCH, 0xff, 0x01, &mut bus);
        assert_eq!(alu.flags(), Flags { carry: true, zero: true });

        let clear = AluLines { clear: true, ..IDLE };
        alu.tick(true, clear, 0xff, 0x01, &mut bus);
        assert_eq!(alu.flags(), Flags::default());
    }

    #[test]
    fn test_drives_live_result() {
        let mut alu = ArithmeticUnit::new();
        let mut bus = Bus::new();
        let drive = AluLines { drive: true, ..IDLE };
        alu.tick(false, drive, 7, 8, &mut bus);
        assert_eq!(bus.read(), 15);
        alu.tick(false, drive, 9, 8, &mut bus);
        assert_eq!(bus.read(), 17);
    }

    proptest! {
        #[test]
        fn prop_add_matches_u16(a in any::<u8>(), b in any::<u8>()) {
            let (result, carry) = compute(a, b, false);
            prop_assert_eq!(result, a.wrapping_add(b));
            prop_assert_eq!(carry, a as u16 + b as u16 > 255);
        }

        #[test]
        fn prop_sub_borrow(a in any::<u8>(), b in any::<u8>()) {
            let (result, carry) = compute(a, b, true);
            prop_assert_eq!(result, a.wrapping_sub(b));
            prop_assert_eq!(carry, a < b);
        }
    }
}
