//! Quadrature signal decoding.
//!
//! The two encoder lines walk a fixed 4-state Gray-code cycle; one state
//! transition per edge, four per mechanical detent on most encoders. The
//! decoder turns raw 2-bit pin codes into signed tick events and drops
//! anything else: a repeated code is contact bounce or a spurious wake, a
//! non-adjacent code means edges were missed and the direction is ambiguous.
//! Dropping beats guessing here; the ballistic tuner upstream tolerates a
//! missing tick far better than a reversed one.
//!
//! Runs in interrupt context: O(1), allocation-free, no locks.

/// Direction of one decoded tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Cw,
    Ccw,
}

impl Direction {
    /// Signed contribution to the tick accumulator.
    #[inline]
    pub fn delta(self) -> i32 {
        match self {
            Direction::Cw => 1,
            Direction::Ccw => -1,
        }
    }
}

/// Combine the two line levels into a 2-bit code: `B + 2*A`.
#[inline]
pub fn pin_code(a: bool, b: bool) -> u8 {
    u8::from(b) | (u8::from(a) << 1)
}

/// Tracks the previous 2-bit code and classifies each new sample.
#[derive(Debug, Default)]
pub struct QuadratureDecoder {
    prev_code: u8,
}

impl QuadratureDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a raw pin sample against the stored previous code.
    ///
    /// The previous code is updated unconditionally, even for a dropped
    /// transition; resynchronizing on the observed state is what lets the
    /// walk recover after missed samples.
    pub fn sample(&mut self, code: u8) -> Option<Direction> {
        let code = code & 0b11;
        let prev = self.prev_code;
        if code == prev {
            return None;
        }
        self.prev_code = code;
        // Forward Gray cycle 2 -> 3 -> 1 -> 0 -> 2, and its reverse.
        match (prev, code) {
            (2, 3) | (3, 1) | (1, 0) | (0, 2) => Some(Direction::Cw),
            (3, 2) | (1, 3) | (0, 1) | (2, 0) => Some(Direction::Ccw),
            _ => None, // skipped a code: ambiguous, drop it
        }
    }

    /// Convenience wrapper taking raw line levels.
    #[inline]
    pub fn sample_pins(&mut self, a: bool, b: bool) -> Option<Direction> {
        self.sample(pin_code(a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_forward_cycle_yields_four_cw_ticks() {
        let mut dec = QuadratureDecoder::new();
        dec.sample(2); // 0 -> 2 is itself a valid CW step; start from a known code
        let mut ticks = 0;
        for code in [3, 1, 0, 2] {
            match dec.sample(code) {
                Some(Direction::Cw) => ticks += 1,
                other => panic!("expected CW tick, got {other:?}"),
            }
        }
        assert_eq!(ticks, 4);
    }

    #[test]
    fn full_reverse_cycle_yields_ccw_ticks() {
        let mut dec = QuadratureDecoder::new();
        for code in [1, 3, 2, 0, 1] {
            let out = dec.sample(code);
            assert!(
                out.is_none() || out == Some(Direction::Ccw),
                "unexpected {out:?} on code {code}"
            );
        }
        // After resync the steady reverse walk is all CCW.
        assert_eq!(dec.sample(3), Some(Direction::Ccw));
        assert_eq!(dec.sample(2), Some(Direction::Ccw));
    }

    #[test]
    fn repeated_code_is_bounce_and_produces_nothing() {
        let mut dec = QuadratureDecoder::new();
        dec.sample(2);
        assert_eq!(dec.sample(2), None);
        assert_eq!(dec.sample(2), None);
        // The walk continues cleanly afterwards.
        assert_eq!(dec.sample(3), Some(Direction::Cw));
    }

    #[test]
    fn skipped_code_is_dropped_not_guessed() {
        let mut dec = QuadratureDecoder::new();
        dec.sample(2);
        // 2 -> 1 skips a Gray state in either direction.
        assert_eq!(dec.sample(1), None);
        // But the decoder resynced on 1, so 1 -> 0 is a clean CW step.
        assert_eq!(dec.sample(0), Some(Direction::Cw));
    }

    #[test]
    fn pin_code_packs_b_plus_two_a() {
        assert_eq!(pin_code(false, false), 0);
        assert_eq!(pin_code(false, true), 1);
        assert_eq!(pin_code(true, false), 2);
        assert_eq!(pin_code(true, true), 3);
    }
}
