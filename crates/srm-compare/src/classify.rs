//! Per-unit change classification.
//!
//! Given the current and comparison value of one changed unit, computes
//! the numeric shape of the change: delta, sign, magnitude, and how many
//! bits toggled.

use serde::{Deserialize, Serialize};

/// Direction of a value change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sign {
    Positive,
    Negative,
}

impl core::fmt::Display for Sign {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Sign::Positive => write!(f, "+"),
            Sign::Negative => write!(f, "-"),
        }
    }
}

/// Classification of one changed unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// `current - comparison`, widened so no width wraps.
    pub delta: i64,
    pub sign: Sign,
    pub magnitude: u64,
    /// Bits set in `current XOR comparison`.
    pub flipped_bits: u32,
    /// At most one bit toggled. A presentation heuristic for likely
    /// boolean/flag changes, not a semantic guarantee.
    pub single_bit: bool,
}

/// Classify a change between two equal-width unsigned values.
///
/// `flipped_bits` counts the bits of `current ^ comparison`, so a
/// counter wrapping at its width boundary (0xFF to 0x00) reports every
/// visibly toggled bit rather than an arithmetic carry pattern.
pub fn classify(current: u32, comparison: u32) -> Classification {
    let delta = i64::from(current) - i64::from(comparison);
    let flipped_bits = (current ^ comparison).count_ones();
    Classification {
        delta,
        sign: if delta < 0 {
            Sign::Negative
        } else {
            Sign::Positive
        },
        magnitude: delta.unsigned_abs(),
        flipped_bits,
        single_bit: flipped_bits <= 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decrement_by_one() {
        let c = classify(0x02, 0x03);
        assert_eq!(c.delta, -1);
        assert_eq!(c.sign, Sign::Negative);
        assert_eq!(c.magnitude, 1);
        assert_eq!(c.flipped_bits, 1);
        assert!(c.single_bit);
    }

    #[test]
    fn test_magnitude_is_symmetric() {
        for (a, b) in [(0u32, 0xFFFF_FFFF), (100, 3), (0x8000, 0x7FFF)] {
            assert_eq!(classify(a, b).magnitude, classify(b, a).magnitude);
        }
    }

    #[test]
    fn test_single_bit_detected_at_every_position() {
        let x = 0xA5A5_A5A5u32;
        for k in 0..32 {
            let c = classify(x, x ^ (1 << k));
            assert_eq!(c.flipped_bits, 1);
            assert!(c.single_bit, "bit {k}");
        }
    }

    #[test]
    fn test_equal_values_flip_nothing() {
        let c = classify(0x42, 0x42);
        assert_eq!(c.delta, 0);
        assert_eq!(c.sign, Sign::Positive);
        assert_eq!(c.flipped_bits, 0);
        assert!(c.single_bit);
    }

    #[test]
    fn test_byte_wraparound_counts_visible_bits() {
        // A byte counter rolling over: every bit of the byte toggles.
        let c = classify(0x00, 0xFF);
        assert_eq!(c.delta, -255);
        assert_eq!(c.magnitude, 255);
        assert_eq!(c.flipped_bits, 8);
        assert!(!c.single_bit);
    }
}
