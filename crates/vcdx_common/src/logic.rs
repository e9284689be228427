//! Four-state logic codes as they appear in VCD value changes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single 4-state value code decoded from a VCD change token.
///
/// The discriminants match the compact codes stored in change logs:
/// - `Zero` (0): driven low
/// - `One` (1): driven high
/// - `X` (2): unknown or uninitialized
/// - `Z` (3): high-impedance
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[repr(u8)]
pub enum Logic {
    /// Logic low (0).
    Zero = 0,
    /// Logic high (1).
    One = 1,
    /// Unknown or uninitialized.
    X = 2,
    /// High-impedance (tri-state).
    Z = 3,
}

impl Logic {
    /// Converts a character to a [`Logic`] value.
    ///
    /// Accepts '0', '1', 'x'/'X', and 'z'/'Z'.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0' => Some(Logic::Zero),
            '1' => Some(Logic::One),
            'x' | 'X' => Some(Logic::X),
            'z' | 'Z' => Some(Logic::Z),
            _ => None,
        }
    }

    /// Returns the lowercase VCD character for this value.
    pub fn to_char(self) -> char {
        match self {
            Logic::Zero => '0',
            Logic::One => '1',
            Logic::X => 'x',
            Logic::Z => 'z',
        }
    }

    /// Returns the compact numeric code (0..=3).
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Decodes a string of value characters, MSB first.
    ///
    /// Returns `None` if any character is outside the 4-value alphabet.
    pub fn decode_bits(bits: &str) -> Option<Vec<Logic>> {
        bits.chars().map(Logic::from_char).collect()
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Logic::Zero => write!(f, "0"),
            Logic::One => write!(f, "1"),
            Logic::X => write!(f, "X"),
            Logic::Z => write!(f, "Z"),
        }
    }
}
