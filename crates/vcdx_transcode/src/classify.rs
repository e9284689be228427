//! Classification of raw value-change tokens.
//!
//! A token is classified from its first character alone:
//! - `0`, `1`, `x`, `z` (either case): a scalar change, the rest is the symbol;
//! - `b` / `B`: a vector change, `b<bits> <symbol>`;
//! - anything else: unrecognized (real values, stray directives, garbage).

use std::fmt;

use serde::{Deserialize, Serialize};
use vcdx_common::Logic;

/// Which log table a signal lives in.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    /// One-bit signal, single-character changes.
    Scalar,
    /// Multi-bit signal, `b`-prefixed changes.
    Vector,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Scalar => f.write_str("scalar"),
            Shape::Vector => f.write_str("vector"),
        }
    }
}

/// How the symbol of a vector token is extracted after the last whitespace.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SymbolPolicy {
    /// Every character after the separator.
    #[default]
    Trailing,
    /// At most this many characters after the separator.
    Fixed(usize),
}

/// A decoded value change borrowing its symbol from the raw token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Change<'a> {
    /// `<value><symbol>`
    Scalar {
        /// Identifier code of the signal.
        symbol: &'a str,
        /// New value.
        value: Logic,
    },
    /// `b<bits> <symbol>`
    Vector {
        /// Identifier code of the signal.
        symbol: &'a str,
        /// New value, most-significant bit first.
        bits: Vec<Logic>,
    },
}

impl<'a> Change<'a> {
    /// The signal symbol.
    pub fn symbol(&self) -> &'a str {
        match self {
            Change::Scalar { symbol, .. } | Change::Vector { symbol, .. } => *symbol,
        }
    }

    /// The change shape.
    pub fn shape(&self) -> Shape {
        match self {
            Change::Scalar { .. } => Shape::Scalar,
            Change::Vector { .. } => Shape::Vector,
        }
    }
}

/// Classifies one raw change token.
///
/// Returns `None` for tokens matching neither shape.
pub fn classify(token: &str, policy: SymbolPolicy) -> Option<Change<'_>> {
    let mut chars = token.chars();
    let first = chars.next()?;

    if let Some(value) = Logic::from_char(first) {
        let symbol = chars.as_str();
        if symbol.is_empty() {
            return None;
        }
        return Some(Change::Scalar { symbol, value });
    }

    if first == 'b' || first == 'B' {
        return classify_vector(chars.as_str(), policy);
    }

    None
}

fn classify_vector(tail: &str, policy: SymbolPolicy) -> Option<Change<'_>> {
    let (sep, sep_char) = tail.char_indices().rev().find(|(_, c)| c.is_whitespace())?;
    let bits = tail[..sep].trim_end();
    let after = &tail[sep + sep_char.len_utf8()..];
    let symbol = match policy {
        SymbolPolicy::Trailing => after,
        SymbolPolicy::Fixed(n) => match after.char_indices().nth(n) {
            Some((end, _)) => &after[..end],
            None => after,
        },
    };
    if bits.is_empty() || symbol.is_empty() {
        return None;
    }
    let bits = Logic::decode_bits(bits)?;
    Some(Change::Vector { symbol, bits })
}
