//! Registry of VCD variable kinds and their `$var` keywords.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of variable kinds a `$var` declaration may carry.
///
/// Discriminants are the numeric type codes stored in the scope tree.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[repr(u32)]
pub enum VarType {
    /// `reg`
    Reg = 0,
    /// `uwire`
    Uwire = 1,
    /// `wire`
    Wire = 2,
    /// `tri`
    Tri = 3,
    /// `tri1`
    Tri1 = 4,
    /// `supply0`
    Supply0 = 5,
    /// `wand`
    Wand = 6,
    /// `triand`
    Triand = 7,
    /// `tri0`
    Tri0 = 8,
    /// `supply1`
    Supply1 = 9,
    /// `wor`
    Wor = 10,
    /// `trior`
    Trior = 11,
    /// `trireg`
    Trireg = 12,
    /// `integer`
    Integer = 13,
    /// `parameter`
    Parameter = 14,
    /// `real`
    Real = 15,
    /// `time`
    Time = 16,
    /// `event`
    Event = 17,
}

const ALL: [VarType; 18] = [
    VarType::Reg,
    VarType::Uwire,
    VarType::Wire,
    VarType::Tri,
    VarType::Tri1,
    VarType::Supply0,
    VarType::Wand,
    VarType::Triand,
    VarType::Tri0,
    VarType::Supply1,
    VarType::Wor,
    VarType::Trior,
    VarType::Trireg,
    VarType::Integer,
    VarType::Parameter,
    VarType::Real,
    VarType::Time,
    VarType::Event,
];

/// Type code recorded for declarations whose keyword is not in [`VarType`].
pub const UNKNOWN_TYPE_CODE: u32 = u32::MAX;

impl VarType {
    /// Returns the numeric type code.
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Looks up a variant by numeric code.
    pub fn from_code(code: u32) -> Option<Self> {
        ALL.get(code as usize).copied()
    }

    /// Parses a `$var` keyword. Matching is exact (VCD keywords are lowercase).
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        ALL.iter().copied().find(|t| t.keyword() == keyword)
    }

    /// Returns the canonical `$var` keyword.
    pub fn keyword(self) -> &'static str {
        match self {
            VarType::Reg => "reg",
            VarType::Uwire => "uwire",
            VarType::Wire => "wire",
            VarType::Tri => "tri",
            VarType::Tri1 => "tri1",
            VarType::Supply0 => "supply0",
            VarType::Wand => "wand",
            VarType::Triand => "triand",
            VarType::Tri0 => "tri0",
            VarType::Supply1 => "supply1",
            VarType::Wor => "wor",
            VarType::Trior => "trior",
            VarType::Trireg => "trireg",
            VarType::Integer => "integer",
            VarType::Parameter => "parameter",
            VarType::Real => "real",
            VarType::Time => "time",
            VarType::Event => "event",
        }
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Returns the `$var` keyword for a numeric type code.
///
/// Unknown codes yield an empty string; callers treat that as "omit".
pub fn keyword_for(code: u32) -> &'static str {
    VarType::from_code(code).map_or("", VarType::keyword)
}
