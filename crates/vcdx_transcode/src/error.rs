//! Error types for VCD decoding and re-encoding.
//!
//! All errors that can stop a transcoding run are variants of
//! [`TranscodeError`]. Dropped tokens in lenient mode are not errors; they are
//! counted in the run report instead.

use std::io;

use vcdx_common::InternalError;

use crate::classify::Shape;

/// Errors that can occur while reading, classifying, or writing a VCD stream.
#[derive(Debug, thiserror::Error)]
pub enum TranscodeError {
    /// An I/O error occurred while reading the source or writing the sink.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A malformed header directive or timestamp at a specific line.
    #[error("parse error at line {line}: {message}")]
    Parse {
        /// The 1-based line number where the error occurred.
        line: usize,
        /// Description of the error.
        message: String,
    },

    /// The VCD document has a structural format error.
    #[error("format error: {0}")]
    Format(String),

    /// The source was used out of order (e.g. data read before the header).
    #[error("source protocol violation: {0}")]
    Protocol(String),

    /// A symbol was seen with a different change shape than on first sight.
    #[error("symbol '{symbol}' is registered as {existing} but appeared as {attempted}")]
    ShapeConflict {
        /// The conflicting symbol.
        symbol: String,
        /// The shape the symbol was first registered with.
        existing: Shape,
        /// The shape of the refused token.
        attempted: Shape,
    },

    /// A change token matched neither the scalar nor the vector shape.
    #[error("unrecognized change token at time {time}: '{token}'")]
    Unrecognized {
        /// Timestamp of the batch containing the token.
        time: u64,
        /// The raw token.
        token: String,
    },

    /// A vector token's bit count differs from the declared width.
    #[error(
        "width mismatch for symbol '{symbol}' at time {time}: declared {declared}, got {actual}"
    )]
    WidthMismatch {
        /// The vector symbol.
        symbol: String,
        /// Timestamp of the batch containing the token.
        time: u64,
        /// Width from the `$var` declaration.
        declared: u32,
        /// Number of bits in the token.
        actual: usize,
    },

    /// A broken internal invariant.
    #[error(transparent)]
    Internal(#[from] InternalError),
}
