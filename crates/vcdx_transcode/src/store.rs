//! Per-signal, append-only change logs.
//!
//! The store keeps one table of scalar logs and one table of vector logs,
//! addressed through the [`SignalRegistry`]. Every observed change is kept,
//! including repeats of the previous value.

use serde::Serialize;
use vcdx_common::{InternalError, Logic, VcdxResult};

use crate::classify::{Change, Shape};
use crate::error::TranscodeError;
use crate::registry::{SignalRegistry, SlotRef};

/// One entry of a signal's log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChangeRecord<V> {
    /// Timestamp of the batch the change appeared in.
    pub time: u64,
    /// The new value.
    pub value: V,
}

/// A scalar log entry.
pub type ScalarChange = ChangeRecord<Logic>;
/// A vector log entry, bits most-significant first.
pub type VectorChange = ChangeRecord<Vec<Logic>>;

/// Read view of one signal's log.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignalLog<'a> {
    /// Log of a scalar signal.
    Scalar(&'a [ScalarChange]),
    /// Log of a vector signal.
    Vector(&'a [VectorChange]),
}

impl SignalLog<'_> {
    /// Number of records.
    pub fn len(&self) -> usize {
        match self {
            SignalLog::Scalar(log) => log.len(),
            SignalLog::Vector(log) => log.len(),
        }
    }

    /// Returns `true` if no change was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Timestamps in append order.
    pub fn times(&self) -> Vec<u64> {
        match self {
            SignalLog::Scalar(log) => log.iter().map(|r| r.time).collect(),
            SignalLog::Vector(log) => log.iter().map(|r| r.time).collect(),
        }
    }
}

/// Summary of one signal for reports.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SignalSummary {
    /// Identifier code.
    pub symbol: String,
    /// Table the signal lives in.
    pub shape: Shape,
    /// Index within that table.
    pub slot: usize,
    /// Number of recorded changes.
    pub changes: usize,
    /// Timestamp of the first change.
    pub first_time: Option<u64>,
    /// Timestamp of the last change.
    pub last_time: Option<u64>,
}

/// The scalar and vector change-log tables plus their registry.
#[derive(Debug, Default)]
pub struct ChangeLogStore {
    registry: SignalRegistry,
    scalar: Vec<Vec<ScalarChange>>,
    vector: Vec<Vec<VectorChange>>,
    total: usize,
}

impl ChangeLogStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a classified change at `time`, creating the slot on first use.
    ///
    /// # Errors
    ///
    /// Returns [`TranscodeError::ShapeConflict`] if the symbol already lives
    /// in the other table; nothing is recorded in that case.
    pub fn record(&mut self, time: u64, change: Change<'_>) -> Result<SlotRef, TranscodeError> {
        let slot = self
            .registry
            .resolve_or_create(change.symbol(), change.shape())?;
        match change {
            Change::Scalar { value, .. } => {
                let log = slot_log(&mut self.scalar, slot)?;
                log.push(ChangeRecord { time, value });
            }
            Change::Vector { bits, .. } => {
                let log = slot_log(&mut self.vector, slot)?;
                log.push(ChangeRecord { time, value: bits });
            }
        }
        self.total += 1;
        Ok(slot)
    }

    /// The log of a symbol, if it has been seen.
    pub fn log_for(&self, symbol: &str) -> Option<SignalLog<'_>> {
        let slot = self.registry.slot_of(symbol)?;
        match slot.shape {
            Shape::Scalar => self.scalar_log(slot.index).map(SignalLog::Scalar),
            Shape::Vector => self.vector_log(slot.index).map(SignalLog::Vector),
        }
    }

    /// Scalar log by slot index.
    pub fn scalar_log(&self, index: usize) -> Option<&[ScalarChange]> {
        self.scalar.get(index).map(Vec::as_slice)
    }

    /// Vector log by slot index.
    pub fn vector_log(&self, index: usize) -> Option<&[VectorChange]> {
        self.vector.get(index).map(Vec::as_slice)
    }

    /// The registry resolving symbols to slots.
    pub fn registry(&self) -> &SignalRegistry {
        &self.registry
    }

    /// Slot of a symbol, if seen.
    pub fn slot_of(&self, symbol: &str) -> Option<SlotRef> {
        self.registry.slot_of(symbol)
    }

    /// Table of a symbol, if seen.
    pub fn shape_of(&self, symbol: &str) -> Option<Shape> {
        self.registry.shape_of(symbol)
    }

    /// Number of scalar signals.
    pub fn scalar_count(&self) -> usize {
        self.scalar.len()
    }

    /// Number of vector signals.
    pub fn vector_count(&self) -> usize {
        self.vector.len()
    }

    /// Number of records across both tables.
    pub fn total_changes(&self) -> usize {
        self.total
    }

    /// Per-signal summaries, scalars first, each table in slot order.
    pub fn summaries(&self) -> Vec<SignalSummary> {
        let scalars = self
            .registry
            .scalar_symbols()
            .iter()
            .zip(&self.scalar)
            .enumerate()
            .map(|(slot, (symbol, log))| SignalSummary {
                symbol: symbol.clone(),
                shape: Shape::Scalar,
                slot,
                changes: log.len(),
                first_time: log.first().map(|r| r.time),
                last_time: log.last().map(|r| r.time),
            });
        let vectors = self
            .registry
            .vector_symbols()
            .iter()
            .zip(&self.vector)
            .enumerate()
            .map(|(slot, (symbol, log))| SignalSummary {
                symbol: symbol.clone(),
                shape: Shape::Vector,
                slot,
                changes: log.len(),
                first_time: log.first().map(|r| r.time),
                last_time: log.last().map(|r| r.time),
            });
        scalars.chain(vectors).collect()
    }
}

/// Returns the log for `slot`, growing the table by one for a fresh slot.
fn slot_log<V>(table: &mut Vec<Vec<V>>, slot: SlotRef) -> VcdxResult<&mut Vec<V>> {
    if slot.index == table.len() {
        table.push(Vec::new());
    }
    let len = table.len();
    table.get_mut(slot.index).ok_or_else(|| {
        InternalError::new(format!(
            "{} slot {} beyond table of {len}",
            slot.shape, slot.index
        ))
    })
}
