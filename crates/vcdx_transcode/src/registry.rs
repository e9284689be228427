//! Symbol-to-slot registry for the change-log tables.
//!
//! Every symbol gets a dense index in exactly one table (scalar or vector) the
//! first time it is seen. The index never changes for the rest of the run and
//! the symbol can never move to the other table.

use std::collections::HashMap;

use serde::Serialize;

use crate::classify::Shape;
use crate::error::TranscodeError;

/// A resolved log slot: which table and which index within it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
pub struct SlotRef {
    /// The table the slot lives in.
    pub shape: Shape,
    /// Dense index within that table.
    pub index: usize,
}

/// Owns the `symbol → index` maps for both tables and the `symbol → shape` map.
#[derive(Debug, Default)]
pub struct SignalRegistry {
    scalar_index: HashMap<String, usize>,
    vector_index: HashMap<String, usize>,
    shapes: HashMap<String, Shape>,
    scalar_symbols: Vec<String>,
    vector_symbols: Vec<String>,
}

impl SignalRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the slot for `symbol`, allocating the next index in the
    /// `shape` table on first sight.
    ///
    /// # Errors
    ///
    /// Returns [`TranscodeError::ShapeConflict`] if the symbol is already
    /// registered with the other shape. The registry is left unchanged.
    pub fn resolve_or_create(
        &mut self,
        symbol: &str,
        shape: Shape,
    ) -> Result<SlotRef, TranscodeError> {
        if let Some(&existing) = self.shapes.get(symbol) {
            if existing != shape {
                return Err(TranscodeError::ShapeConflict {
                    symbol: symbol.to_string(),
                    existing,
                    attempted: shape,
                });
            }
        }

        let (index_map, symbols) = match shape {
            Shape::Scalar => (&mut self.scalar_index, &mut self.scalar_symbols),
            Shape::Vector => (&mut self.vector_index, &mut self.vector_symbols),
        };
        if let Some(&index) = index_map.get(symbol) {
            return Ok(SlotRef { shape, index });
        }

        let index = symbols.len();
        symbols.push(symbol.to_string());
        index_map.insert(symbol.to_string(), index);
        self.shapes.insert(symbol.to_string(), shape);
        Ok(SlotRef { shape, index })
    }

    /// Looks up an existing slot without allocating.
    pub fn slot_of(&self, symbol: &str) -> Option<SlotRef> {
        let shape = *self.shapes.get(symbol)?;
        let index = match shape {
            Shape::Scalar => self.scalar_index.get(symbol),
            Shape::Vector => self.vector_index.get(symbol),
        }?;
        Some(SlotRef {
            shape,
            index: *index,
        })
    }

    /// The table a symbol was registered in, if seen.
    pub fn shape_of(&self, symbol: &str) -> Option<Shape> {
        self.shapes.get(symbol).copied()
    }

    /// The symbol that owns a slot.
    pub fn symbol_at(&self, slot: SlotRef) -> Option<&str> {
        let symbols = match slot.shape {
            Shape::Scalar => &self.scalar_symbols,
            Shape::Vector => &self.vector_symbols,
        };
        symbols.get(slot.index).map(String::as_str)
    }

    /// Number of scalar slots allocated.
    pub fn scalar_count(&self) -> usize {
        self.scalar_symbols.len()
    }

    /// Number of vector slots allocated.
    pub fn vector_count(&self) -> usize {
        self.vector_symbols.len()
    }

    /// Scalar symbols in slot order.
    pub fn scalar_symbols(&self) -> &[String] {
        &self.scalar_symbols
    }

    /// Vector symbols in slot order.
    pub fn vector_symbols(&self) -> &[String] {
        &self.vector_symbols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_seen_order_is_dense() {
        let mut reg = SignalRegistry::new();
        assert_eq!(reg.resolve_or_create("!", Shape::Scalar).unwrap().index, 0);
        assert_eq!(reg.resolve_or_create("\"", Shape::Scalar).unwrap().index, 1);
        assert_eq!(reg.resolve_or_create("#", Shape::Scalar).unwrap().index, 2);
        assert_eq!(reg.scalar_count(), 3);
        assert_eq!(reg.scalar_symbols(), ["!", "\"", "#"]);
    }

    #[test]
    fn repeat_sighting_reuses_slot() {
        let mut reg = SignalRegistry::new();
        let a = reg.resolve_or_create("!", Shape::Scalar).unwrap();
        reg.resolve_or_create("\"", Shape::Scalar).unwrap();
        let again = reg.resolve_or_create("!", Shape::Scalar).unwrap();
        assert_eq!(a, again);
        assert_eq!(reg.scalar_count(), 2);
    }

    #[test]
    fn tables_are_indexed_independently() {
        let mut reg = SignalRegistry::new();
        reg.resolve_or_create("!", Shape::Scalar).unwrap();
        let v = reg.resolve_or_create("%", Shape::Vector).unwrap();
        let s = reg.resolve_or_create("\"", Shape::Scalar).unwrap();
        assert_eq!(v, SlotRef { shape: Shape::Vector, index: 0 });
        assert_eq!(s, SlotRef { shape: Shape::Scalar, index: 1 });
    }

    #[test]
    fn scalar_then_vector_conflicts() {
        let mut reg = SignalRegistry::new();
        reg.resolve_or_create("!", Shape::Scalar).unwrap();
        let err = reg.resolve_or_create("!", Shape::Vector).unwrap_err();
        assert!(matches!(
            err,
            TranscodeError::ShapeConflict {
                existing: Shape::Scalar,
                attempted: Shape::Vector,
                ..
            }
        ));
        assert_eq!(reg.vector_count(), 0);
        assert_eq!(reg.shape_of("!"), Some(Shape::Scalar));
    }

    #[test]
    fn vector_then_scalar_conflicts() {
        let mut reg = SignalRegistry::new();
        reg.resolve_or_create("!A", Shape::Vector).unwrap();
        assert!(reg.resolve_or_create("!A", Shape::Scalar).is_err());
        assert_eq!(reg.scalar_count(), 0);
    }

    #[test]
    fn lookups() {
        let mut reg = SignalRegistry::new();
        let slot = reg.resolve_or_create("!A", Shape::Vector).unwrap();
        assert_eq!(reg.slot_of("!A"), Some(slot));
        assert_eq!(reg.symbol_at(slot), Some("!A"));
        assert_eq!(reg.slot_of("?"), None);
        assert_eq!(reg.shape_of("?"), None);
        assert_eq!(
            reg.symbol_at(SlotRef { shape: Shape::Scalar, index: 0 }),
            None
        );
    }
}
