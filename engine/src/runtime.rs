//! FILENAME: engine/src/runtime.rs
//! PURPOSE: The per-sweep evaluation environment: a read-only view of the grid
//! plus a mutable variable-name-to-value map.
//! CONTEXT: A fresh Runtime's variable map is created before each whole-grid
//! recomputation sweep, but the same Runtime (and so the same variables) is
//! used across every cell evaluated during that sweep — an assignment made
//! while evaluating one cell is visible to cells evaluated later in the same
//! sweep. Cell contents themselves persist across sweeps; only variables are
//! reset.

use std::collections::HashMap;

use parser::Value;

use crate::evaluator::RuntimeError;
use crate::grid::Grid;

/// Binds cell lookups (borrowed from the grid) and variable names (owned,
/// mutable) for the duration of one `evaluate` call.
///
/// The grid reference and the variable map are threaded in separately
/// (rather than the Runtime owning both outright) so that a caller sweeping
/// the whole grid can re-borrow the grid immutably for each cell's
/// evaluation while still holding the one variable map, owned outside any
/// single Runtime value, across the whole sweep. See `Grid::recompute_all`.
pub struct Runtime<'g> {
    grid: &'g Grid,
    variables: &'g mut HashMap<String, Value>,
}

impl<'g> Runtime<'g> {
    pub fn new(grid: &'g Grid, variables: &'g mut HashMap<String, Value>) -> Self {
        Runtime { grid, variables }
    }

    /// Fetches a cell's cached value by address, bounds-checked.
    pub fn get_cell_value(&self, row: i64, col: i64) -> Result<Value, RuntimeError> {
        self.grid.value_at(row, col)
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// Returns a fresh copy of the named variable's value, or `Integer(0)` if
    /// it has never been assigned. Reading a variable therefore never fails.
    pub fn get_variable(&self, name: &str) -> Value {
        self.variables.get(name).cloned().unwrap_or(Value::Integer(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_variable_defaults_to_integer_zero() {
        let grid = Grid::default();
        let mut vars = HashMap::new();
        let rt = Runtime::new(&grid, &mut vars);
        assert_eq!(rt.get_variable("x"), Value::Integer(0));
    }

    #[test]
    fn set_then_get_variable_round_trips() {
        let grid = Grid::default();
        let mut vars = HashMap::new();
        let mut rt = Runtime::new(&grid, &mut vars);
        rt.set_variable("x", Value::Integer(5));
        assert_eq!(rt.get_variable("x"), Value::Integer(5));
    }
}
