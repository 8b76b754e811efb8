//! FILENAME: engine/src/grid.rs
//! PURPOSE: Manages the collection of cells (the spreadsheet grid).
//! CONTEXT: Every slot in the grid exists from construction — unlike a
//! sparse map keyed by coordinate, a fresh Grid already holds a default
//! Cell at every (row, col). Bounds are fixed at construction; there is no
//! dynamic growth.

use std::collections::HashMap;

use log::warn;
use parser::Value;

use crate::cell::Cell;
use crate::evaluator::{evaluate, RuntimeError};
use crate::runtime::Runtime;

pub const DEFAULT_ROWS: i64 = 20;
pub const DEFAULT_COLS: i64 = 13;

/// A dense, fixed-size grid of cells addressed by 0-based (row, col).
#[derive(Debug, Clone)]
pub struct Grid {
    rows: i64,
    cols: i64,
    cells: Vec<Vec<Cell>>,
}

impl Grid {
    pub fn new(rows: i64, cols: i64) -> Self {
        let cells = (0..rows).map(|_| (0..cols).map(|_| Cell::empty()).collect()).collect();
        Grid { rows, cols, cells }
    }

    pub fn rows(&self) -> i64 {
        self.rows
    }

    pub fn cols(&self) -> i64 {
        self.cols
    }

    pub fn in_bounds(&self, row: i64, col: i64) -> bool {
        row >= 0 && row < self.rows && col >= 0 && col < self.cols
    }

    pub fn get_cell(&self, row: i64, col: i64) -> &Cell {
        &self.cells[row as usize][col as usize]
    }

    /// Installs new source text, AST, and error state for one cell. Does
    /// not itself re-evaluate the grid; callers trigger a `recompute_all`
    /// afterward so the new AST's cached value (and any cells that
    /// reference it) are brought up to date.
    pub fn set_cell(&mut self, row: i64, col: i64, source: String, ast: parser::Expression, error: String) {
        let cell = &mut self.cells[row as usize][col as usize];
        cell.source = source;
        cell.ast = ast;
        cell.error = error;
    }

    /// Returns a cell's last-computed value without re-evaluating anything.
    pub fn value_at(&self, row: i64, col: i64) -> Result<Value, RuntimeError> {
        if !self.in_bounds(row, col) {
            return Err(RuntimeError::new("Cell address out of range"));
        }
        Ok(self.get_cell(row, col).cached_value.clone())
    }

    /// Re-evaluates every cell's AST, in row-major order, updating each
    /// cell's cached value and error in place as it goes. A cell is
    /// evaluated against the grid as it stands *during* this sweep, so a
    /// cell can see values already refreshed earlier in the same pass but
    /// still-stale values for cells later in the sweep — matching the
    /// in-place, single-pass update this mirrors.
    ///
    /// A cell whose evaluation fails does not abort the sweep: its cached
    /// value becomes the "NULL" string sentinel, its error is recorded, and
    /// the sweep continues to the next cell.
    pub fn recompute_all(&mut self) {
        let mut variables: HashMap<String, Value> = HashMap::new();
        for row in 0..self.rows {
            for col in 0..self.cols {
                let ast = self.cells[row as usize][col as usize].ast.clone();

                // A cell carrying the null-literal sentinel AST got there
                // because `edit_cell` failed to lex/parse its source and
                // recorded that error on the cell. That sentinel itself
                // evaluates successfully to `String("NULL")`, so without
                // this guard the Ok-branch below would wipe the just-stored
                // edit-time error on the very next sweep. Preserve it; only
                // a runtime-evaluation outcome should drive the error field
                // from here on.
                let edit_time_error = if ast.is_null_sentinel() {
                    let existing = &self.cells[row as usize][col as usize].error;
                    (!existing.is_empty()).then(|| existing.clone())
                } else {
                    None
                };

                let result = {
                    let grid_ref: &Grid = self;
                    let mut rt = Runtime::new(grid_ref, &mut variables);
                    evaluate(&ast, &mut rt)
                };
                let cell = &mut self.cells[row as usize][col as usize];
                match result {
                    Ok(value) => {
                        cell.cached_value = value;
                        if let Some(error) = edit_time_error {
                            cell.error = error;
                        } else {
                            cell.error.clear();
                        }
                    }
                    Err(e) => {
                        warn!("cell ({}, {}) failed to evaluate: {}", row, col, e.message);
                        cell.cached_value = Value::String("NULL".to_string());
                        cell.error = e.message;
                    }
                }
            }
        }
    }
}

impl Default for Grid {
    fn default() -> Self {
        Grid::new(DEFAULT_ROWS, DEFAULT_COLS)
    }
}
