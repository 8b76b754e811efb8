//! FILENAME: engine/src/cell.rs
//! PURPOSE: Defines the fundamental data structure for a single spreadsheet cell.
//! CONTEXT: A cell bundles the user's raw source text with the parsed AST and
//! the value that AST last evaluated to, plus an error string set by a failed
//! edit or a failed recomputation. It is designed so every grid slot can hold
//! one, even when the user has never touched it.

use parser::Expression;
use serde::{Deserialize, Serialize};

/// One slot in the grid. Always present, even for cells the user has never
/// edited: a fresh cell carries empty source, the empty-string literal AST,
/// an empty-string cached value, and no error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub source: String,
    pub ast: Expression,
    pub cached_value: parser::Value,
    pub error: String,
}

impl Cell {
    /// The default cell every grid slot starts as.
    pub fn empty() -> Self {
        let ast = Expression::empty_string_literal();
        Cell {
            source: String::new(),
            cached_value: parser::Value::String(String::new()),
            ast,
            error: String::new(),
        }
    }

    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cell_matches_the_documented_invariant() {
        let cell = Cell::empty();
        assert_eq!(cell.source, "");
        assert_eq!(cell.cached_value, parser::Value::String(String::new()));
        assert_eq!(cell.error, "");
        assert!(!cell.has_error());
    }
}
