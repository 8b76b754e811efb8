//! FILENAME: engine/src/session.rs
//! PURPOSE: The façade a driver (terminal UI, CLI, or test) talks to: edit a
//! cell's source text and read back what it renders as.
//! CONTEXT: Mirrors the edit flow of a cell-editing keystroke handler: lex
//! and parse the new source; on success install the AST and clear any
//! error; on failure install the empty/"NULL" literal AST and record the
//! error message verbatim; then always resweep the whole grid so every
//! cell's cached value is brought up to date.

use log::debug;

use crate::grid::Grid;

pub struct Session {
    grid: Grid,
}

impl Session {
    pub fn new(rows: i64, cols: i64) -> Self {
        Session { grid: Grid::new(rows, cols) }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Replaces a cell's source text, reparses it, and resweeps the grid.
    ///
    /// A parse failure does not reject the edit: the raw source is still
    /// stored (so the user sees what they typed), the cell's AST falls back
    /// to the null literal, and the error message is recorded on the cell
    /// rather than returned to the caller — matching the read-only render
    /// accessors below, which never fail.
    pub fn edit_cell(&mut self, row: i64, col: i64, source: impl Into<String>) {
        let source = source.into();
        debug!("editing cell ({}, {}), {} bytes of source", row, col, source.len());

        let (ast, error) = match parser::parse(&source) {
            Ok(ast) => (ast, String::new()),
            Err(e) => {
                log::warn!("cell ({}, {}) failed to parse: {}", row, col, e);
                (parser::Expression::null_literal(), e.message)
            }
        };

        self.grid.set_cell(row, col, source, ast, error);
        self.grid.recompute_all();
    }

    pub fn render_source(&self, row: i64, col: i64) -> String {
        self.grid.get_cell(row, col).source.clone()
    }

    pub fn render_value(&self, row: i64, col: i64) -> String {
        self.grid.get_cell(row, col).cached_value.serialize()
    }

    pub fn render_error(&self, row: i64, col: i64) -> String {
        self.grid.get_cell(row, col).error.clone()
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new(crate::grid::DEFAULT_ROWS, crate::grid::DEFAULT_COLS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_edit_clears_any_prior_error() {
        let mut session = Session::default();
        session.edit_cell(0, 0, "1 / 0");
        assert_eq!(session.render_error(0, 0), "Division by zero error");

        session.edit_cell(0, 0, "5");
        assert_eq!(session.render_error(0, 0), "");
        assert_eq!(session.render_value(0, 0), "5");
    }

    #[test]
    fn unparseable_source_is_kept_verbatim_with_its_error() {
        let mut session = Session::default();
        session.edit_cell(0, 0, "1 +");
        assert_eq!(session.render_source(0, 0), "1 +");
        assert!(!session.render_error(0, 0).is_empty());
    }

    #[test]
    fn editing_a_referenced_cell_refreshes_dependents_on_the_next_sweep() {
        let mut session = Session::default();
        session.edit_cell(0, 0, "5");
        session.edit_cell(0, 1, "#[0,0] * 2");
        assert_eq!(session.render_value(0, 1), "10");

        session.edit_cell(0, 0, "7");
        assert_eq!(session.render_value(0, 1), "14");
    }
}
