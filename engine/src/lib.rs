//! FILENAME: engine/src/lib.rs
//! PURPOSE: Main library entry point for the spreadsheet engine.
//! CONTEXT: Re-exports public types and modules for use by other crates.

pub mod cell;
pub mod evaluator;
pub mod grid;
pub mod runtime;
pub mod session;

pub use cell::Cell;
pub use evaluator::{evaluate, EvalResult, RuntimeError};
pub use grid::{Grid, DEFAULT_COLS, DEFAULT_ROWS};
pub use runtime::Runtime;
pub use session::Session;

#[cfg(test)]
mod tests {
    use super::*;
    use parser::Value;

    #[test]
    fn arithmetic_and_precedence_scenario() {
        let mut session = Session::default();
        session.edit_cell(0, 0, "(5 + 2) * 3 % 4");
        assert_eq!(session.render_value(0, 0), "1");
    }

    #[test]
    fn cell_reference_scenario() {
        let mut session = Session::default();
        session.edit_cell(0, 0, "10");
        session.edit_cell(0, 1, "#[0, 0] + 5");
        assert_eq!(session.render_value(0, 1), "15");

        session.edit_cell(0, 0, "20");
        assert_eq!(session.render_value(0, 1), "25");
    }

    #[test]
    fn aggregate_skips_non_numeric_cells_scenario() {
        let mut session = Session::default();
        session.edit_cell(0, 0, "1");
        session.edit_cell(0, 1, "true");
        session.edit_cell(0, 2, "3");
        session.edit_cell(1, 0, "\"text\"");
        session.edit_cell(1, 1, "2");
        session.edit_cell(1, 2, "4");

        session.edit_cell(2, 0, "sum([0,0], [1,2])");
        assert_eq!(session.render_value(2, 0), "10.00");
    }

    #[test]
    fn short_circuit_and_scenario_avoids_division_error() {
        let mut session = Session::default();
        session.edit_cell(0, 0, "false && (1 / 0 == 0)");
        assert_eq!(session.render_value(0, 0), "false");
        assert_eq!(session.render_error(0, 0), "");
    }

    #[test]
    fn failed_cell_does_not_prevent_other_cells_from_recomputing() {
        let mut session = Session::default();
        session.edit_cell(0, 0, "1 / 0");
        session.edit_cell(0, 1, "99");
        assert_eq!(session.render_error(0, 0), "Division by zero error");
        assert_eq!(session.render_value(0, 1), "99");
    }

    #[test]
    fn default_grid_dimensions_match_the_documented_size() {
        let session = Session::default();
        assert_eq!(session.grid().rows(), DEFAULT_ROWS);
        assert_eq!(session.grid().cols(), DEFAULT_COLS);
    }

    #[test]
    fn empty_cell_evaluates_to_empty_string() {
        let grid = Grid::default();
        assert_eq!(grid.get_cell(3, 3).cached_value, Value::String(String::new()));
    }
}
