//! FILENAME: cli/src/main.rs
//! PURPOSE: A non-interactive driver over the Session façade — applies a
//! script of cell edits and prints the resulting grid.
//! CONTEXT: Exists so the engine can be exercised and inspected without a
//! terminal UI: each line of the script is one cell edit in `ROW,COL=SOURCE`
//! form, applied in order, with the final grid of rendered values (and any
//! per-cell errors) printed to stdout.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use engine::Session;
use log::info;

/// Applies a script of cell edits to a fresh spreadsheet session and prints
/// the resulting grid.
#[derive(Parser, Debug)]
#[command(name = "calcula-cli")]
#[command(about = "Non-interactive driver for the spreadsheet engine", long_about = None)]
struct Cli {
    /// Path to a script file of `ROW,COL=SOURCE` lines, one edit per line.
    /// Blank lines and lines starting with `#` are ignored. If omitted, a
    /// small built-in demo script runs instead.
    script: Option<PathBuf>,

    /// Number of grid rows.
    #[arg(long, default_value_t = engine::DEFAULT_ROWS)]
    rows: i64,

    /// Number of grid columns.
    #[arg(long, default_value_t = engine::DEFAULT_COLS)]
    cols: i64,
}

const DEMO_SCRIPT: &str = "\
0,0=5
0,1=#[0,0] * 2
0,2=sum([0,0], [0,1])
1,0=1 / 0
";

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let script_text = match &cli.script {
        Some(path) => match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("failed to read {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => DEMO_SCRIPT.to_string(),
    };

    let mut session = Session::new(cli.rows, cli.cols);
    for (line_no, line) in script_text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_edit_line(line) {
            Some((row, col, source)) => {
                info!(
                    "applying line {}: ({}, {}), {} bytes of source",
                    line_no + 1,
                    row,
                    col,
                    source.len()
                );
                session.edit_cell(row, col, source);
            }
            None => {
                eprintln!("line {}: expected ROW,COL=SOURCE, got {:?}", line_no + 1, line);
                return ExitCode::FAILURE;
            }
        }
    }

    for row in 0..session.grid().rows() {
        let mut rendered = Vec::with_capacity(session.grid().cols() as usize);
        for col in 0..session.grid().cols() {
            let error = session.render_error(row, col);
            if error.is_empty() {
                rendered.push(session.render_value(row, col));
            } else {
                rendered.push(format!("#ERR({})", error));
            }
        }
        println!("{}", rendered.join("\t"));
    }

    ExitCode::SUCCESS
}

fn parse_edit_line(line: &str) -> Option<(i64, i64, String)> {
    let (address, source) = line.split_once('=')?;
    let (row, col) = address.split_once(',')?;
    let row = row.trim().parse().ok()?;
    let col = col.trim().parse().ok()?;
    Some((row, col, source.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_edit_line() {
        assert_eq!(parse_edit_line("0,1=#[0,0] * 2"), Some((0, 1, "#[0,0] * 2".to_string())));
    }

    #[test]
    fn rejects_a_line_missing_the_address_separator() {
        assert_eq!(parse_edit_line("not an edit line"), None);
    }
}
