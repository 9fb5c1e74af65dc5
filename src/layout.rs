//! Text layout format shared by the loader and the renderer.
//!
//! A layout is eight rows of eight cells: `.` empty, `B` black, `W` white.
//! Cells may be separated by spaces, blank lines and lines starting with `#`
//! are ignored.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::board::Board;
use crate::error::LoadError;
use crate::types::{BOARD_SIZE, Coordinate, Side};

const SIZE: usize = BOARD_SIZE as usize;

/// Reads and validates a layout file.
pub fn load(path: impl AsRef<Path>) -> Result<Board, LoadError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text)
}

/// Loads `path` when given, otherwise the standard four-piece opening.
pub fn load_or_default(path: Option<&Path>) -> Result<Board, LoadError> {
    match path {
        Some(path) => load(path),
        None => Ok(Board::new()),
    }
}

pub fn parse(text: &str) -> Result<Board, LoadError> {
    let rows: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect();
    if rows.len() != SIZE {
        return Err(LoadError::RowCount { found: rows.len() });
    }

    let mut black = 0u64;
    let mut white = 0u64;
    for (row, line) in rows.iter().enumerate() {
        let cells: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
        if cells.len() != SIZE {
            return Err(LoadError::RowWidth {
                row,
                found: cells.len(),
            });
        }
        for (col, symbol) in cells.into_iter().enumerate() {
            let square = 1u64 << (row * SIZE + col);
            match symbol {
                '.' => {}
                'B' | 'b' => black |= square,
                'W' | 'w' => white |= square,
                symbol => return Err(LoadError::Symbol { row, col, symbol }),
            }
        }
    }

    Ok(Board::from_bitboards(black, white))
}

/// Renders `board` as a text grid, every line starting with `prefix`.
/// The output parses back with [`parse`].
pub fn render(board: &Board, prefix: &str) -> String {
    let mut out = String::with_capacity((SIZE * 2 + prefix.len() + 1) * SIZE);
    for row in 0..BOARD_SIZE {
        out.push_str(prefix);
        for col in 0..BOARD_SIZE {
            if col > 0 {
                out.push(' ');
            }
            out.push(
                board
                    .piece_at(Coordinate::new(row, col))
                    .map_or('.', Side::symbol),
            );
        }
        out.push('\n');
    }
    out
}

impl FromStr for Board {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&render(self, ""))
    }
}
