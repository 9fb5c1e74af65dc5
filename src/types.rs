use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const BOARD_SIZE: u8 = 8;

/// One of the two players. Black moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Black,
    White,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Black => Side::White,
            Side::White => Side::Black,
        }
    }

    /// Single-character symbol used by the layout format.
    pub fn symbol(self) -> char {
        match self {
            Side::Black => 'B',
            Side::White => 'W',
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Black => f.write_str("black"),
            Side::White => f.write_str("white"),
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "black" | "b" | "first" => Ok(Side::Black),
            "white" | "w" | "second" => Ok(Side::White),
            other => Err(format!("unknown side: {other}")),
        }
    }
}

/// A board coordinate. Ordering is row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub row: u8,
    pub col: u8,
}

impl Coordinate {
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    pub fn in_bounds(self) -> bool {
        self.row < BOARD_SIZE && self.col < BOARD_SIZE
    }

    /// Bit index into a bitboard, `None` when off the board.
    pub(crate) fn index(self) -> Option<usize> {
        self.in_bounds()
            .then(|| self.row as usize * BOARD_SIZE as usize + self.col as usize)
    }

    pub(crate) fn from_index(idx: usize) -> Self {
        let size = BOARD_SIZE as usize;
        Self::new((idx / size) as u8, (idx % size) as u8)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Accepts `"2 3"`, `"2,3"` or algebraic `"d3"` (column letter, 1-based row).
impl FromStr for Coordinate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parts: Vec<&str> = s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .collect();

        if let [row, col] = parts.as_slice() {
            let row = row.parse::<u8>().map_err(|e| format!("bad row {row:?}: {e}"))?;
            let col = col.parse::<u8>().map_err(|e| format!("bad column {col:?}: {e}"))?;
            return Ok(Self::new(row, col));
        }

        let mut chars = s.chars();
        match (chars.next(), chars.as_str().parse::<u8>()) {
            (Some(letter), Ok(rank)) if letter.is_ascii_alphabetic() && rank >= 1 => {
                let col = letter.to_ascii_lowercase() as u8 - b'a';
                Ok(Self::new(rank - 1, col))
            }
            _ => Err(format!("cannot parse coordinate: {s:?}")),
        }
    }
}

/// Result of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Win(Side),
    Draw,
}

impl Outcome {
    pub fn winner(self) -> Option<Side> {
        match self {
            Outcome::Win(side) => Some(side),
            Outcome::Draw => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Win(side) => write!(f, "{side} wins"),
            Outcome::Draw => f.write_str("draw"),
        }
    }
}
