use std::path::PathBuf;
use std::time::Duration;

use crate::types::{Coordinate, Side};

/// Errors raised while reading an initial board layout.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read layout {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("layout must have 8 rows, found {found}")]
    RowCount { found: usize },

    #[error("layout row {row} must have 8 cells, found {found}")]
    RowWidth { row: usize, found: usize },

    #[error("invalid symbol {symbol:?} at row {row}, column {col}")]
    Symbol { row: usize, col: usize, symbol: char },
}

/// A rejected placement. The board is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("coordinate {0} is off the board")]
    OutOfBounds(Coordinate),

    #[error("{side} cannot play at {at}")]
    Illegal { at: Coordinate, side: Side },

    #[error("game is already over")]
    GameOver,
}

/// Failure of a machine-move computation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComputeError {
    #[error("strategy exceeded time limit of {0:?}")]
    TimedOut(Duration),

    #[error("move computation failed: {0}")]
    Failed(String),

    #[error("background worker is no longer running")]
    WorkerGone,
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
