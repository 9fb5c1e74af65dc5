pub mod search;
pub mod strategy;

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::types::{Coordinate, Side};
use crate::worker::CancelToken;

pub use search::{Interrupted, Searcher};
pub use strategy::{CornerCaptured, Greedy, Heuristic, Mobility, Strategy, pick_best};

const DEFAULT_DEPTH: u8 = 4;

/// Outcome of a machine-move computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchResult {
    Move { at: Coordinate, board: Board },
    NoLegalMove,
}

impl SearchResult {
    pub fn coordinate(&self) -> Option<Coordinate> {
        match self {
            SearchResult::Move { at, .. } => Some(*at),
            SearchResult::NoLegalMove => None,
        }
    }

    pub fn board(&self) -> Option<Board> {
        match self {
            SearchResult::Move { board, .. } => Some(*board),
            SearchResult::NoLegalMove => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinimaxConfig {
    pub depth: u8,
    pub strategy: Heuristic,
    pub pruning: bool,
}

impl Default for MinimaxConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            strategy: Heuristic::default(),
            pruning: true,
        }
    }
}

/// How the machine picks its moves. Chosen once when the engine is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Opponent {
    /// Best immediate successor under a strategy.
    Heuristic { strategy: Heuristic },
    /// Minimax tree search.
    Minimax(MinimaxConfig),
}

impl Default for Opponent {
    fn default() -> Self {
        Opponent::Minimax(MinimaxConfig::default())
    }
}

impl Opponent {
    pub fn choose(
        &self,
        board: &Board,
        side: Side,
        token: &CancelToken,
    ) -> Result<SearchResult, Interrupted> {
        match self {
            Opponent::Heuristic { strategy } => Ok(pick_best(board, side, strategy)),
            Opponent::Minimax(config) => Searcher::new(&config.strategy, config.depth, token)
                .with_pruning(config.pruning)
                .search(board, side),
        }
    }
}
