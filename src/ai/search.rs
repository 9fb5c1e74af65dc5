use tracing::debug;
use web_time::Instant;

use crate::ai::SearchResult;
use crate::ai::strategy::Strategy;
use crate::board::Board;
use crate::types::Side;
use crate::worker::CancelToken;

const MIN_SCORE: i32 = i32::MIN;
const MAX_SCORE: i32 = i32::MAX;

/// The search stopped because its token was cancelled or its deadline passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("search interrupted")]
pub struct Interrupted;

/// Depth-limited minimax over [`Board::successors`].
///
/// Scores are always from the root side's point of view: the root side
/// maximises, its opponent minimises. A side without legal moves passes
/// without using up depth. Leaves are scored with the configured strategy,
/// or with the piece difference once the game is over.
///
/// Alpha-beta pruning is on by default and never changes the chosen move.
pub struct Searcher<'a, S: Strategy + ?Sized> {
    strategy: &'a S,
    token: &'a CancelToken,
    max_depth: u8,
    pruning: bool,
    nodes: u64,
}

impl<'a, S: Strategy + ?Sized> Searcher<'a, S> {
    pub fn new(strategy: &'a S, max_depth: u8, token: &'a CancelToken) -> Self {
        Self {
            strategy,
            token,
            max_depth: max_depth.max(1),
            pruning: true,
            nodes: 0,
        }
    }

    pub fn with_pruning(mut self, pruning: bool) -> Self {
        self.pruning = pruning;
        self
    }

    /// Number of nodes visited by the last search.
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Picks the successor of `board` that is best for `side`.
    /// Equal scores keep the earliest move in row-major order.
    pub fn search(&mut self, board: &Board, side: Side) -> Result<SearchResult, Interrupted> {
        let start_time = Instant::now();
        self.nodes = 0;

        let successors = board.successors(side);
        if successors.is_empty() {
            return Ok(SearchResult::NoLegalMove);
        }

        let mut best: Option<(i32, SearchResult)> = None;
        let mut alpha = MIN_SCORE;

        for (at, next) in successors {
            let score = self.minimax(&next, side.opposite(), side, self.max_depth - 1, alpha, MAX_SCORE)?;
            if best.as_ref().is_none_or(|(best_score, _)| score > *best_score) {
                best = Some((score, SearchResult::Move { at, board: next }));
            }
            alpha = alpha.max(score);
        }

        debug!(
            %side,
            depth = self.max_depth,
            nodes = self.nodes,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "minimax search finished"
        );

        Ok(best.map_or(SearchResult::NoLegalMove, |(_, result)| result))
    }

    fn minimax(
        &mut self,
        board: &Board,
        to_move: Side,
        root: Side,
        depth: u8,
        mut alpha: i32,
        mut beta: i32,
    ) -> Result<i32, Interrupted> {
        self.nodes += 1;
        if self.token.is_cancelled() {
            return Err(Interrupted);
        }

        if board.is_terminal() {
            return Ok(piece_difference(board, root));
        }
        if depth == 0 {
            return Ok(self.strategy.score(board, root));
        }

        let successors = board.successors(to_move);
        if successors.is_empty() {
            // forced pass, same depth
            return self.minimax(board, to_move.opposite(), root, depth, alpha, beta);
        }

        let maximizing = to_move == root;
        let mut best = if maximizing { MIN_SCORE } else { MAX_SCORE };

        for (_, next) in successors {
            let score = self.minimax(&next, to_move.opposite(), root, depth - 1, alpha, beta)?;
            if maximizing {
                best = best.max(score);
                alpha = alpha.max(score);
            } else {
                best = best.min(score);
                beta = beta.min(score);
            }
            if self.pruning && alpha >= beta {
                break;
            }
        }

        Ok(best)
    }
}

fn piece_difference(board: &Board, side: Side) -> i32 {
    board.piece_count(side) as i32 - board.piece_count(side.opposite()) as i32
}
