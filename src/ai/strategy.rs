use serde::{Deserialize, Serialize};

use crate::ai::SearchResult;
use crate::board::Board;
use crate::types::Side;

/// A pure board evaluation. Higher scores favour `side`.
///
/// Implementations must not keep mutable state: the search calls them from
/// a background thread across many tree nodes.
pub trait Strategy: Send + Sync {
    fn score(&self, board: &Board, side: Side) -> i32;
}

/// Own pieces minus opponent pieces.
#[derive(Debug, Default, Clone, Copy)]
pub struct Greedy;

impl Strategy for Greedy {
    fn score(&self, board: &Board, side: Side) -> i32 {
        board.piece_count(side) as i32 - board.piece_count(side.opposite()) as i32
    }
}

/// Own legal moves minus opponent legal moves.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mobility;

impl Strategy for Mobility {
    fn score(&self, board: &Board, side: Side) -> i32 {
        board.mobility(side) as i32 - board.mobility(side.opposite()) as i32
    }
}

/// Corner balance scaled to `-100..=100`, zero when no corner is taken.
#[derive(Debug, Default, Clone, Copy)]
pub struct CornerCaptured;

impl Strategy for CornerCaptured {
    fn score(&self, board: &Board, side: Side) -> i32 {
        let mine = board.corner_count(side) as i32;
        let theirs = board.corner_count(side.opposite()) as i32;

        if mine + theirs == 0 {
            return 0;
        }

        100 * (mine - theirs) / (mine + theirs)
    }
}

/// Named selection of the built-in strategies, used by configuration.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Heuristic {
    #[default]
    Greedy,
    Mobility,
    CornerCaptured,
}

impl Strategy for Heuristic {
    fn score(&self, board: &Board, side: Side) -> i32 {
        match self {
            Heuristic::Greedy => Greedy.score(board, side),
            Heuristic::Mobility => Mobility.score(board, side),
            Heuristic::CornerCaptured => CornerCaptured.score(board, side),
        }
    }
}

/// Picks the successor with the highest score for `side`.
/// On equal scores the first successor in row-major move order wins.
pub fn pick_best<S: Strategy + ?Sized>(board: &Board, side: Side, strategy: &S) -> SearchResult {
    let mut best: Option<(i32, SearchResult)> = None;

    for (at, next) in board.successors(side) {
        let score = strategy.score(&next, side);
        if best.as_ref().is_none_or(|(best_score, _)| score > *best_score) {
            best = Some((score, SearchResult::Move { at, board: next }));
        }
    }

    best.map_or(SearchResult::NoLegalMove, |(_, result)| result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::parse;
    use crate::types::Coordinate;

    // Two rows of isolated captures: white can play (0,3) or (3,2),
    // black only (7,2).
    const SPLIT_ROWS: &str = "
        W B B . . . . .
        . . . . . . . .
        . . . . . . . .
        W B . . . . . .
        . . . . . . . .
        . . . . . . . .
        . . . . . . . .
        B W . . . . . .
    ";

    #[test]
    fn greedy_scores_piece_difference() {
        let board = parse(
            "
            B B B B B . . .
            W W W . . . . .
            . . . . . . . .
            . . . . . . . .
            . . . . . . . .
            . . . . . . . .
            . . . . . . . .
            . . . . . . . .
            ",
        )
        .unwrap();

        assert_eq!(Greedy.score(&board, Side::Black), 2);
        assert_eq!(Greedy.score(&board, Side::White), -2);
    }

    #[test]
    fn mobility_scores_legal_move_difference() {
        let board = parse(SPLIT_ROWS).unwrap();

        assert_eq!(board.mobility(Side::White), 2);
        assert_eq!(board.mobility(Side::Black), 1);
        assert_eq!(Mobility.score(&board, Side::White), 1);
        assert_eq!(Mobility.score(&board, Side::Black), -1);
    }

    #[test]
    fn corner_captured_is_zero_without_corners() {
        assert_eq!(CornerCaptured.score(&Board::new(), Side::Black), 0);
        assert_eq!(CornerCaptured.score(&Board::new(), Side::White), 0);
    }

    #[test]
    fn corner_captured_is_relative_to_side() {
        let board = parse(
            "
            B . . . . . . B
            . . . . . . . .
            . . . . . . . .
            . . . . . . . .
            . . . . . . . .
            . . . . . . . .
            . . . . . . . .
            W . . . . . . .
            ",
        )
        .unwrap();

        assert_eq!(CornerCaptured.score(&board, Side::Black), 33);
        assert_eq!(CornerCaptured.score(&board, Side::White), -33);
    }

    #[test]
    fn heuristic_dispatches_to_named_strategy() {
        let board = parse(SPLIT_ROWS).unwrap();

        assert_eq!(
            Heuristic::Greedy.score(&board, Side::White),
            Greedy.score(&board, Side::White)
        );
        assert_eq!(
            Heuristic::Mobility.score(&board, Side::White),
            Mobility.score(&board, Side::White)
        );
    }

    #[test]
    fn pick_best_maximises_score() {
        let board = parse(SPLIT_ROWS).unwrap();

        // (0,3) flips two pieces, (3,2) only one.
        match pick_best(&board, Side::White, &Greedy) {
            SearchResult::Move { at, board: next } => {
                assert_eq!(at, Coordinate::new(0, 3));
                assert_eq!(next, board.apply_move(at, Side::White).unwrap());
            }
            SearchResult::NoLegalMove => panic!("white has moves"),
        }
    }

    #[test]
    fn pick_best_breaks_ties_by_move_order() {
        // all four opening replies flip exactly one piece
        let result = pick_best(&Board::new(), Side::Black, &Greedy);

        assert_eq!(result.coordinate(), Some(Coordinate::new(2, 3)));
    }

    #[test]
    fn pick_best_reports_pass() {
        let board = parse(SPLIT_ROWS).unwrap();
        let stuck = board
            .apply_move(Coordinate::new(7, 2), Side::Black)
            .unwrap();

        assert!(stuck.legal_moves(Side::Black).is_empty());
        assert_eq!(
            pick_best(&stuck, Side::Black, &Greedy),
            SearchResult::NoLegalMove
        );
    }
}
