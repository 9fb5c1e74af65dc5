use serde::{Deserialize, Serialize};

use crate::error::MoveError;
use crate::types::{BOARD_SIZE, Coordinate, Outcome, Side};

const SIZE: usize = BOARD_SIZE as usize;
const NUM_SQUARES: usize = SIZE * SIZE;
const DIRECTIONS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];
const CORNERS: u64 = bit(0) | bit(SIZE - 1) | bit(NUM_SQUARES - SIZE) | bit(NUM_SQUARES - 1);

/// Immutable board snapshot represented by two bitboards.
///
/// Every transition returns a fresh `Board`; no method mutates the receiver,
/// so snapshots held in the move chain stay valid while play continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    black: u64,
    white: u64,
}

impl Board {
    /// Creates the standard opening:
    /// d4=white, e4=black, d5=black, e5=white.
    pub fn new() -> Self {
        Self {
            black: bit(28) | bit(35),
            white: bit(27) | bit(36),
        }
    }

    /// Builds a board from raw masks. A square claimed by both masks is
    /// given to black so that each piece belongs to exactly one side.
    pub(crate) fn from_bitboards(black: u64, white: u64) -> Self {
        Self {
            black,
            white: white & !black,
        }
    }

    pub fn is_occupiable(&self, at: Coordinate) -> bool {
        at.in_bounds()
    }

    /// Piece on the given square, `None` when empty or off the board.
    pub fn piece_at(&self, at: Coordinate) -> Option<Side> {
        let square = bit(at.index()?);
        if self.black & square != 0 {
            Some(Side::Black)
        } else if self.white & square != 0 {
            Some(Side::White)
        } else {
            None
        }
    }

    pub fn is_legal_move(&self, at: Coordinate, side: Side) -> bool {
        match at.index() {
            Some(pos) => {
                let (me, opp) = self.split(side);
                collect_flips(pos, me, opp) != 0
            }
            None => false,
        }
    }

    /// Places a piece for `side` and flips every captured run.
    pub fn apply_move(&self, at: Coordinate, side: Side) -> Result<Board, MoveError> {
        let pos = at.index().ok_or(MoveError::OutOfBounds(at))?;
        let (me, opp) = self.split(side);

        let flips = collect_flips(pos, me, opp);
        if flips == 0 {
            return Err(MoveError::Illegal { at, side });
        }

        Ok(self.with_flips(pos, flips, side))
    }

    /// Returns the legal move mask for the given side.
    pub fn legal_mask(&self, side: Side) -> u64 {
        let (me, opp) = self.split(side);
        let occupied = me | opp;
        let mut legal = 0u64;

        for pos in 0..NUM_SQUARES {
            let move_bit = bit(pos);
            if (occupied & move_bit) != 0 {
                continue;
            }
            if collect_flips(pos, me, opp) != 0 {
                legal |= move_bit;
            }
        }

        legal
    }

    /// Legal moves in row-major order. Empty means `side` must pass.
    pub fn legal_moves(&self, side: Side) -> Vec<Coordinate> {
        mask_to_indices(self.legal_mask(side))
            .map(Coordinate::from_index)
            .collect()
    }

    /// One successor per legal move, in row-major order of the move.
    pub fn successors(&self, side: Side) -> Vec<(Coordinate, Board)> {
        let (me, opp) = self.split(side);
        mask_to_indices(self.legal_mask(side))
            .map(|pos| {
                let next = self.with_flips(pos, collect_flips(pos, me, opp), side);
                (Coordinate::from_index(pos), next)
            })
            .collect()
    }

    pub fn is_terminal(&self) -> bool {
        self.legal_mask(Side::Black) == 0 && self.legal_mask(Side::White) == 0
    }

    /// Final result by piece count. `None` while either side can still move.
    pub fn outcome(&self) -> Option<Outcome> {
        if !self.is_terminal() {
            return None;
        }
        let (black, white) = self.count();
        Some(match black.cmp(&white) {
            std::cmp::Ordering::Greater => Outcome::Win(Side::Black),
            std::cmp::Ordering::Less => Outcome::Win(Side::White),
            std::cmp::Ordering::Equal => Outcome::Draw,
        })
    }

    /// Returns `(black_count, white_count)`.
    pub fn count(&self) -> (u8, u8) {
        (self.black.count_ones() as u8, self.white.count_ones() as u8)
    }

    pub fn piece_count(&self, side: Side) -> u32 {
        self.split(side).0.count_ones()
    }

    pub fn corner_count(&self, side: Side) -> u32 {
        (self.split(side).0 & CORNERS).count_ones()
    }

    pub fn mobility(&self, side: Side) -> u32 {
        self.legal_mask(side).count_ones()
    }

    fn with_flips(&self, pos: usize, flips: u64, side: Side) -> Board {
        let (me, opp) = self.split(side);
        let next_me = me | bit(pos) | flips;
        let next_opp = opp & !flips;

        match side {
            Side::Black => Self::from_bitboards(next_me, next_opp),
            Side::White => Self::from_bitboards(next_opp, next_me),
        }
    }

    fn split(&self, side: Side) -> (u64, u64) {
        match side {
            Side::Black => (self.black, self.white),
            Side::White => (self.white, self.black),
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_flips(pos: usize, me: u64, opp: u64) -> u64 {
    if pos >= NUM_SQUARES {
        return 0;
    }

    let move_bit = bit(pos);
    if ((me | opp) & move_bit) != 0 {
        return 0;
    }

    let (row, col) = pos_to_row_col(pos);
    let mut flips = 0u64;

    for (dr, dc) in DIRECTIONS {
        let mut r = row + dr;
        let mut c = col + dc;
        let mut line = 0u64;
        let mut has_opponent = false;

        while in_bounds(r, c) {
            let square = bit((r as usize) * SIZE + c as usize);
            if (opp & square) != 0 {
                has_opponent = true;
                line |= square;
            } else if (me & square) != 0 {
                if has_opponent {
                    flips |= line;
                }
                break;
            } else {
                break;
            }

            r += dr;
            c += dc;
        }
    }

    flips
}

const fn bit(pos: usize) -> u64 {
    if pos < NUM_SQUARES { 1u64 << pos } else { 0 }
}

fn mask_to_indices(mut mask: u64) -> impl Iterator<Item = usize> {
    std::iter::from_fn(move || {
        if mask == 0 {
            return None;
        }
        let idx = mask.trailing_zeros() as usize;
        mask &= mask - 1;
        Some(idx)
    })
}

fn pos_to_row_col(pos: usize) -> (i32, i32) {
    ((pos / SIZE) as i32, (pos % SIZE) as i32)
}

fn in_bounds(row: i32, col: i32) -> bool {
    (0..SIZE as i32).contains(&row) && (0..SIZE as i32).contains(&col)
}
