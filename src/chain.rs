use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::layout;
use crate::types::{Coordinate, Side};

const HISTORY_INDENT: &str = "  ";

/// One half-move of history. Never modified after it is pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainNode {
    pub step: usize,
    pub parent: Option<usize>,
    pub board: Board,
    /// Who produced this snapshot and where, `None` for the root.
    pub placed: Option<(Side, Coordinate)>,
}

/// Append-only arena of board snapshots.
///
/// Nodes refer to their predecessor by index, the head is the newest node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveChain {
    nodes: Vec<ChainNode>,
    head: usize,
}

impl MoveChain {
    pub fn new(root: Board) -> Self {
        Self {
            nodes: vec![ChainNode {
                step: 0,
                parent: None,
                board: root,
                placed: None,
            }],
            head: 0,
        }
    }

    pub fn head(&self) -> &ChainNode {
        &self.nodes[self.head]
    }

    pub fn board(&self) -> Board {
        self.head().board
    }

    /// Appends a snapshot after the current head and makes it the new head.
    pub fn push(&mut self, board: Board, side: Side, at: Coordinate) -> &ChainNode {
        let step = self.nodes.len();
        self.nodes.push(ChainNode {
            step,
            parent: Some(self.head),
            board,
            placed: Some((side, at)),
        });
        self.head = step;
        &self.nodes[step]
    }

    /// Number of snapshots including the root. The head is always the
    /// newest node, so every stored node is on the head's path.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a chain holds at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Walks from the head back to the root.
    pub fn iter(&self) -> impl Iterator<Item = &ChainNode> {
        let mut next = Some(self.head);
        std::iter::from_fn(move || {
            let node = self.nodes.get(next?)?;
            next = node.parent;
            Some(node)
        })
    }

    /// Renders every snapshot from newest to oldest, indenting one more
    /// level per step back.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut prefix = String::new();
        for node in self.iter() {
            out.push_str(&layout::render(&node.board, &prefix));
            prefix.push_str(HISTORY_INDENT);
        }
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
