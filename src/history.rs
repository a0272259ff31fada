//! Move history: an append-only list of board snapshots enabling undo.

use crate::board::{Board, Color};
use crate::position::Move;

/// A move paired with the board as it stood after that move.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    /// `None` only for the initial empty board.
    pub mv: Option<Move>,
    pub board: Board,
    /// Color to move from this snapshot on.
    pub next: Color,
}

/// Snapshots in play order. The first entry is always the empty board.
#[derive(Clone, Debug)]
pub struct History {
    snapshots: Vec<Snapshot>,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self {
            snapshots: vec![Snapshot {
                mv: None,
                board: Board::new(),
                next: Color::Black,
            }],
        }
    }

    pub fn push(&mut self, mv: Move, board: &Board, next: Color) {
        self.snapshots.push(Snapshot {
            mv: Some(mv),
            board: board.clone(),
            next,
        });
    }

    /// Remove the latest snapshot. The initial snapshot is never removed.
    pub fn pop(&mut self) -> Option<Snapshot> {
        if self.snapshots.len() > 1 {
            self.snapshots.pop()
        } else {
            None
        }
    }

    /// The most recent snapshot.
    pub fn last(&self) -> &Snapshot {
        // The initial snapshot is never popped.
        &self.snapshots[self.snapshots.len() - 1]
    }

    /// Drop everything but the initial snapshot.
    pub fn reset(&mut self) {
        self.snapshots.truncate(1);
    }

    /// Number of snapshots, including the initial one.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// True when only the initial snapshot is present.
    pub fn at_start(&self) -> bool {
        self.snapshots.len() == 1
    }

    pub fn moves(&self) -> impl Iterator<Item = Move> + '_ {
        self.snapshots.iter().filter_map(|s| s.mv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Point;

    #[test]
    fn test_new_history_has_initial_snapshot() {
        let history = History::new();
        assert_eq!(history.len(), 1);
        assert!(history.at_start());
        assert_eq!(history.last().next, Color::Black);
        assert_eq!(history.last().mv, None);
        assert!(history.last().board.is_clear());
    }

    #[test]
    fn test_pop_never_removes_initial_snapshot() {
        let mut history = History::new();
        assert!(history.pop().is_none());
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_push_pop_and_reset() {
        let mut history = History::new();
        let mut board = Board::new();
        let d4 = Point::new(15, 3);
        board.play(d4, Color::Black).unwrap();
        history.push(Move::Play(d4), &board, Color::White);
        history.push(Move::Pass, &board, Color::Black);
        assert_eq!(history.len(), 3);
        assert_eq!(
            history.moves().collect::<Vec<_>>(),
            vec![Move::Play(d4), Move::Pass]
        );

        let popped = history.pop().unwrap();
        assert_eq!(popped.mv, Some(Move::Pass));
        assert_eq!(history.last().mv, Some(Move::Play(d4)));
        assert_eq!(history.last().next, Color::White);
        assert!(!history.at_start());

        history.reset();
        assert_eq!(history.len(), 1);
        assert!(history.at_start());
    }
}
