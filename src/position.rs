//! Game position: board, move history and the color to move.
//!
//! Also holds the text form of moves used by the engine protocol. Columns use
//! the letters A-T without I, rows count from the bottom edge, so `D16` is
//! row 3 from the top, column 3.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::board::{Board, Color, MoveError, Point};
use crate::constants::{COL_NAMES, N, PASS_TOKEN, RESIGN_TOKEN};
use crate::history::History;

/// A move: a stone at a point, a pass, or a resignation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Move {
    Play(Point),
    Pass,
    /// Ends generation; never applied to the board.
    Resign,
}

impl Move {
    pub fn point(self) -> Option<Point> {
        match self {
            Move::Play(pt) => Some(pt),
            Move::Pass | Move::Resign => None,
        }
    }
}

/// Coordinate text that names no point on the board.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid coordinate: {0:?}")]
pub struct CoordError(pub String);

impl FromStr for Point {
    type Err = CoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || CoordError(s.to_string());
        let mut chars = s.chars();
        let letter = chars.next().ok_or_else(err)?.to_ascii_uppercase();
        let col = COL_NAMES
            .iter()
            .position(|&c| c as char == letter)
            .ok_or_else(err)?;
        let row: usize = chars.as_str().parse().map_err(|_| err())?;
        if row == 0 || row > N {
            return Err(err());
        }
        Ok(Point::new(N - row, col))
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", COL_NAMES[self.col] as char, N - self.row)
    }
}

impl FromStr for Move {
    type Err = CoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(PASS_TOKEN) {
            Ok(Move::Pass)
        } else if s.eq_ignore_ascii_case(RESIGN_TOKEN) {
            Ok(Move::Resign)
        } else {
            s.parse().map(Move::Play)
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Play(pt) => fmt::Display::fmt(pt, f),
            Move::Pass => f.write_str(PASS_TOKEN),
            Move::Resign => f.write_str(RESIGN_TOKEN),
        }
    }
}

/// Board plus history. Black moves first.
#[derive(Clone, Debug)]
pub struct Position {
    pub board: Board,
    pub history: History,
    /// Color to move next.
    pub next: Color,
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl Position {
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            history: History::new(),
            next: Color::Black,
        }
    }

    /// Play a stone for the color to move.
    pub fn play(&mut self, pt: Point) -> Result<Option<Point>, MoveError> {
        self.play_as(pt, self.next)
    }

    /// Play a stone of `color`; the opponent moves next.
    ///
    /// On error nothing changes. On success returns the simple-ko point, if any.
    pub fn play_as(&mut self, pt: Point, color: Color) -> Result<Option<Point>, MoveError> {
        let ko = self.board.play(pt, color)?;
        self.next = color.opponent();
        self.history.push(Move::Play(pt), &self.board, self.next);
        Ok(ko)
    }

    /// Record a pass for the color to move. The board is unchanged.
    pub fn pass(&mut self) {
        self.pass_as(self.next);
    }

    /// Record a pass by `color`; the opponent moves next.
    pub fn pass_as(&mut self, color: Color) {
        self.next = color.opponent();
        self.history.push(Move::Pass, &self.board, self.next);
    }

    /// Take back the latest move, returning it. A no-op at the initial position.
    ///
    /// Board and color to move return to exactly what they were before the
    /// move, even if it was played out of turn.
    pub fn undo(&mut self) -> Option<Move> {
        let undone = self.history.pop()?;
        let previous = self.history.last();
        self.board = previous.board.clone();
        self.next = previous.next;
        undone.mv
    }

    /// Back to the empty board with Black to move.
    pub fn reset(&mut self) {
        self.history.reset();
        self.board = Board::new();
        self.next = Color::Black;
    }

    /// The most recent move, if any.
    pub fn last_move(&self) -> Option<Move> {
        self.history.last().mv
    }

    /// Number of moves and passes played.
    pub fn move_count(&self) -> usize {
        self.history.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(s: &str) -> Point {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_d16() {
        assert_eq!(pt("D16"), Point::new(3, 3));
        assert_eq!(pt("d16"), Point::new(3, 3));
    }

    #[test]
    fn test_parse_corners() {
        assert_eq!(pt("A19"), Point::new(0, 0));
        assert_eq!(pt("A1"), Point::new(N - 1, 0));
        assert_eq!(pt("T1"), Point::new(N - 1, N - 1));
        assert_eq!(pt("T19"), Point::new(0, N - 1));
    }

    #[test]
    fn test_parse_skips_i() {
        let h5 = pt("H5");
        let j5 = pt("J5");
        assert_eq!(j5.col - h5.col, 1, "J should be one column after H");
        assert!("I5".parse::<Point>().is_err());
    }

    #[test]
    fn test_parse_rejects_bad_text() {
        for bad in ["", "D", "D0", "D20", "Z4", "4D", "DD"] {
            assert!(bad.parse::<Point>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn test_parse_reserved_tokens() {
        assert_eq!("pass".parse::<Move>(), Ok(Move::Pass));
        assert_eq!("PASS".parse::<Move>(), Ok(Move::Pass));
        assert_eq!("resign".parse::<Move>(), Ok(Move::Resign));
        assert_eq!("Q16".parse::<Move>(), Ok(Move::Play(pt("Q16"))));
    }

    #[test]
    fn test_str_coord_roundtrip() {
        for coord in ["A1", "D4", "H8", "J9", "K10", "Q16", "T19"] {
            assert_eq!(pt(coord).to_string(), coord);
        }
    }

    #[test]
    fn test_play_alternates_colors() {
        let mut pos = Position::new();
        pos.play(pt("D4")).unwrap();
        assert_eq!(pos.board.get(pt("D4")), Some(Color::Black));
        assert_eq!(pos.next, Color::White);
        pos.play(pt("Q16")).unwrap();
        assert_eq!(pos.board.get(pt("Q16")), Some(Color::White));
        assert_eq!(pos.next, Color::Black);
        assert_eq!(pos.move_count(), 2);
    }

    #[test]
    fn test_occupied_leaves_position_unchanged() {
        let mut pos = Position::new();
        pos.play(pt("D4")).unwrap();
        assert_eq!(pos.play(pt("D4")), Err(MoveError::Occupied));
        assert_eq!(pos.history.len(), 2);
        assert_eq!(pos.next, Color::White);
    }

    #[test]
    fn test_pass_records_history_only() {
        let mut pos = Position::new();
        pos.pass();
        assert_eq!(pos.history.len(), 2);
        assert!(pos.board.is_clear());
        assert_eq!(pos.next, Color::White);
        assert_eq!(pos.last_move(), Some(Move::Pass));
    }

    #[test]
    fn test_undo_returns_undone_move() {
        let mut pos = Position::new();
        pos.play(pt("D4")).unwrap();
        pos.pass();
        assert_eq!(pos.undo(), Some(Move::Pass));
        assert_eq!(pos.undo(), Some(Move::Play(pt("D4"))));
        assert_eq!(pos.undo(), None);
        assert!(pos.board.is_clear());
        assert_eq!(pos.next, Color::Black);
    }

    #[test]
    fn test_undo_out_of_turn_pass() {
        let mut pos = Position::new();
        pos.play(pt("D4")).unwrap();
        pos.pass_as(Color::Black);
        assert_eq!(pos.next, Color::White);
        assert_eq!(pos.undo(), Some(Move::Pass));
        assert_eq!(pos.next, Color::White);
        assert_eq!(pos.board.get(pt("D4")), Some(Color::Black));
    }
}
