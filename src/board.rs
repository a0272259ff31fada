//! Board state and capture resolution.
//!
//! The board is a plain 2D grid of cells, each either empty or holding a stone.
//! Playing a stone flood-fills the groups around it, removes surrounded groups
//! and reports a simple-ko point when one arises. Ko is reported, never enforced.

use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::constants::{BOARD_POINTS, COL_NAMES, N, STAR_POINTS};

/// Stone color.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    Black,
    White,
}

impl Color {
    pub fn opponent(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// Single-letter color name used on the engine protocol.
    pub fn gtp_name(self) -> &'static str {
        match self {
            Color::Black => "b",
            Color::White => "w",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::Black => "black",
            Color::White => "white",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A point on the board. Row 0 is the top edge, column 0 the left edge.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Point {
    pub row: usize,
    pub col: usize,
}

impl Point {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub fn in_bounds(self) -> bool {
        self.row < N && self.col < N
    }

    /// The up to four orthogonal neighbors that lie on the board.
    pub fn neighbors(self) -> impl Iterator<Item = Point> {
        let Point { row, col } = self;
        let mut v = Vec::with_capacity(4);
        if row > 0 {
            v.push(Point::new(row - 1, col));
        }
        if row + 1 < N {
            v.push(Point::new(row + 1, col));
        }
        if col > 0 {
            v.push(Point::new(row, col - 1));
        }
        if col + 1 < N {
            v.push(Point::new(row, col + 1));
        }
        v.into_iter()
    }

    fn idx(self) -> usize {
        self.row * N + self.col
    }
}

/// Why a stone could not be placed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("illegal move: point not empty")]
    Occupied,
    #[error("illegal move: point off the board")]
    OutOfBounds,
}

/// A maximal set of same-colored stones connected by 4-adjacency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub color: Color,
    pub points: Vec<Point>,
    /// Distinct empty points adjacent to any member.
    pub liberties: usize,
}

impl Group {
    pub fn is_surrounded(&self) -> bool {
        self.liberties == 0
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// An NxN Go board.
#[derive(Clone, PartialEq, Eq)]
pub struct Board {
    cells: Vec<Option<Color>>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: vec![None; BOARD_POINTS],
        }
    }

    /// Stone at `pt`, or `None` for an empty or off-board point.
    pub fn get(&self, pt: Point) -> Option<Color> {
        if !pt.in_bounds() {
            return None;
        }
        self.cells[pt.idx()]
    }

    pub fn is_empty_at(&self, pt: Point) -> bool {
        pt.in_bounds() && self.cells[pt.idx()].is_none()
    }

    /// True if no stone is on the board.
    pub fn is_clear(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    pub fn stone_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Place a stone directly, bypassing capture resolution. For setting up
    /// positions; `pt` must be on the board.
    pub fn set(&mut self, pt: Point, stone: Option<Color>) {
        debug_assert!(pt.in_bounds(), "set off the board: {pt:?}");
        if pt.in_bounds() {
            self.cells[pt.idx()] = stone;
        }
    }

    pub fn clear(&mut self) {
        self.cells.fill(None);
    }

    /// Iterate over all empty points, row by row.
    pub fn empty_points(&self) -> impl Iterator<Item = Point> + '_ {
        (0..BOARD_POINTS)
            .filter(|&i| self.cells[i].is_none())
            .map(|i| Point::new(i / N, i % N))
    }

    /// Play a stone of `color` at `pt`.
    ///
    /// Surrounded groups next to the move are captured. When only one group is
    /// surrounded it is removed whatever its color, so a suicide removes the
    /// mover's own group. When several are surrounded only the opponent's go.
    ///
    /// Returns the simple-ko point: set when the move captured exactly one
    /// opponent stone with a lone stone that had no liberties before the
    /// capture.
    pub fn play(&mut self, pt: Point, color: Color) -> Result<Option<Point>, MoveError> {
        if !pt.in_bounds() {
            return Err(MoveError::OutOfBounds);
        }
        if self.get(pt).is_some() {
            return Err(MoveError::Occupied);
        }
        self.cells[pt.idx()] = Some(color);

        let groups = self.groups_around(pt);
        // Measured before any removal: a ko needs the new stone alone and
        // without liberties of its own.
        let ko_shape = groups
            .iter()
            .find(|g| g.points.contains(&pt))
            .is_some_and(|g| g.len() == 1 && g.is_surrounded());
        let mut surrounded: Vec<Group> = groups.into_iter().filter(Group::is_surrounded).collect();

        let captured = match surrounded.len() {
            0 => return Ok(None),
            1 => {
                let group = surrounded.remove(0);
                if group.len() == BOARD_POINTS {
                    debug!("whole board captured");
                    self.clear();
                    return Ok(None);
                }
                vec![group]
            }
            _ => surrounded
                .into_iter()
                .filter(|g| g.color == color.opponent())
                .collect(),
        };

        for group in &captured {
            debug!(color = %group.color, stones = group.len(), "capture");
            for &p in &group.points {
                self.cells[p.idx()] = None;
            }
        }

        let ko = match captured.as_slice() {
            [group] if ko_shape && group.color != color && group.len() == 1 => {
                Some(group.points[0])
            }
            _ => None,
        };
        if let Some(k) = ko {
            debug!(row = k.row, col = k.col, "simple ko");
        }
        Ok(ko)
    }

    /// Groups containing `pt` or one of its neighbors, each reported once.
    /// The group holding `pt` itself comes first when `pt` is occupied.
    pub fn groups_around(&self, pt: Point) -> Vec<Group> {
        let mut visited = vec![false; BOARD_POINTS];
        let mut groups = Vec::new();
        for p in std::iter::once(pt).chain(pt.neighbors()) {
            if !p.in_bounds() || visited[p.idx()] {
                continue;
            }
            if let Some(group) = self.group_at(p) {
                for m in &group.points {
                    visited[m.idx()] = true;
                }
                groups.push(group);
            }
        }
        groups
    }

    /// Flood-fill the group containing `pt`, counting its liberties.
    pub fn group_at(&self, pt: Point) -> Option<Group> {
        let color = self.get(pt)?;
        let mut stack = vec![pt];
        let mut in_group = vec![false; BOARD_POINTS];
        let mut is_liberty = vec![false; BOARD_POINTS];
        let mut points = Vec::new();
        let mut liberties = 0;
        in_group[pt.idx()] = true;
        while let Some(cur) = stack.pop() {
            points.push(cur);
            for n in cur.neighbors() {
                let ni = n.idx();
                match self.cells[ni] {
                    None if !is_liberty[ni] => {
                        is_liberty[ni] = true;
                        liberties += 1;
                    }
                    Some(c) if c == color && !in_group[ni] => {
                        in_group[ni] = true;
                        stack.push(n);
                    }
                    _ => {}
                }
            }
        }
        Some(Group {
            color,
            points,
            liberties,
        })
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..N {
            write!(f, "{:>2} ", N - row)?;
            for col in 0..N {
                let ch = match self.get(Point::new(row, col)) {
                    Some(Color::Black) => 'X',
                    Some(Color::White) => 'O',
                    None if STAR_POINTS.contains(&(row, col)) => '+',
                    None => '.',
                };
                write!(f, "{ch} ")?;
            }
            writeln!(f)?;
        }
        write!(f, "   ")?;
        for &c in COL_NAMES {
            write!(f, "{} ", c as char)?;
        }
        writeln!(f)
    }
}
