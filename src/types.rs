use std::fmt;

use serde::Serialize;

use crate::error::GameError;

/// A board coordinate.
///
/// Fields are public; the rule engine rejects anything outside `0..8` with
/// [`GameError::OutOfBounds`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Position {
    pub row: u8,
    pub col: u8,
}

impl Position {
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    /// Row-major square index (0..=63).
    pub fn index(self) -> usize {
        self.row as usize * 8 + self.col as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        (index < 64).then(|| Self::new((index / 8) as u8, (index % 8) as u8))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// One of the two competing identities. Stored on the board as `+1`/`-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Side {
    Black,
    White,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Black, Side::White];

    pub fn other(self) -> Self {
        match self {
            Side::Black => Side::White,
            Side::White => Side::Black,
        }
    }

    /// Cell value of this side's stones.
    pub fn value(self) -> i8 {
        match self {
            Side::Black => 1,
            Side::White => -1,
        }
    }
}

impl TryFrom<i8> for Side {
    type Error = GameError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Side::Black),
            -1 => Ok(Side::White),
            other => Err(GameError::InvalidSide(other)),
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

/// Result of evaluating a board for termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Outcome {
    BlackWins,
    WhiteWins,
    Draw,
    InProgress,
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        self != Outcome::InProgress
    }

    pub fn winner(self) -> Option<Side> {
        match self {
            Outcome::BlackWins => Some(Side::Black),
            Outcome::WhiteWins => Some(Side::White),
            Outcome::Draw | Outcome::InProgress => None,
        }
    }
}

/// Read-only board view handed to input surfaces and JS callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardSnapshot {
    /// Row-major cells: 0=empty, 1=black, -1=white.
    pub cells: Vec<i8>,
    pub black_count: u8,
    pub white_count: u8,
    /// `None` when the snapshot was taken outside of a turn.
    pub side_to_move: Option<Side>,
    /// Legal moves of `side_to_move`; empty when it is `None`.
    pub legal_moves: Vec<Position>,
    pub outcome: Outcome,
}
