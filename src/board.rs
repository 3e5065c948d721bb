use std::fmt;

use crate::error::GameError;
use crate::types::{Position, Side};

pub const BOARD_SIZE: usize = 8;
pub const NUM_SQUARES: usize = BOARD_SIZE * BOARD_SIZE;

pub(crate) const EMPTY: i8 = 0;

/// Reversi board state: 64 cells holding 0 (empty), 1 (black) or -1 (white).
///
/// The board is a plain `Copy` value. Any simulation works on its own copy,
/// so a hypothetical board can never alias the live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [[i8; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// Creates the initial board:
    /// (3,3)=black, (3,4)=white, (4,3)=white, (4,4)=black.
    pub fn new() -> Self {
        let mut board = Self::empty();
        board.reset();
        board
    }

    pub fn empty() -> Self {
        Self {
            cells: [[EMPTY; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    /// Clears the board and lays out the four opening stones.
    pub fn reset(&mut self) {
        self.cells = [[EMPTY; BOARD_SIZE]; BOARD_SIZE];
        self.cells[3][3] = Side::Black.value();
        self.cells[3][4] = Side::White.value();
        self.cells[4][3] = Side::White.value();
        self.cells[4][4] = Side::Black.value();
    }

    /// Builds a board from 64 row-major cell values.
    pub fn from_cells(cells: &[i8]) -> Result<Self, GameError> {
        if cells.len() != NUM_SQUARES {
            return Err(GameError::InvalidCells(cells.len()));
        }

        let mut board = Self::empty();
        for (idx, &value) in cells.iter().enumerate() {
            if value != EMPTY {
                Side::try_from(value)?;
            }
            board.cells[idx / BOARD_SIZE][idx % BOARD_SIZE] = value;
        }
        Ok(board)
    }

    /// Returns the owner of a cell, `None` when it is empty.
    pub fn get(&self, pos: Position) -> Result<Option<Side>, GameError> {
        check_bounds(pos)?;
        Ok(side_of(self.raw(pos)))
    }

    /// Puts a stone (or clears the cell) without applying any capture rule.
    /// Meant for setting up positions; games go through `rules::place_stone`.
    pub fn set(&mut self, pos: Position, cell: Option<Side>) -> Result<(), GameError> {
        check_bounds(pos)?;
        self.write(pos, cell.map_or(EMPTY, Side::value));
        Ok(())
    }

    /// Converts board to row-major `[i8; 64]`.
    pub fn to_array(&self) -> [i8; NUM_SQUARES] {
        let mut out = [EMPTY; NUM_SQUARES];
        for (idx, cell) in out.iter_mut().enumerate() {
            *cell = self.cells[idx / BOARD_SIZE][idx % BOARD_SIZE];
        }
        out
    }

    /// Returns the number of empty squares.
    pub fn empty_count(&self) -> u8 {
        self.cells.iter().flatten().filter(|&&c| c == EMPTY).count() as u8
    }

    pub(crate) fn raw(&self, pos: Position) -> i8 {
        self.cells[pos.row as usize][pos.col as usize]
    }

    pub(crate) fn write(&mut self, pos: Position, value: i8) {
        self.cells[pos.row as usize][pos.col as usize] = value;
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  0 1 2 3 4 5 6 7")?;
        for (row, cells) in self.cells.iter().enumerate() {
            write!(f, "{row}")?;
            for &cell in cells {
                let glyph = match cell {
                    1 => 'X',
                    -1 => 'O',
                    _ => '.',
                };
                write!(f, " {glyph}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

pub(crate) fn check_bounds(pos: Position) -> Result<(), GameError> {
    if (pos.row as usize) < BOARD_SIZE && (pos.col as usize) < BOARD_SIZE {
        Ok(())
    } else {
        Err(GameError::OutOfBounds {
            row: pos.row,
            col: pos.col,
        })
    }
}

fn side_of(value: i8) -> Option<Side> {
    Side::try_from(value).ok()
}
