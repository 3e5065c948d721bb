//! JS bindings over raw cell arrays.
//!
//! Boards cross the boundary as 64 row-major `i8` values (0 empty, 1 black,
//! -1 white) and sides as `1` / `-1`. Results come back as plain JS objects.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::board::Board;
use crate::error::GameError;
use crate::rules;
use crate::types::{Position, Side};

#[derive(Debug, Serialize)]
struct Placement {
    cells: Vec<i8>,
    captured: Vec<Position>,
}

fn parse(cells: &[i8], side: i8) -> Result<(Board, Side), GameError> {
    Ok((Board::from_cells(cells)?, Side::try_from(side)?))
}

/// Legal moves for `side` as `[{ row, col }, ...]`.
#[wasm_bindgen]
pub fn legal_moves(cells: &[i8], side: i8) -> Result<JsValue, JsError> {
    let (board, side) = parse(cells, side)?;
    Ok(serde_wasm_bindgen::to_value(&rules::legal_moves(side, &board))?)
}

/// Plays a legal move and returns `{ cells, captured }`.
#[wasm_bindgen]
pub fn place_stone(cells: &[i8], row: u8, col: u8, side: i8) -> Result<JsValue, JsError> {
    let (mut board, side) = parse(cells, side)?;
    let position = Position::new(row, col);
    if !rules::is_legal(position, side, &board)? {
        return Err(GameError::IllegalMoveRequested { side, position }.into());
    }

    let played = rules::place_stone(position, side, &mut board)?;
    let placement = Placement {
        cells: board.to_array().to_vec(),
        captured: played.captured().to_vec(),
    };
    Ok(serde_wasm_bindgen::to_value(&placement)?)
}

#[wasm_bindgen]
pub fn outcome(cells: &[i8]) -> Result<JsValue, JsError> {
    let board = Board::from_cells(cells)?;
    Ok(serde_wasm_bindgen::to_value(&rules::outcome(&board))?)
}

/// Full snapshot; `side_to_move` of `0` means nobody is on move.
#[wasm_bindgen]
pub fn snapshot(cells: &[i8], side_to_move: i8) -> Result<JsValue, JsError> {
    let board = Board::from_cells(cells)?;
    let side = match side_to_move {
        0 => None,
        value => Some(Side::try_from(value)?),
    };
    Ok(serde_wasm_bindgen::to_value(&rules::snapshot(&board, side))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_bad_side_and_short_boards() {
        let cells = Board::new().to_array();

        assert_eq!(parse(&cells, 2).unwrap_err(), GameError::InvalidSide(2));
        assert_eq!(parse(&cells[..10], 1).unwrap_err(), GameError::InvalidCells(10));
        assert!(parse(&cells, -1).is_ok());
    }
}
