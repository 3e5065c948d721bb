//! Move rule engine.
//!
//! Every function takes the board explicitly, so the same code serves the
//! live game and any caller-owned hypothetical board.

use crate::board::{BOARD_SIZE, Board, EMPTY, check_bounds};
use crate::error::GameError;
use crate::types::{BoardSnapshot, Outcome, Position, Side};

/// Ray directions in capture discovery order.
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

/// Cells changed by one placement: the placed cell first, then captures in
/// ray-discovery order. Feed it back to [`undo_move`] to revert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveResult {
    side: Side,
    changed: Vec<Position>,
}

impl MoveResult {
    pub fn side(&self) -> Side {
        self.side
    }

    pub fn placed(&self) -> Position {
        self.changed[0]
    }

    pub fn captured(&self) -> &[Position] {
        &self.changed[1..]
    }

    pub fn changed(&self) -> &[Position] {
        &self.changed
    }

    pub fn len(&self) -> usize {
        self.changed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }
}

/// Returns legal moves for `side` in row-major order.
pub fn legal_moves(side: Side, board: &Board) -> Vec<Position> {
    all_positions()
        .filter(|&pos| board.raw(pos) == EMPTY && captures_any(pos, side, board))
        .collect()
}

pub fn has_legal_move(side: Side, board: &Board) -> bool {
    all_positions().any(|pos| board.raw(pos) == EMPTY && captures_any(pos, side, board))
}

pub fn is_legal(pos: Position, side: Side, board: &Board) -> Result<bool, GameError> {
    Ok(!capture_positions(pos, side, board)?.is_empty())
}

/// Opponent stones that placing `side` at `pos` would flip.
///
/// Empty when the cell is occupied or no ray is closed by a `side` stone.
pub fn capture_positions(
    pos: Position,
    side: Side,
    board: &Board,
) -> Result<Vec<Position>, GameError> {
    check_bounds(pos)?;
    let mut flips = Vec::new();
    if board.raw(pos) != EMPTY {
        return Ok(flips);
    }

    for (dr, dc) in DIRECTIONS {
        let start = flips.len();
        if !walk_ray(pos, (dr, dc), side, board, |p| flips.push(p)) {
            flips.truncate(start);
        }
    }

    Ok(flips)
}

/// Places one stone and flips captured stones.
///
/// Legality is not re-checked here; callers pick from [`legal_moves`].
pub fn place_stone(pos: Position, side: Side, board: &mut Board) -> Result<MoveResult, GameError> {
    let captured = capture_positions(pos, side, board)?;

    let mut changed = Vec::with_capacity(captured.len() + 1);
    changed.push(pos);
    changed.extend(captured);
    for &p in &changed {
        board.write(p, side.value());
    }

    Ok(MoveResult { side, changed })
}

/// Reverts the `place_stone` call that produced `result`.
///
/// Only valid right after that call, with no other mutation in between.
pub fn undo_move(result: &MoveResult, board: &mut Board) {
    let Some((&placed, captured)) = result.changed.split_first() else {
        return;
    };
    board.write(placed, EMPTY);
    let opponent = result.side.other().value();
    for &p in captured {
        board.write(p, opponent);
    }
}

pub fn count_stones(side: Side, board: &Board) -> u8 {
    all_positions().filter(|&p| board.raw(p) == side.value()).count() as u8
}

/// Game result; terminal only once neither side can move.
pub fn outcome(board: &Board) -> Outcome {
    if Side::BOTH.iter().any(|&side| has_legal_move(side, board)) {
        return Outcome::InProgress;
    }

    let black = count_stones(Side::Black, board);
    let white = count_stones(Side::White, board);
    if black > white {
        Outcome::BlackWins
    } else if white > black {
        Outcome::WhiteWins
    } else {
        Outcome::Draw
    }
}

/// Read-only view of `board` for input surfaces and bindings.
pub fn snapshot(board: &Board, side_to_move: Option<Side>) -> BoardSnapshot {
    BoardSnapshot {
        cells: board.to_array().to_vec(),
        black_count: count_stones(Side::Black, board),
        white_count: count_stones(Side::White, board),
        side_to_move,
        legal_moves: side_to_move
            .map(|side| legal_moves(side, board))
            .unwrap_or_default(),
        outcome: outcome(board),
    }
}

fn all_positions() -> impl Iterator<Item = Position> {
    (0..BOARD_SIZE as u8).flat_map(|row| (0..BOARD_SIZE as u8).map(move |col| Position::new(row, col)))
}

fn captures_any(pos: Position, side: Side, board: &Board) -> bool {
    DIRECTIONS
        .iter()
        .any(|&dir| walk_ray(pos, dir, side, board, |_| {}))
}

/// Scans one ray from `pos`, reporting each opponent stone passed.
/// Returns true when the run is non-empty and closed by a `side` stone.
fn walk_ray(
    pos: Position,
    (dr, dc): (i32, i32),
    side: Side,
    board: &Board,
    mut visit: impl FnMut(Position),
) -> bool {
    let me = side.value();
    let opp = side.other().value();
    let mut r = pos.row as i32 + dr;
    let mut c = pos.col as i32 + dc;
    let mut has_opponent = false;

    while in_bounds(r, c) {
        let square = Position::new(r as u8, c as u8);
        let value = board.raw(square);
        if value == opp {
            has_opponent = true;
            visit(square);
        } else if value == me {
            return has_opponent;
        } else {
            return false;
        }

        r += dr;
        c += dc;
    }

    false
}

fn in_bounds(row: i32, col: i32) -> bool {
    (0..BOARD_SIZE as i32).contains(&row) && (0..BOARD_SIZE as i32).contains(&col)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(row: u8, col: u8) -> Position {
        Position::new(row, col)
    }

    fn board_from_rows(rows: [&str; 8]) -> Board {
        let mut board = Board::empty();
        for (r, line) in rows.iter().enumerate() {
            for (c, ch) in line.chars().enumerate() {
                let cell = match ch {
                    'X' => Some(Side::Black),
                    'O' => Some(Side::White),
                    _ => None,
                };
                board.set(pos(r as u8, c as u8), cell).unwrap();
            }
        }
        board
    }

    #[test]
    fn initial_black_legal_moves_are_four_expected_squares() {
        let board = Board::new();

        assert_eq!(
            legal_moves(Side::Black, &board),
            vec![pos(2, 4), pos(3, 5), pos(4, 2), pos(5, 3)]
        );
        assert_eq!(
            legal_moves(Side::White, &board),
            vec![pos(2, 3), pos(3, 2), pos(4, 5), pos(5, 4)]
        );
    }

    #[test]
    fn run_closed_by_own_stone_is_captured_in_ray_order() {
        let mut board = board_from_rows([
            "XOO.....", "........", "........", "........", "........", "........",
            "........", "........",
        ]);

        let result = place_stone(pos(0, 3), Side::Black, &mut board).unwrap();

        assert_eq!(result.changed(), &[pos(0, 3), pos(0, 2), pos(0, 1)]);
        assert_eq!(result.len(), 3);
        assert_eq!(count_stones(Side::Black, &board), 4);
        assert_eq!(count_stones(Side::White, &board), 0);
    }

    #[test]
    fn captures_follow_direction_then_distance_order() {
        // Black plays (3,3): captures up-left, up, right and down.
        let mut board = board_from_rows([
            "X..X....", ".O.O....", "..OO....", "........", "...O....", "...X....",
            "........", "........",
        ]);
        board.set(pos(3, 4), Some(Side::White)).unwrap();
        board.set(pos(3, 5), Some(Side::Black)).unwrap();

        let captured = capture_positions(pos(3, 3), Side::Black, &board).unwrap();

        assert_eq!(
            captured,
            vec![pos(2, 2), pos(1, 1), pos(2, 3), pos(1, 3), pos(3, 4), pos(4, 3)]
        );
    }

    #[test]
    fn ray_ending_on_empty_or_edge_contributes_nothing() {
        let board = board_from_rows([
            ".OOX....", "........", "........", "........", "........", "........",
            "........", ".......O",
        ]);

        assert!(capture_positions(pos(0, 4), Side::Black, &board).unwrap().is_empty());
        assert!(capture_positions(pos(6, 6), Side::Black, &board).unwrap().is_empty());
        assert_eq!(
            capture_positions(pos(0, 0), Side::Black, &board).unwrap(),
            vec![pos(0, 1), pos(0, 2)]
        );
    }

    #[test]
    fn occupied_cell_has_no_captures() {
        let board = Board::new();

        assert!(capture_positions(pos(3, 3), Side::White, &board).unwrap().is_empty());
        assert_eq!(is_legal(pos(3, 3), Side::White, &board), Ok(false));
    }

    #[test]
    fn out_of_bounds_position_is_rejected() {
        let mut board = Board::new();
        let before = board;

        assert_eq!(
            capture_positions(pos(0, 8), Side::Black, &board),
            Err(GameError::OutOfBounds { row: 0, col: 8 })
        );
        assert_eq!(
            place_stone(pos(9, 9), Side::Black, &mut board),
            Err(GameError::OutOfBounds { row: 9, col: 9 })
        );
        assert_eq!(board, before);
    }

    #[test]
    fn undo_restores_board_after_opening_move() {
        let mut board = Board::new();
        let before = board;

        let result = place_stone(pos(2, 4), Side::Black, &mut board).unwrap();
        assert_eq!(result.placed(), pos(2, 4));
        assert_eq!(result.captured(), &[pos(3, 4)]);
        assert_ne!(board, before);

        undo_move(&result, &mut board);
        assert_eq!(board, before);
    }

    #[test]
    fn full_board_with_equal_counts_is_draw() {
        let board = board_from_rows([
            "XXXXXXXX", "XXXXXXXX", "XXXXXXXX", "XXXXXXXX", "OOOOOOOO", "OOOOOOOO",
            "OOOOOOOO", "OOOOOOOO",
        ]);

        assert!(legal_moves(Side::Black, &board).is_empty());
        assert!(legal_moves(Side::White, &board).is_empty());
        assert_eq!(outcome(&board), Outcome::Draw);
    }

    #[test]
    fn more_stones_wins_once_nobody_can_move() {
        let mut board = board_from_rows([
            "XXXXXXXX", "XXXXXXXX", "XXXXXXXX", "XXXXXXXX", "XOOOOOOO", "OOOOOOOO",
            "OOOOOOOO", "OOOOOOOO",
        ]);
        assert_eq!(outcome(&board), Outcome::BlackWins);

        board.set(pos(4, 0), Some(Side::White)).unwrap();
        board.set(pos(3, 0), Some(Side::White)).unwrap();
        assert_eq!(outcome(&board), Outcome::WhiteWins);
    }

    #[test]
    fn blocked_position_with_empty_cells_is_terminal() {
        // Only black stones left: nobody can capture anything.
        let board = board_from_rows([
            "XX......", "........", "........", "........", "........", "........",
            "........", "........",
        ]);

        assert_eq!(outcome(&board), Outcome::BlackWins);
    }

    #[test]
    fn in_progress_while_only_one_side_can_move() {
        let board = board_from_rows([
            ".XOOOOOO", "OOOOOOOO", "OOOOOOOO", "OOOOOOOO", "OOOOOOOO", "OOOOOOOO",
            "OOOOOOOO", "OOOOOOOO",
        ]);

        assert!(legal_moves(Side::Black, &board).is_empty());
        assert_eq!(legal_moves(Side::White, &board), vec![pos(0, 0)]);
        assert_eq!(outcome(&board), Outcome::InProgress);
    }

    #[test]
    fn snapshot_reports_counts_and_moves() {
        let board = Board::new();

        let view = snapshot(&board, Some(Side::White));

        assert_eq!(view.cells.len(), 64);
        assert_eq!(view.cells[27], 1);
        assert_eq!(view.cells[28], -1);
        assert_eq!((view.black_count, view.white_count), (2, 2));
        assert_eq!(view.legal_moves.len(), 4);
        assert_eq!(view.outcome, Outcome::InProgress);
        assert!(snapshot(&board, None).legal_moves.is_empty());
    }
}
