use std::path::PathBuf;

use crate::types::{Position, Side};

/// Contract violations raised by the engine, the scheduler and agents.
///
/// None of these are recoverable game conditions; they abort the game.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GameError {
    #[error("position ({row}, {col}) is outside the 8x8 board")]
    OutOfBounds { row: u8, col: u8 },

    #[error("invalid side value {0} (expected 1 for black or -1 for white)")]
    InvalidSide(i8),

    #[error("agent was queried before joining a game")]
    UnassignedBoard,

    #[error("agent already plays {current}, cannot join as {requested}")]
    SideReassigned { current: Side, requested: Side },

    #[error("{side} requested illegal move at {position}")]
    IllegalMoveRequested { side: Side, position: Position },

    #[error("{0} has no legal move")]
    NoLegalMove(Side),

    #[error("input surface closed while waiting for a move")]
    InputClosed,

    #[error("expected 64 cells, got {0}")]
    InvalidCells(usize),
}

/// Failures while reading or writing a weight blob.
#[derive(Debug, thiserror::Error)]
pub enum WeightsError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid weights magic (expected {expected})")]
    Magic { expected: String },

    #[error("unsupported weights version: expected {expected}, got {actual}")]
    Version { expected: u32, actual: u32 },

    #[error("CRC32 mismatch: expected {expected:#010x}, got {actual:#010x}")]
    Crc { expected: u32, actual: u32 },

    #[error("unexpected EOF while reading {0}")]
    Truncated(String),

    #[error("weights payload has trailing bytes")]
    TrailingBytes,

    #[error("weights shape mismatch: {0}")]
    Shape(String),
}
