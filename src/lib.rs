//! Reversi board engine, move rules, turn scheduler and a set of
//! interchangeable agents.
//!
//! The same core compiles natively (battles, CLI) and to wasm, where
//! [`wasm`] exposes the rule engine over raw cell arrays.

use wasm_bindgen::prelude::*;

pub mod ai;
pub mod board;
pub mod error;
pub mod game;
pub mod persist;
pub mod rules;
pub mod tournament;
pub mod types;
pub mod wasm;

pub use ai::Agent;
pub use board::Board;
pub use error::{GameError, WeightsError};
pub use game::{Game, GameConfig, GameStatus};
pub use types::{BoardSnapshot, Outcome, Position, Side};

#[wasm_bindgen]
pub fn wasm_ready() -> bool {
    true
}
