//! Agent contract and the concrete strategies.

pub mod evaluation;
pub mod human;
pub mod neural;
pub mod ntuple;
pub mod random;
pub mod search;

use crate::board::Board;
use crate::error::GameError;
use crate::types::{Outcome, Position, Side};

pub use evaluation::EvaluationBoardAgent;
pub use human::{HumanAgent, HumanHandle, SurfaceEvent};
pub use neural::NeuralAgent;
pub use ntuple::{NTupleAgent, NTupleEvaluator};
pub use random::RandomAgent;
pub use search::{Evaluator, SearchAgent};

/// A participant the scheduler can seat in a game.
///
/// The scheduler never calls `select_move` when `legal` is empty.
pub trait Agent: Send {
    fn name(&self) -> &str;

    fn side(&self) -> Option<Side>;

    /// Attaches the agent to a game as `side`.
    fn join(&mut self, side: Side) -> Result<(), GameError>;

    fn on_board_changed(&mut self, _board: &Board) {}

    fn on_game_ended(&mut self, _board: &Board, _outcome: Outcome) {}

    /// Picks one of `legal` for the live `board`.
    fn select_move(&mut self, board: &Board, legal: &[Position]) -> Result<Position, GameError>;

    /// `false` once the host (e.g. an input surface) has been closed.
    fn is_running(&self) -> bool {
        true
    }

    /// Restarts the agent's random stream, if it has one.
    fn reseed(&mut self, _seed: u64) {}

    /// Deep copy including learned parameters, for use in another game.
    ///
    /// Agents backed by an external surface (see [`HumanAgent`]) cannot be
    /// duplicated; their clones stay attached to the same surface.
    fn clone_agent(&self) -> Box<dyn Agent>;
}

/// Identity bookkeeping shared by all agents: the side, assigned once.
#[derive(Debug, Clone, Default)]
pub struct Seat {
    side: Option<Side>,
}

impl Seat {
    pub fn side(&self) -> Option<Side> {
        self.side
    }

    /// Assigns the side. Re-joining as the same side is a no-op.
    pub fn join(&mut self, side: Side) -> Result<(), GameError> {
        match self.side {
            Some(current) if current != side => Err(GameError::SideReassigned {
                current,
                requested: side,
            }),
            _ => {
                self.side = Some(side);
                Ok(())
            }
        }
    }

    /// Side of an agent that has joined a game.
    pub fn require_side(&self) -> Result<Side, GameError> {
        self.side.ok_or(GameError::UnassignedBoard)
    }
}

/// Index of the highest score; the earliest wins ties.
pub(crate) fn argmax(scores: impl IntoIterator<Item = f32>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, score) in scores.into_iter().enumerate() {
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((idx, score));
        }
    }
    best.map(|(idx, _)| idx)
}
