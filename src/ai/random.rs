use crate::ai::{Agent, Seat};
use crate::board::Board;
use crate::error::GameError;
use crate::types::{Position, Side};

/// Picks uniformly among the legal moves.
#[derive(Debug, Clone)]
pub struct RandomAgent {
    seat: Seat,
    rng: fastrand::Rng,
}

impl RandomAgent {
    pub fn new() -> Self {
        Self {
            seat: Seat::default(),
            rng: fastrand::Rng::new(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            seat: Seat::default(),
            rng: fastrand::Rng::with_seed(seed),
        }
    }
}

impl Default for RandomAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl Agent for RandomAgent {
    fn name(&self) -> &str {
        "random"
    }

    fn side(&self) -> Option<Side> {
        self.seat.side()
    }

    fn join(&mut self, side: Side) -> Result<(), GameError> {
        self.seat.join(side)
    }

    fn select_move(&mut self, _board: &Board, legal: &[Position]) -> Result<Position, GameError> {
        let side = self.seat.require_side()?;
        if legal.is_empty() {
            return Err(GameError::NoLegalMove(side));
        }
        Ok(legal[self.rng.usize(..legal.len())])
    }

    fn reseed(&mut self, seed: u64) {
        self.rng.seed(seed);
    }

    fn clone_agent(&self) -> Box<dyn Agent> {
        Box::new(Self {
            seat: self.seat.clone(),
            rng: self.rng.clone(),
        })
    }
}
