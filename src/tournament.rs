//! Parallel battles between two agents.

use rayon::prelude::*;
use serde::Serialize;

use crate::ai::Agent;
use crate::board::Board;
use crate::error::GameError;
use crate::game::{Game, GameConfig};
use crate::types::Outcome;

#[derive(Debug, Clone, Copy)]
pub struct BattleConfig {
    pub games: usize,
    /// Game `i` is seeded with `seed + i`.
    pub seed: Option<u64>,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            games: 100,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BattleSummary {
    pub games: usize,
    pub black_wins: usize,
    pub white_wins: usize,
    pub draws: usize,
    /// Games a host stopped before a terminal position.
    pub aborted: usize,
    /// Games ended by a contract violation.
    pub errors: usize,
}

impl BattleSummary {
    fn record(&mut self, result: &Result<Outcome, GameError>) {
        self.games += 1;
        match result {
            Ok(Outcome::BlackWins) => self.black_wins += 1,
            Ok(Outcome::WhiteWins) => self.white_wins += 1,
            Ok(Outcome::Draw) => self.draws += 1,
            Ok(Outcome::InProgress) => self.aborted += 1,
            Err(_) => self.errors += 1,
        }
    }
}

/// Plays `config.games` independent games. Every game gets its own board
/// and fresh clones of both agents; results are tallied once all finish.
pub fn battle(config: &BattleConfig, black: &dyn Agent, white: &dyn Agent) -> BattleSummary {
    let mut summary = BattleSummary::default();
    for (result, _) in &play_games(config, black, white) {
        summary.record(result);
    }
    tracing::info!(
        black = black.name(),
        white = white.name(),
        games = summary.games,
        black_wins = summary.black_wins,
        white_wins = summary.white_wins,
        draws = summary.draws,
        "battle finished"
    );
    summary
}

/// Game `i` and both of its agent clones are seeded from `base + i`, where
/// `base` is the configured seed or a fresh draw per battle.
fn play_games(
    config: &BattleConfig,
    black: &dyn Agent,
    white: &dyn Agent,
) -> Vec<(Result<Outcome, GameError>, Board)> {
    let base = config.seed.unwrap_or_else(|| fastrand::u64(..));
    let seats: Vec<(Box<dyn Agent>, Box<dyn Agent>)> = (0..config.games)
        .map(|_| (black.clone_agent(), white.clone_agent()))
        .collect();

    seats
        .into_par_iter()
        .enumerate()
        .map(|(index, (mut black, mut white))| {
            let seed = base.wrapping_add(index as u64);
            black.reseed(seed.wrapping_mul(2));
            white.reseed(seed.wrapping_mul(2).wrapping_add(1));

            let (result, board) = match Game::with_config(black, white, GameConfig { seed: Some(seed) }) {
                Ok(mut game) => (game.run(), *game.board()),
                Err(err) => (Err(err), Board::empty()),
            };
            if let Err(err) = &result {
                tracing::warn!(game = index, %err, "game failed");
            }
            (result, board)
        })
        .collect()
}
