use crate::ai::Agent;
use crate::board::Board;
use crate::error::GameError;
use crate::rules::{legal_moves, outcome, place_stone};
use crate::types::{Outcome, Side};

/// Scheduler lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    NotStarted,
    Active(Side),
    /// Holds `InProgress` when the game was aborted by a host.
    Finished(Outcome),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GameConfig {
    /// Seeds the first-mover draw; `None` uses fresh entropy.
    pub seed: Option<u64>,
}

/// One live game between two seated agents.
pub struct Game {
    board: Board,
    black: Box<dyn Agent>,
    white: Box<dyn Agent>,
    status: GameStatus,
    first_to_move: Option<Side>,
    rng: fastrand::Rng,
}

impl Game {
    pub fn new(black: Box<dyn Agent>, white: Box<dyn Agent>) -> Result<Self, GameError> {
        Self::with_config(black, white, GameConfig::default())
    }

    pub fn with_config(
        mut black: Box<dyn Agent>,
        mut white: Box<dyn Agent>,
        config: GameConfig,
    ) -> Result<Self, GameError> {
        black.join(Side::Black)?;
        white.join(Side::White)?;
        Ok(Self {
            board: Board::empty(),
            black,
            white,
            status: GameStatus::NotStarted,
            first_to_move: None,
            rng: config.seed.map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed),
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn first_to_move(&self) -> Option<Side> {
        self.first_to_move
    }

    pub fn agent(&self, side: Side) -> &dyn Agent {
        match side {
            Side::Black => self.black.as_ref(),
            Side::White => self.white.as_ref(),
        }
    }

    /// Plays the game to the end (or until a host aborts it).
    pub fn run(&mut self) -> Result<Outcome, GameError> {
        self.board.reset();
        let first = draw_first_mover(&mut self.rng);
        self.first_to_move = Some(first);
        self.status = GameStatus::Active(first);

        play_from(
            &mut self.board,
            first,
            self.black.as_mut(),
            self.white.as_mut(),
            &mut self.status,
        )
    }
}

/// Runs one game on a caller-owned board: opening layout, random first
/// mover, then the turn loop. `black` and `white` join their sides here.
pub fn run(
    board: &mut Board,
    black: &mut dyn Agent,
    white: &mut dyn Agent,
    rng: &mut fastrand::Rng,
) -> Result<Outcome, GameError> {
    black.join(Side::Black)?;
    white.join(Side::White)?;
    board.reset();
    let first = draw_first_mover(rng);
    let mut status = GameStatus::Active(first);
    play_from(board, first, black, white, &mut status)
}

fn draw_first_mover(rng: &mut fastrand::Rng) -> Side {
    if rng.bool() { Side::Black } else { Side::White }
}

/// Turn loop from an arbitrary position. Both agents get a board-changed
/// signal before the first move and a game-ended signal on every exit.
fn play_from(
    board: &mut Board,
    first: Side,
    black: &mut dyn Agent,
    white: &mut dyn Agent,
    status: &mut GameStatus,
) -> Result<Outcome, GameError> {
    let mut to_move = first;
    let mut moves = 0usize;
    black.on_board_changed(board);
    white.on_board_changed(board);

    let result = loop {
        let current = outcome(board);
        if current.is_terminal() {
            break Ok(current);
        }
        if !black.is_running() || !white.is_running() {
            tracing::warn!(moves, "agent stopped running, aborting game");
            break Ok(current);
        }

        let legal = legal_moves(to_move, board);
        if legal.is_empty() {
            tracing::debug!(side = %to_move, "no legal move, passing");
            to_move = to_move.other();
            *status = GameStatus::Active(to_move);
            continue;
        }

        let agent: &mut dyn Agent = match to_move {
            Side::Black => &mut *black,
            Side::White => &mut *white,
        };
        let mv = match agent.select_move(board, &legal) {
            Ok(mv) => mv,
            Err(err) if !agent.is_running() => {
                tracing::warn!(side = %to_move, %err, "agent closed while choosing, aborting game");
                break Ok(outcome(board));
            }
            Err(err) => break Err(err),
        };
        if !legal.contains(&mv) {
            tracing::warn!(side = %to_move, position = %mv, "agent requested an illegal move");
            break Err(GameError::IllegalMoveRequested {
                side: to_move,
                position: mv,
            });
        }

        let placed = match place_stone(mv, to_move, board) {
            Ok(placed) => placed,
            Err(err) => break Err(err),
        };
        moves += 1;
        tracing::debug!(
            side = %to_move,
            position = %mv,
            captured = placed.captured().len(),
            "move applied"
        );

        black.on_board_changed(board);
        white.on_board_changed(board);
        to_move = to_move.other();
        *status = GameStatus::Active(to_move);
    };

    let final_outcome = outcome(board);
    black.on_game_ended(board, final_outcome);
    white.on_game_ended(board, final_outcome);
    *status = GameStatus::Finished(final_outcome);
    if let Ok(reported) = result {
        tracing::info!(outcome = ?reported, moves, "game over");
    }
    result
}
