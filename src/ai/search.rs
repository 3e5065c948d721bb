use web_time::{Duration, Instant};

use crate::ai::{Agent, Seat};
use crate::board::Board;
use crate::error::GameError;
use crate::rules::{count_stones, legal_moves, place_stone, undo_move};
use crate::types::{Position, Side};

const DEFAULT_TIMEOUT_MILLIS: u64 = 1_000;
const DEFAULT_MAX_DEPTH: u8 = 4;
const DEFAULT_EXACT_EMPTIES: u8 = 10;
const MIN_SCORE: f32 = f32::NEG_INFINITY;
const MAX_SCORE: f32 = f32::INFINITY;

/// Static position score from `side`'s point of view.
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, board: &Board, side: Side) -> f32;
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SearchResult {
    Complete(Option<Position>, f32),
    TimedOut,
}

impl SearchResult {
    fn negate(self) -> Self {
        match self {
            Self::Complete(mv, score) => Self::Complete(mv, -score),
            Self::TimedOut => Self::TimedOut,
        }
    }
}

/// Iterative-deepening negamax with alpha-beta pruning.
///
/// All lookahead happens on one scratch copy of the board through
/// `place_stone`/`undo_move`.
pub struct Searcher<'a, E: Evaluator + ?Sized> {
    evaluator: &'a E,
    start_time: Instant,
    timeout: Duration,
    max_depth: u8,
    exact_empties: u8,
    timed_out: bool,
}

impl<'a, E: Evaluator + ?Sized> Searcher<'a, E> {
    pub fn new(evaluator: &'a E, max_depth: u8) -> Self {
        Self::with_timeout(
            evaluator,
            max_depth,
            Duration::from_millis(DEFAULT_TIMEOUT_MILLIS),
        )
    }

    pub fn with_timeout(evaluator: &'a E, max_depth: u8, timeout: Duration) -> Self {
        Self {
            evaluator,
            start_time: Instant::now(),
            timeout,
            max_depth,
            exact_empties: DEFAULT_EXACT_EMPTIES,
            timed_out: false,
        }
    }

    /// Empty-square count at or below which the endgame is solved exactly.
    pub fn exact_empties(mut self, empties: u8) -> Self {
        self.exact_empties = empties;
        self
    }

    /// Searches the best move, `None` when `side` cannot move.
    pub fn search(&mut self, board: &Board, side: Side) -> Option<Position> {
        self.start_time = Instant::now();
        self.timed_out = false;

        let moves = legal_moves(side, board);
        match moves.len() {
            0 => return None,
            1 => return Some(moves[0]),
            _ => {}
        }

        let mut scratch = *board;
        let mut best_move = moves[0];

        for depth in 1..=self.max_depth {
            match self.negaalpha(&mut scratch, side, depth, depth, MIN_SCORE, MAX_SCORE) {
                SearchResult::Complete(Some(mv), _score) => best_move = mv,
                SearchResult::Complete(None, _) => {}
                SearchResult::TimedOut => break,
            }
        }

        if board.empty_count() <= self.exact_empties
            && !self.timed_out
            && let SearchResult::Complete(Some(mv), _score) =
                self.negaalpha_exact(&mut scratch, side, MIN_SCORE, MAX_SCORE)
        {
            best_move = mv;
        }

        debug_assert_eq!(&scratch, board, "search must leave the scratch board untouched");
        Some(best_move)
    }

    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    fn negaalpha(
        &mut self,
        board: &mut Board,
        side: Side,
        depth: u8,
        root_depth: u8,
        alpha: f32,
        beta: f32,
    ) -> SearchResult {
        // Depth-1 always completes, so there is a move even on a tiny budget.
        if root_depth > 1 && self.start_time.elapsed() >= self.timeout {
            self.timed_out = true;
            return SearchResult::TimedOut;
        }

        if depth == 0 {
            return SearchResult::Complete(None, self.evaluator.evaluate(board, side));
        }

        let moves = legal_moves(side, board);
        if moves.is_empty() {
            if legal_moves(side.other(), board).is_empty() {
                return SearchResult::Complete(None, exact_score(board, side));
            }
            return self
                .negaalpha(board, side.other(), depth, root_depth, -beta, -alpha)
                .negate();
        }

        let moves = self.sorted_moves(moves, board, side);
        self.expand(board, side, moves, alpha, beta, |searcher, next, alpha| {
            searcher.negaalpha(next, side.other(), depth - 1, root_depth, -beta, -alpha)
        })
    }

    fn negaalpha_exact(&mut self, board: &mut Board, side: Side, alpha: f32, beta: f32) -> SearchResult {
        if self.start_time.elapsed() >= self.timeout {
            self.timed_out = true;
            return SearchResult::TimedOut;
        }

        if board.empty_count() == 0 {
            return SearchResult::Complete(None, exact_score(board, side));
        }

        let moves = legal_moves(side, board);
        if moves.is_empty() {
            if legal_moves(side.other(), board).is_empty() {
                return SearchResult::Complete(None, exact_score(board, side));
            }
            return self
                .negaalpha_exact(board, side.other(), -beta, -alpha)
                .negate();
        }

        let moves = self.sorted_moves(moves, board, side);
        self.expand(board, side, moves, alpha, beta, |searcher, next, alpha| {
            searcher.negaalpha_exact(next, side.other(), -beta, -alpha)
        })
    }

    /// Plays each move on `board`, scores the child with `child` under the
    /// current alpha, undoes it.
    fn expand(
        &mut self,
        board: &mut Board,
        side: Side,
        moves: Vec<Position>,
        alpha: f32,
        beta: f32,
        mut child: impl FnMut(&mut Self, &mut Board, f32) -> SearchResult,
    ) -> SearchResult {
        let mut best_move = moves[0];
        let mut best_score = MIN_SCORE;
        let mut alpha = alpha;

        for mv in moves {
            let Ok(played) = place_stone(mv, side, board) else {
                continue;
            };
            let result = child(self, board, alpha);
            undo_move(&played, board);

            match result {
                SearchResult::TimedOut => return SearchResult::TimedOut,
                SearchResult::Complete(_, score) => {
                    let score = -score;
                    if is_better_move(score, mv, best_score, best_move) {
                        best_score = score;
                        best_move = mv;
                    }
                    if score > alpha {
                        alpha = score;
                    }
                    if alpha >= beta {
                        break;
                    }
                }
            }
        }

        SearchResult::Complete(Some(best_move), best_score)
    }

    fn sorted_moves(&self, moves: Vec<Position>, board: &mut Board, side: Side) -> Vec<Position> {
        let mut scored: Vec<(Position, f32)> = moves
            .into_iter()
            .filter_map(|mv| {
                let played = place_stone(mv, side, board).ok()?;
                // Move ordering heuristic from the mover's perspective.
                let score = -self.evaluator.evaluate(board, side.other());
                undo_move(&played, board);
                Some((mv, score))
            })
            .collect();

        scored.sort_by(|(left_mv, left_score), (right_mv, right_score)| {
            right_score
                .total_cmp(left_score)
                .then_with(|| left_mv.cmp(right_mv))
        });

        scored.into_iter().map(|(mv, _)| mv).collect()
    }
}

fn is_better_move(score: f32, mv: Position, best_score: f32, best_move: Position) -> bool {
    score > best_score || (score == best_score && mv < best_move)
}

fn exact_score(board: &Board, side: Side) -> f32 {
    f32::from(count_stones(side, board)) - f32::from(count_stones(side.other(), board))
}

/// Alpha-beta agent over any static evaluator.
#[derive(Debug, Clone)]
pub struct SearchAgent<E> {
    seat: Seat,
    evaluator: E,
    max_depth: u8,
    timeout: Duration,
}

impl<E: Evaluator + Clone + 'static> SearchAgent<E> {
    pub fn new(evaluator: E) -> Self {
        Self {
            seat: Seat::default(),
            evaluator,
            max_depth: DEFAULT_MAX_DEPTH,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MILLIS),
        }
    }

    pub fn with_depth(mut self, max_depth: u8) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl<E: Evaluator + Clone + 'static> Agent for SearchAgent<E> {
    fn name(&self) -> &str {
        "search"
    }

    fn side(&self) -> Option<Side> {
        self.seat.side()
    }

    fn join(&mut self, side: Side) -> Result<(), GameError> {
        self.seat.join(side)
    }

    fn select_move(&mut self, board: &Board, legal: &[Position]) -> Result<Position, GameError> {
        let side = self.seat.require_side()?;
        if let [only] = legal {
            return Ok(*only);
        }

        let mut searcher = Searcher::with_timeout(&self.evaluator, self.max_depth, self.timeout);
        let mv = searcher
            .search(board, side)
            .ok_or(GameError::NoLegalMove(side))?;
        if searcher.timed_out() {
            tracing::debug!(%side, "search hit its deadline");
        }
        Ok(mv)
    }

    fn clone_agent(&self) -> Box<dyn Agent> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::NUM_SQUARES;

    struct Flat;

    impl Evaluator for Flat {
        fn evaluate(&self, _board: &Board, _side: Side) -> f32 {
            0.0
        }
    }

    #[derive(Clone)]
    struct Material;

    impl Evaluator for Material {
        fn evaluate(&self, board: &Board, side: Side) -> f32 {
            exact_score(board, side)
        }
    }

    /// Black can capture one stone at (0,2) or two at (7,4); white never moves.
    fn two_captures() -> Board {
        stones(&[
            (0, 0, Side::Black),
            (0, 1, Side::White),
            (7, 7, Side::Black),
            (7, 6, Side::White),
            (7, 5, Side::White),
        ])
    }

    fn stones(cells: &[(u8, u8, Side)]) -> Board {
        let mut board = Board::empty();
        for &(row, col, side) in cells {
            board.set(Position::new(row, col), Some(side)).unwrap();
        }
        board
    }

    #[test]
    fn search_returns_single_legal_move_immediately() {
        // Only (0,0) is playable for white.
        let mut board = Board::empty();
        for idx in 0..NUM_SQUARES {
            let pos = Position::from_index(idx).unwrap();
            board.set(pos, Some(Side::White)).unwrap();
        }
        board.set(Position::new(0, 0), None).unwrap();
        board.set(Position::new(0, 1), Some(Side::Black)).unwrap();
        let mut searcher = Searcher::new(&Flat, 6);

        assert_eq!(searcher.search(&board, Side::White), Some(Position::new(0, 0)));
        assert!(!searcher.timed_out());
    }

    #[test]
    fn search_tie_breaks_to_first_row_major_move_when_scores_equal() {
        let mut searcher = Searcher::new(&Flat, 1).exact_empties(0);

        assert_eq!(
            searcher.search(&Board::new(), Side::Black),
            Some(Position::new(2, 4))
        );
    }

    #[test]
    fn search_without_moves_returns_none() {
        let board = stones(&[(0, 0, Side::Black)]);
        let mut searcher = Searcher::new(&Flat, 3);

        assert_eq!(searcher.search(&board, Side::Black), None);
    }

    #[test]
    fn search_depth_one_completes_before_timeout_cutoff() {
        let mut searcher = Searcher::with_timeout(&Flat, 6, Duration::from_nanos(1));
        let board = Board::new();

        let mv = searcher.search(&board, Side::Black).unwrap();

        assert!(legal_moves(Side::Black, &board).contains(&mv));
        assert!(searcher.timed_out());
    }

    #[test]
    fn exact_solve_scores_final_stone_difference() {
        let board = two_captures();
        let mut scratch = board;
        let mut searcher = Searcher::new(&Flat, 1);

        let result = searcher.negaalpha_exact(&mut scratch, Side::Black, MIN_SCORE, MAX_SCORE);

        assert_eq!(result, SearchResult::Complete(Some(Position::new(0, 2)), 7.0));
        assert_eq!(scratch, board);
    }

    #[test]
    fn search_agent_maximizes_evaluator_at_depth_one() {
        let board = two_captures();
        let mut agent = SearchAgent::new(Material).with_depth(1);
        agent.join(Side::Black).unwrap();
        let legal = legal_moves(Side::Black, &board);
        assert_eq!(legal, vec![Position::new(0, 2), Position::new(7, 4)]);

        assert_eq!(agent.select_move(&board, &legal), Ok(Position::new(7, 4)));
    }

    #[test]
    fn search_agent_requires_a_side() {
        let mut agent = SearchAgent::new(Material);
        let board = Board::new();

        assert_eq!(
            agent.select_move(&board, &legal_moves(Side::Black, &board)),
            Err(GameError::UnassignedBoard)
        );
    }
}
