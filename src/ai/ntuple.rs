use std::path::Path;

use once_cell::sync::Lazy;

use crate::ai::search::Evaluator;
use crate::ai::{Agent, Seat, argmax};
use crate::board::{BOARD_SIZE, Board, NUM_SQUARES};
use crate::error::{GameError, WeightsError};
use crate::persist::{self, Reader};
use crate::rules::{place_stone, undo_move};
use crate::types::{Position, Side};

const MAGIC: &[u8; 4] = b"NTRV";
const MAX_TUPLE_LEN: usize = 10;

/// Edge row, the row next to it, the main diagonal and the corner 3x3 block.
/// Rotations cover the other three edges and corners.
static DEFAULT_TUPLES: Lazy<Vec<Vec<u8>>> = Lazy::new(|| {
    let edge: Vec<u8> = (0..8).collect();
    let second: Vec<u8> = (8..16).collect();
    let diagonal: Vec<u8> = (0..8).map(|i| i * 9).collect();
    let corner: Vec<u8> = [0, 1, 2, 8, 9, 10, 16, 17, 18].to_vec();
    vec![edge, second, diagonal, corner]
});

/// Linear evaluator over n-tuple features, loaded from a `NTRV` blob.
#[derive(Debug, Clone, PartialEq)]
pub struct NTupleEvaluator {
    tuples: Vec<Vec<u8>>,
    weights: Vec<Vec<f32>>,
}

impl NTupleEvaluator {
    /// Default tuple set with every weight at zero.
    pub fn zeroed() -> Self {
        let tuples = DEFAULT_TUPLES.clone();
        let weights = tuples.iter().map(|t| vec![0.0; 3usize.pow(t.len() as u32)]).collect();
        Self { tuples, weights }
    }

    pub fn new(tuples: Vec<Vec<u8>>, weights: Vec<Vec<f32>>) -> Result<Self, WeightsError> {
        if tuples.len() != weights.len() {
            return Err(WeightsError::Shape(format!(
                "{} tuples but {} weight tables",
                tuples.len(),
                weights.len()
            )));
        }
        for (idx, (tuple, table)) in tuples.iter().zip(&weights).enumerate() {
            validate_tuple(idx, tuple)?;
            let expected = pow3(tuple.len())?;
            if table.len() != expected {
                return Err(WeightsError::Shape(format!(
                    "tuple #{idx} needs {expected} weights, got {}",
                    table.len()
                )));
            }
        }
        Ok(Self { tuples, weights })
    }

    /// Deserialize evaluator data from the `NTRV` format.
    pub fn from_bytes(data: &[u8]) -> Result<Self, WeightsError> {
        let (num_tuples, payload) = persist::decode(MAGIC, data)?;
        let num_tuples = num_tuples as usize;
        let mut reader = Reader::new(payload);

        let mut tuples = Vec::new();
        for tuple_idx in 0..num_tuples {
            let what = format!("tuple definition #{tuple_idx}");
            let tuple_size = reader.u8(&what)? as usize;
            let tuple = reader.bytes(tuple_size, &what)?.to_vec();
            validate_tuple(tuple_idx, &tuple)?;
            tuples.push(tuple);
        }

        let mut weights = Vec::with_capacity(tuples.len());
        for (tuple_idx, tuple) in tuples.iter().enumerate() {
            let entries = pow3(tuple.len())?;
            weights.push(reader.f32s(entries, &format!("weights for tuple #{tuple_idx}"))?);
        }
        reader.finish()?;

        Ok(Self { tuples, weights })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut payload = Vec::new();
        for tuple in &self.tuples {
            payload.push(tuple.len() as u8);
            payload.extend_from_slice(tuple);
        }
        for table in &self.weights {
            persist::push_f32s(&mut payload, table);
        }
        persist::encode(MAGIC, self.tuples.len() as u32, &payload)
    }

    /// Feature indices of `board` seen by `side`, one per tuple and rotation.
    pub fn features(&self, board: &Board, side: Side) -> Vec<(usize, usize)> {
        let cells = board.to_array();
        let mut out = Vec::with_capacity(self.tuples.len() * 4);
        for rotation in 0..4u8 {
            for (tuple_idx, tuple) in self.tuples.iter().enumerate() {
                let idx = tuple.iter().fold(0usize, |acc, &pos| {
                    let rotated = rotate_pos(pos, rotation);
                    acc * 3 + map_to_player_view(cells[rotated], side) as usize
                });
                out.push((tuple_idx, idx));
            }
        }
        out
    }
}

impl Evaluator for NTupleEvaluator {
    /// Evaluate from `side`'s perspective, summed over four rotations.
    fn evaluate(&self, board: &Board, side: Side) -> f32 {
        self.features(board, side)
            .into_iter()
            .map(|(tuple_idx, idx)| self.weights[tuple_idx][idx])
            .sum()
    }
}

/// Learned linear agent: scores each after-state with an n-tuple evaluator.
///
/// While `training` is on it explores with probability `epsilon`.
#[derive(Debug, Clone)]
pub struct NTupleAgent {
    seat: Seat,
    evaluator: NTupleEvaluator,
    epsilon: f32,
    training: bool,
    rng: fastrand::Rng,
}

impl NTupleAgent {
    pub fn new(evaluator: NTupleEvaluator) -> Self {
        Self {
            seat: Seat::default(),
            evaluator,
            epsilon: 0.1,
            training: false,
            rng: fastrand::Rng::new(),
        }
    }

    pub fn with_seed(evaluator: NTupleEvaluator, seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
            ..Self::new(evaluator)
        }
    }

    pub fn with_exploration(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon.clamp(0.0, 1.0);
        self.training = true;
        self
    }

    pub fn set_training(&mut self, training: bool) {
        self.training = training;
    }

    pub fn evaluator(&self) -> &NTupleEvaluator {
        &self.evaluator
    }

    pub fn save_weights(&self, path: &Path) -> Result<(), WeightsError> {
        persist::write_file(path, &self.evaluator.to_bytes())
    }

    pub fn load_weights(&mut self, path: &Path) -> Result<(), WeightsError> {
        self.evaluator = NTupleEvaluator::from_bytes(&persist::read_file(path)?)?;
        Ok(())
    }
}

impl Agent for NTupleAgent {
    fn name(&self) -> &str {
        "ntuple"
    }

    fn side(&self) -> Option<Side> {
        self.seat.side()
    }

    fn join(&mut self, side: Side) -> Result<(), GameError> {
        self.seat.join(side)
    }

    fn select_move(&mut self, board: &Board, legal: &[Position]) -> Result<Position, GameError> {
        let side = self.seat.require_side()?;
        if legal.is_empty() {
            return Err(GameError::NoLegalMove(side));
        }
        if self.training && self.rng.f32() < self.epsilon {
            return Ok(legal[self.rng.usize(..legal.len())]);
        }

        let mut scratch = *board;
        let mut scores = Vec::with_capacity(legal.len());
        for &mv in legal {
            let played = place_stone(mv, side, &mut scratch)?;
            scores.push(self.evaluator.evaluate(&scratch, side));
            undo_move(&played, &mut scratch);
        }
        argmax(scores)
            .map(|idx| legal[idx])
            .ok_or(GameError::NoLegalMove(side))
    }

    fn reseed(&mut self, seed: u64) {
        self.rng.seed(seed);
    }

    fn clone_agent(&self) -> Box<dyn Agent> {
        Box::new(Self {
            seat: self.seat.clone(),
            evaluator: self.evaluator.clone(),
            epsilon: self.epsilon,
            training: self.training,
            rng: self.rng.clone(),
        })
    }
}

fn validate_tuple(idx: usize, tuple: &[u8]) -> Result<(), WeightsError> {
    if tuple.len() > MAX_TUPLE_LEN {
        return Err(WeightsError::Shape(format!(
            "tuple #{idx} has {} cells, at most {MAX_TUPLE_LEN} supported",
            tuple.len()
        )));
    }
    if tuple.iter().any(|&pos| pos as usize >= NUM_SQUARES) {
        return Err(WeightsError::Shape(format!(
            "tuple #{idx} contains out-of-range board position"
        )));
    }
    Ok(())
}

fn rotate_pos(pos: u8, rotation: u8) -> usize {
    let row = (pos as usize) / BOARD_SIZE;
    let col = (pos as usize) % BOARD_SIZE;

    let (nr, nc) = match rotation % 4 {
        0 => (row, col),
        1 => (col, BOARD_SIZE - 1 - row),
        2 => (BOARD_SIZE - 1 - row, BOARD_SIZE - 1 - col),
        _ => (BOARD_SIZE - 1 - col, row),
    };

    nr * BOARD_SIZE + nc
}

/// 0 empty, 1 own stone, 2 opponent stone.
fn map_to_player_view(cell: i8, side: Side) -> u8 {
    if cell == 0 {
        0
    } else if cell == side.value() {
        1
    } else {
        2
    }
}

fn pow3(exp: usize) -> Result<usize, WeightsError> {
    let mut out = 1usize;
    for _ in 0..exp {
        out = out
            .checked_mul(3)
            .ok_or_else(|| WeightsError::Shape("3^tuple_size overflow".to_string()))?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::HEADER_SIZE;
    use crate::rules::legal_moves;

    fn corner_evaluator() -> NTupleEvaluator {
        NTupleEvaluator::new(vec![vec![0]], vec![vec![0.0, 1.0, -1.0]]).unwrap()
    }

    #[test]
    fn from_bytes_deserializes_tuple_defs_and_weights() {
        let tuples = vec![vec![0, 1], vec![63]];
        let weights = vec![
            vec![0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0],
            vec![-1.0, 2.0, 0.25],
        ];
        let evaluator = NTupleEvaluator::new(tuples.clone(), weights.clone()).unwrap();

        let parsed = NTupleEvaluator::from_bytes(&evaluator.to_bytes()).expect("must parse");

        assert_eq!(parsed.tuples, tuples);
        assert_eq!(parsed.weights, weights);
    }

    #[test]
    fn from_bytes_rejects_truncated_weights_payload() {
        let mut bytes = NTupleEvaluator::new(vec![vec![0, 1]], vec![vec![0.0; 9]])
            .unwrap()
            .to_bytes();
        bytes.pop();
        let recalculated_crc = crc32fast::hash(&bytes[HEADER_SIZE..]);
        bytes[12..16].copy_from_slice(&recalculated_crc.to_le_bytes());

        let err = NTupleEvaluator::from_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("unexpected EOF while reading weights"));
    }

    #[test]
    fn from_bytes_rejects_out_of_range_tuple_cell() {
        let mut payload = vec![1u8, 64];
        persist::push_f32s(&mut payload, &[0.0, 0.0, 0.0]);
        let bytes = persist::encode(MAGIC, 1, &payload);

        let err = NTupleEvaluator::from_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("out-of-range"));
    }

    #[test]
    fn new_rejects_mismatched_weight_table() {
        let err = NTupleEvaluator::new(vec![vec![0, 1]], vec![vec![0.0; 3]]).unwrap_err();

        assert!(matches!(err, WeightsError::Shape(_)));
    }

    #[test]
    fn evaluate_applies_rotation_symmetry_and_player_view() {
        let evaluator = corner_evaluator();
        let mut board = Board::empty();
        for (row, col) in [(0, 0), (0, 7), (7, 0), (7, 7)] {
            board.set(Position::new(row, col), Some(Side::Black)).unwrap();
        }

        assert_eq!(evaluator.evaluate(&board, Side::Black), 4.0);
        assert_eq!(evaluator.evaluate(&board, Side::White), -4.0);
    }

    #[test]
    fn zeroed_evaluator_scores_everything_equal() {
        let evaluator = NTupleEvaluator::zeroed();

        assert_eq!(evaluator.evaluate(&Board::new(), Side::Black), 0.0);
        assert_eq!(evaluator.features(&Board::new(), Side::White).len(), 16);
    }

    #[test]
    fn agent_takes_the_corner_when_offered() {
        // White to move: (0,0) captures along the top edge.
        let mut board = Board::empty();
        board.set(Position::new(0, 1), Some(Side::Black)).unwrap();
        board.set(Position::new(0, 2), Some(Side::White)).unwrap();
        board.set(Position::new(1, 4), Some(Side::Black)).unwrap();
        board.set(Position::new(2, 4), Some(Side::White)).unwrap();
        let mut agent = NTupleAgent::with_seed(corner_evaluator(), 1);
        agent.join(Side::White).unwrap();
        let legal = legal_moves(Side::White, &board);
        assert_eq!(legal, vec![Position::new(0, 0), Position::new(0, 4)]);

        assert_eq!(agent.select_move(&board, &legal), Ok(Position::new(0, 0)));
    }

    #[test]
    fn exploring_agent_still_plays_legal_moves() {
        let mut agent = NTupleAgent::with_seed(NTupleEvaluator::zeroed(), 4).with_exploration(1.0);
        agent.join(Side::Black).unwrap();
        let board = Board::new();
        let legal = legal_moves(Side::Black, &board);

        for _ in 0..16 {
            assert!(legal.contains(&agent.select_move(&board, &legal).unwrap()));
        }
    }

    #[test]
    fn weights_survive_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ntuple.bin");
        let agent = NTupleAgent::new(corner_evaluator());

        agent.save_weights(&path).unwrap();
        let mut restored = NTupleAgent::new(NTupleEvaluator::zeroed());
        restored.load_weights(&path).unwrap();

        assert_eq!(restored.evaluator(), agent.evaluator());
    }

    #[test]
    fn header_claiming_huge_tuple_count_is_truncated_not_fatal() {
        let bytes = persist::encode(MAGIC, u32::MAX, &[]);

        let err = NTupleEvaluator::from_bytes(&bytes).unwrap_err();

        assert!(matches!(err, WeightsError::Truncated(_)));
    }
}
