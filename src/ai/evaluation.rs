use std::path::Path;

use once_cell::sync::Lazy;

use crate::ai::search::Evaluator;
use crate::ai::{Agent, Seat, argmax};
use crate::board::{Board, NUM_SQUARES};
use crate::error::{GameError, WeightsError};
use crate::persist;
use crate::types::{Position, Side};

const MAGIC: &[u8; 4] = b"EVBD";
const MUTATED_CELLS: usize = 3;
const PLUS_MUTATION_STEP: f32 = 0.1;

/// Upper-left quadrant of the classic positional table; the rest is mirrored.
const QUADRANT: [[f32; 4]; 4] = [
    [1.00, -0.25, 0.10, 0.05],
    [-0.25, -0.45, -0.01, -0.01],
    [0.10, -0.01, 0.01, 0.00],
    [0.05, -0.01, 0.00, 0.00],
];

static DEFAULT_TABLE: Lazy<WeightTable> = Lazy::new(|| {
    let mut cells = [0.0f32; NUM_SQUARES];
    for (idx, cell) in cells.iter_mut().enumerate() {
        let row = mirror(idx / 8);
        let col = mirror(idx % 8);
        *cell = QUADRANT[row][col];
    }
    WeightTable(cells)
});

fn mirror(i: usize) -> usize {
    if i < 4 { i } else { 7 - i }
}

/// Per-cell weights, row-major.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightTable(pub [f32; NUM_SQUARES]);

impl WeightTable {
    pub fn weight(&self, pos: Position) -> f32 {
        self.0[pos.index()]
    }
}

impl Default for WeightTable {
    fn default() -> Self {
        *DEFAULT_TABLE
    }
}

impl Evaluator for WeightTable {
    /// Sum of weights under own stones minus weights under opponent stones.
    fn evaluate(&self, board: &Board, side: Side) -> f32 {
        board
            .to_array()
            .iter()
            .zip(self.0.iter())
            .map(|(&cell, &w)| f32::from(cell * side.value()) * w)
            .sum()
    }
}

/// Scores each legal destination cell by a fixed weight table and plays
/// the best one. The table is the genome evolved by the GA operators.
#[derive(Debug, Clone)]
pub struct EvaluationBoardAgent {
    seat: Seat,
    table: WeightTable,
    rng: fastrand::Rng,
}

impl EvaluationBoardAgent {
    pub fn new(table: WeightTable) -> Self {
        Self {
            seat: Seat::default(),
            table,
            rng: fastrand::Rng::new(),
        }
    }

    pub fn with_seed(table: WeightTable, seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
            ..Self::new(table)
        }
    }

    pub fn table(&self) -> &WeightTable {
        &self.table
    }

    /// Replaces the table with uniform values in `[-1, 1)`.
    pub fn set_random_evaluation_board(&mut self) {
        for w in self.table.0.iter_mut() {
            *w = self.rng.f32() * 2.0 - 1.0;
        }
    }

    /// Child taking a prefix from one parent and the suffix from the other.
    pub fn cross_over_one_point(&mut self, other: &Self) -> Self {
        let cut = self.rng.usize(..NUM_SQUARES);
        let (head, tail) = if self.rng.bool() {
            (&self.table, &other.table)
        } else {
            (&other.table, &self.table)
        };
        let mut cells = tail.0;
        cells[..cut].copy_from_slice(&head.0[..cut]);
        self.child(WeightTable(cells))
    }

    /// Child picking every cell from either parent with equal probability.
    pub fn cross_over_uniform(&mut self, other: &Self) -> Self {
        let mut cells = self.table.0;
        for (cell, &theirs) in cells.iter_mut().zip(other.table.0.iter()) {
            if self.rng.bool() {
                *cell = theirs;
            }
        }
        self.child(WeightTable(cells))
    }

    /// Copy with a few cells replaced by fresh random values.
    pub fn normal_mutation(&mut self) -> Self {
        let mut cells = self.table.0;
        for _ in 0..MUTATED_CELLS {
            cells[self.rng.usize(..NUM_SQUARES)] = self.rng.f32() * 2.0 - 1.0;
        }
        self.child(WeightTable(cells))
    }

    /// Copy with a few cells nudged by a small random step.
    pub fn plus_mutation(&mut self) -> Self {
        let mut cells = self.table.0;
        for _ in 0..MUTATED_CELLS {
            let step = (self.rng.f32() * 2.0 - 1.0) * PLUS_MUTATION_STEP;
            cells[self.rng.usize(..NUM_SQUARES)] += step;
        }
        self.child(WeightTable(cells))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(NUM_SQUARES * 4);
        persist::push_f32s(&mut payload, &self.table.0);
        persist::encode(MAGIC, 1, &payload)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, WeightsError> {
        let (sections, payload) = persist::decode(MAGIC, data)?;
        if sections != 1 {
            return Err(WeightsError::Shape(format!(
                "evaluation board expects 1 section, got {sections}"
            )));
        }
        let mut reader = persist::Reader::new(payload);
        let values = reader.f32s(NUM_SQUARES, "evaluation board cells")?;
        reader.finish()?;

        let mut cells = [0.0f32; NUM_SQUARES];
        cells.copy_from_slice(&values);
        Ok(Self::new(WeightTable(cells)))
    }

    pub fn save_weights(&self, path: &Path) -> Result<(), WeightsError> {
        persist::write_file(path, &self.to_bytes())
    }

    pub fn load_weights(&mut self, path: &Path) -> Result<(), WeightsError> {
        let loaded = Self::from_bytes(&persist::read_file(path)?)?;
        self.table = loaded.table;
        Ok(())
    }

    fn child(&mut self, table: WeightTable) -> Self {
        Self {
            seat: Seat::default(),
            table,
            rng: self.rng.fork(),
        }
    }
}

impl Default for EvaluationBoardAgent {
    fn default() -> Self {
        Self::new(WeightTable::default())
    }
}

impl Agent for EvaluationBoardAgent {
    fn name(&self) -> &str {
        "evaluation-board"
    }

    fn side(&self) -> Option<Side> {
        self.seat.side()
    }

    fn join(&mut self, side: Side) -> Result<(), GameError> {
        self.seat.join(side)
    }

    fn select_move(&mut self, _board: &Board, legal: &[Position]) -> Result<Position, GameError> {
        let side = self.seat.require_side()?;
        argmax(legal.iter().map(|&pos| self.table.weight(pos)))
            .map(|idx| legal[idx])
            .ok_or(GameError::NoLegalMove(side))
    }

    fn reseed(&mut self, seed: u64) {
        self.rng.seed(seed);
    }

    fn clone_agent(&self) -> Box<dyn Agent> {
        Box::new(Self {
            seat: self.seat.clone(),
            table: self.table,
            rng: self.rng.clone(),
        })
    }
}
