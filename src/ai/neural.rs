use std::path::Path;

use crate::ai::{Agent, Seat, argmax};
use crate::board::{Board, NUM_SQUARES};
use crate::error::{GameError, WeightsError};
use crate::persist::{self, Reader};
use crate::rules::{legal_moves, place_stone, undo_move};
use crate::types::{Position, Side};

const MAGIC: &[u8; 4] = b"NNGA";
pub const DEFAULT_LAYERS: [usize; 5] = [NUM_SQUARES, 100, 50, 20, 1];
const MUTATED_WEIGHTS: usize = 3;

/// Dense layer; `weights` is row-major `[inputs][outputs]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    inputs: usize,
    outputs: usize,
    weights: Vec<f32>,
}

impl Layer {
    pub fn new(inputs: usize, outputs: usize, weights: Vec<f32>) -> Result<Self, WeightsError> {
        if weights.len() != inputs * outputs {
            return Err(WeightsError::Shape(format!(
                "{inputs}x{outputs} layer needs {} weights, got {}",
                inputs * outputs,
                weights.len()
            )));
        }
        Ok(Self {
            inputs,
            outputs,
            weights,
        })
    }

    fn random(inputs: usize, outputs: usize, rng: &mut fastrand::Rng) -> Self {
        let weights = (0..inputs * outputs).map(|_| rng.f32() * 2.0 - 1.0).collect();
        Self {
            inputs,
            outputs,
            weights,
        }
    }

    fn forward(&self, input: &[f32]) -> Vec<f32> {
        let mut out = vec![0.0f32; self.outputs];
        for (x, row) in input.iter().zip(self.weights.chunks_exact(self.outputs)) {
            for (acc, w) in out.iter_mut().zip(row) {
                *acc += x * w;
            }
        }
        out
    }
}

/// Feed-forward value network: sigmoid hidden layers, linear output.
#[derive(Debug, Clone, PartialEq)]
pub struct NeuralNet {
    layers: Vec<Layer>,
}

impl NeuralNet {
    pub fn random(sizes: &[usize], rng: &mut fastrand::Rng) -> Self {
        let layers = sizes
            .windows(2)
            .map(|pair| Layer::random(pair[0], pair[1], rng))
            .collect();
        Self { layers }
    }

    pub fn from_layers(layers: Vec<Layer>) -> Result<Self, WeightsError> {
        let (Some(first), Some(last)) = (layers.first(), layers.last()) else {
            return Err(WeightsError::Shape("network has no layers".to_string()));
        };
        if first.inputs != NUM_SQUARES || last.outputs != 1 {
            return Err(WeightsError::Shape(format!(
                "network must map {NUM_SQUARES} inputs to 1 output"
            )));
        }
        if let Some(pair) = layers.windows(2).find(|pair| pair[0].outputs != pair[1].inputs) {
            return Err(WeightsError::Shape(format!(
                "layer with {} outputs feeds layer with {} inputs",
                pair[0].outputs, pair[1].inputs
            )));
        }
        Ok(Self { layers })
    }

    pub fn forward(&self, input: &[f32]) -> f32 {
        let last = self.layers.len().saturating_sub(1);
        let mut now = input.to_vec();
        for (idx, layer) in self.layers.iter().enumerate() {
            now = layer.forward(&now);
            if idx != last {
                now.iter_mut().for_each(|v| *v = sigmoid(*v));
            }
        }
        now.first().copied().unwrap_or_default()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut payload = Vec::new();
        for layer in &self.layers {
            payload.extend_from_slice(&(layer.inputs as u32).to_le_bytes());
            payload.extend_from_slice(&(layer.outputs as u32).to_le_bytes());
            persist::push_f32s(&mut payload, &layer.weights);
        }
        persist::encode(MAGIC, self.layers.len() as u32, &payload)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, WeightsError> {
        let (count, payload) = persist::decode(MAGIC, data)?;
        let mut reader = Reader::new(payload);
        let mut layers = Vec::new();
        for idx in 0..count {
            let inputs = reader.u32(&format!("layer #{idx} shape"))? as usize;
            let outputs = reader.u32(&format!("layer #{idx} shape"))? as usize;
            let len = inputs
                .checked_mul(outputs)
                .ok_or_else(|| WeightsError::Shape(format!("layer #{idx} is too large")))?;
            let weights = reader.f32s(len, &format!("layer #{idx} weights"))?;
            layers.push(Layer::new(inputs, outputs, weights)?);
        }
        reader.finish()?;
        Self::from_layers(layers)
    }
}

fn sigmoid(x: f32) -> f32 {
    ((x / 2.0).tanh() + 1.0) / 2.0
}

/// Board seen by `side`: +1 own stone, -1 opponent stone, 0 empty.
pub fn board_vector(board: &Board, side: Side) -> Vec<f32> {
    board
        .to_array()
        .iter()
        .map(|&cell| f32::from(cell * side.value()))
        .collect()
}

/// Scores after-states with a value network, looking one or two plies
/// ahead on a single scratch board.
#[derive(Debug, Clone)]
pub struct NeuralAgent {
    seat: Seat,
    net: NeuralNet,
    depth: u8,
    rng: fastrand::Rng,
}

impl NeuralAgent {
    pub fn new(net: NeuralNet) -> Self {
        Self {
            seat: Seat::default(),
            net,
            depth: 1,
            rng: fastrand::Rng::new(),
        }
    }

    pub fn random(seed: u64) -> Self {
        let mut rng = fastrand::Rng::with_seed(seed);
        let net = NeuralNet::random(&DEFAULT_LAYERS, &mut rng);
        Self {
            rng,
            ..Self::new(net)
        }
    }

    /// Lookahead depth, clamped to 1..=2.
    pub fn with_depth(mut self, depth: u8) -> Self {
        self.depth = depth.clamp(1, 2);
        self
    }

    pub fn net(&self) -> &NeuralNet {
        &self.net
    }

    /// Value of the position after one of our moves.
    fn score_after_move(&self, board: &mut Board, side: Side) -> Result<f32, GameError> {
        if self.depth < 2 {
            return Ok(self.net.forward(&board_vector(board, side)));
        }

        let replies = legal_moves(side.other(), board);
        if replies.is_empty() {
            return Ok(self.net.forward(&board_vector(board, side)));
        }
        let mut worst = f32::INFINITY;
        for reply in replies {
            let played = place_stone(reply, side.other(), board)?;
            worst = worst.min(self.net.forward(&board_vector(board, side)));
            undo_move(&played, board);
        }
        Ok(worst)
    }

    /// Child whose every layer takes a prefix from one parent and the
    /// suffix from the other.
    pub fn cross_over_one_point(&mut self, other: &Self) -> Result<Self, WeightsError> {
        if self.net.layers.len() != other.net.layers.len() {
            return Err(WeightsError::Shape("parents have different depths".to_string()));
        }

        let mut layers = Vec::with_capacity(self.net.layers.len());
        for (mine, theirs) in self.net.layers.iter().zip(&other.net.layers) {
            if mine.weights.len() != theirs.weights.len() {
                return Err(WeightsError::Shape("parents have different layer sizes".to_string()));
            }
            let cut = self.rng.usize(..mine.weights.len().max(1));
            let (head, tail) = if self.rng.bool() { (mine, theirs) } else { (theirs, mine) };
            let mut weights = tail.weights.clone();
            weights[..cut].copy_from_slice(&head.weights[..cut]);
            layers.push(Layer { weights, ..mine.clone() });
        }
        Ok(self.child(NeuralNet { layers }))
    }

    /// Copy with a few weights per layer replaced by fresh random values.
    pub fn normal_mutation(&mut self) -> Self {
        let mut net = self.net.clone();
        for layer in &mut net.layers {
            if layer.weights.is_empty() {
                continue;
            }
            for _ in 0..MUTATED_WEIGHTS {
                let idx = self.rng.usize(..layer.weights.len());
                layer.weights[idx] = self.rng.f32() * 2.0 - 1.0;
            }
        }
        self.child(net)
    }

    pub fn save_weights(&self, path: &Path) -> Result<(), WeightsError> {
        persist::write_file(path, &self.net.to_bytes())
    }

    pub fn load_weights(&mut self, path: &Path) -> Result<(), WeightsError> {
        self.net = NeuralNet::from_bytes(&persist::read_file(path)?)?;
        Ok(())
    }

    fn child(&mut self, net: NeuralNet) -> Self {
        Self {
            seat: Seat::default(),
            net,
            depth: self.depth,
            rng: self.rng.fork(),
        }
    }
}

impl Agent for NeuralAgent {
    fn name(&self) -> &str {
        "neural"
    }

    fn side(&self) -> Option<Side> {
        self.seat.side()
    }

    fn join(&mut self, side: Side) -> Result<(), GameError> {
        self.seat.join(side)
    }

    fn select_move(&mut self, board: &Board, legal: &[Position]) -> Result<Position, GameError> {
        let side = self.seat.require_side()?;
        let mut scratch = *board;
        let mut scores = Vec::with_capacity(legal.len());
        for &mv in legal {
            let played = place_stone(mv, side, &mut scratch)?;
            scores.push(self.score_after_move(&mut scratch, side)?);
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
            net: self.net.clone(),
            depth: self.depth,
            rng: self.rng.clone(),
        })
    }
}
