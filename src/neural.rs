//! Neural controllers driving lander engines
//!
//! A controller maps a sensor vector to throttle outputs in `[-1, 1]`.
//! Controllers are stateless per call.

use rand::Rng;

/// Identifier of a genome within a training run
pub type GenomeId = u64;

/// Maps sensor inputs to engine outputs
pub trait Controller: Send {
    /// Expected length of the input vector
    fn input_count(&self) -> usize;

    /// Length of the output vector
    fn output_count(&self) -> usize;

    /// Forward pass: sensors -> engine outputs
    fn activate(&self, inputs: &[f32]) -> Vec<f32>;
}

/// Fully connected network: input -> hidden (tanh) -> output (tanh), with
/// biases on both layers.
///
/// Weight layout: input->hidden weights (`h * input_dim + i`), hidden biases,
/// hidden->output weights (`o * hidden_dim + h`), output biases.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedForwardNetwork {
    weights: Vec<f32>,
    input_dim: usize,
    hidden_dim: usize,
    output_dim: usize,
}

impl FeedForwardNetwork {
    /// Number of weights needed for the given architecture
    pub fn weight_count(input_dim: usize, hidden_dim: usize, output_dim: usize) -> usize {
        input_dim * hidden_dim + hidden_dim + hidden_dim * output_dim + output_dim
    }

    /// Build from a flat weight vector, padding or truncating to fit
    pub fn from_weights(
        mut weights: Vec<f32>,
        input_dim: usize,
        hidden_dim: usize,
        output_dim: usize,
    ) -> Self {
        weights.resize(Self::weight_count(input_dim, hidden_dim, output_dim), 0.0);
        Self {
            weights,
            input_dim,
            hidden_dim,
            output_dim,
        }
    }

    /// Random weights in `[-0.5, 0.5)`
    pub fn random<R: Rng + ?Sized>(
        rng: &mut R,
        input_dim: usize,
        hidden_dim: usize,
        output_dim: usize,
    ) -> Self {
        let weights = (0..Self::weight_count(input_dim, hidden_dim, output_dim))
            .map(|_| rng.random_range(-0.5..0.5))
            .collect();
        Self::from_weights(weights, input_dim, hidden_dim, output_dim)
    }

    pub fn hidden_dim(&self) -> usize {
        self.hidden_dim
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }
}

impl Controller for FeedForwardNetwork {
    fn input_count(&self) -> usize {
        self.input_dim
    }

    fn output_count(&self) -> usize {
        self.output_dim
    }

    fn activate(&self, inputs: &[f32]) -> Vec<f32> {
        assert_eq!(inputs.len(), self.input_dim, "Input dimension mismatch");

        // Layer 1: input -> hidden
        let hidden_weights_end = self.input_dim * self.hidden_dim;
        let (hidden_weights, rest) = self.weights.split_at(hidden_weights_end);
        let (hidden_biases, rest) = rest.split_at(self.hidden_dim);
        let mut hidden = vec![0.0; self.hidden_dim];

        #[allow(clippy::needless_range_loop)]
        for h in 0..self.hidden_dim {
            let mut sum = hidden_biases[h];
            for i in 0..self.input_dim {
                sum += inputs[i] * hidden_weights[h * self.input_dim + i];
            }
            hidden[h] = sum.tanh();
        }

        // Layer 2: hidden -> output
        let (output_weights, output_biases) = rest.split_at(self.hidden_dim * self.output_dim);
        let mut output = vec![0.0; self.output_dim];

        #[allow(clippy::needless_range_loop)]
        for o in 0..self.output_dim {
            let mut sum = output_biases[o];
            for h in 0..self.hidden_dim {
                sum += hidden[h] * output_weights[o * self.hidden_dim + h];
            }
            output[o] = sum.tanh();
        }

        output
    }
}

/// Controller that ignores its inputs and always returns the same outputs
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantController {
    input_dim: usize,
    outputs: Vec<f32>,
}

impl ConstantController {
    pub fn new(input_dim: usize, outputs: Vec<f32>) -> Self {
        Self { input_dim, outputs }
    }

    /// Minimum throttle on every engine
    pub fn idle(input_dim: usize, output_dim: usize) -> Self {
        Self::new(input_dim, vec![-1.0; output_dim])
    }

    /// Maximum throttle on every engine
    pub fn full(input_dim: usize, output_dim: usize) -> Self {
        Self::new(input_dim, vec![1.0; output_dim])
    }
}

impl Controller for ConstantController {
    fn input_count(&self) -> usize {
        self.input_dim
    }

    fn output_count(&self) -> usize {
        self.outputs.len()
    }

    fn activate(&self, _inputs: &[f32]) -> Vec<f32> {
        self.outputs.clone()
    }
}
