use burn::nn::{Linear, LinearConfig, Relu};
use burn::prelude::*;

use crate::ai::state_encoding::encode_states_batch;
use crate::error::TrainingError;
use crate::game::{StateVector, NUM_ACTIONS};

/// Action-value network for blackjack decisions.
///
/// ```text
/// Input:  [batch, 5]
/// Dense1: 5 -> 128, ReLU
/// Dense2: 128 -> 128, ReLU
/// Dense3: 128 -> 64, ReLU
/// Head:   64 -> 3  (values for hit, stand, double; linear)
/// ```
#[derive(Module, Debug)]
pub struct ValueNetwork<B: Backend> {
    dense1: Linear<B>,
    dense2: Linear<B>,
    dense3: Linear<B>,
    head: Linear<B>,
    relu: Relu,
}

#[derive(Config, Debug)]
pub struct ValueNetworkConfig {
    #[config(default = "5")]
    pub input_size: usize,
    #[config(default = "128")]
    pub hidden1: usize,
    #[config(default = "128")]
    pub hidden2: usize,
    #[config(default = "64")]
    pub hidden3: usize,
    #[config(default = "3")]
    pub num_actions: usize,
}

impl Default for ValueNetworkConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueNetworkConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ValueNetwork<B> {
        ValueNetwork {
            dense1: LinearConfig::new(self.input_size, self.hidden1).init(device),
            dense2: LinearConfig::new(self.hidden1, self.hidden2).init(device),
            dense3: LinearConfig::new(self.hidden2, self.hidden3).init(device),
            head: LinearConfig::new(self.hidden3, self.num_actions).init(device),
            relu: Relu::new(),
        }
    }

    /// Layer widths from input to output.
    pub fn widths(&self) -> [usize; 5] {
        [
            self.input_size,
            self.hidden1,
            self.hidden2,
            self.hidden3,
            self.num_actions,
        ]
    }
}

/// Activation applied after a dense layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Linear,
}

impl Activation {
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Activation::Relu => x.max(0.0),
            Activation::Linear => x,
        }
    }
}

/// Plain-data copy of one dense layer. `weight` is row-major
/// `[input_size, output_size]`, so `y = x·W + b`.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseLayer {
    pub name: String,
    pub input_size: usize,
    pub output_size: usize,
    pub weight: Vec<f32>,
    pub bias: Vec<f32>,
    pub activation: Activation,
}

impl<B: Backend> ValueNetwork<B> {
    /// Forward pass: input [batch, 5] -> output [batch, 3] action values.
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.relu.forward(self.dense1.forward(input));
        let x = self.relu.forward(self.dense2.forward(x));
        let x = self.relu.forward(self.dense3.forward(x));
        self.head.forward(x)
    }

    /// Action values for each state, one row per state.
    pub fn predict(
        &self,
        states: &[StateVector],
        device: &B::Device,
    ) -> Result<Vec<[f32; NUM_ACTIONS]>, TrainingError> {
        if states.is_empty() {
            return Ok(Vec::new());
        }
        let output = self.forward(encode_states_batch::<B>(states, device));
        let flat = tensor_to_vec(output)?;
        Ok(flat
            .chunks_exact(NUM_ACTIONS)
            .map(|row| [row[0], row[1], row[2]])
            .collect())
    }

    /// Copy out every layer's parameters, input side first.
    pub fn dense_layers(&self) -> Result<Vec<DenseLayer>, TrainingError> {
        let layers = [
            ("dense1", &self.dense1, Activation::Relu),
            ("dense2", &self.dense2, Activation::Relu),
            ("dense3", &self.dense3, Activation::Relu),
            ("head", &self.head, Activation::Linear),
        ];

        layers
            .into_iter()
            .map(|(name, linear, activation)| {
                let [input_size, output_size] = linear.weight.val().dims();
                let weight = tensor_to_vec(linear.weight.val())?;
                let bias = match &linear.bias {
                    Some(bias) => tensor_to_vec(bias.val())?,
                    None => vec![0.0; output_size],
                };
                Ok(DenseLayer {
                    name: name.to_string(),
                    input_size,
                    output_size,
                    weight,
                    bias,
                    activation,
                })
            })
            .collect()
    }
}

/// Pull f32 values out of a tensor.
pub(crate) fn tensor_to_vec<B: Backend, const D: usize>(
    tensor: Tensor<B, D>,
) -> Result<Vec<f32>, TrainingError> {
    tensor
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| TrainingError::Tensor(format!("{e:?}")))
}
