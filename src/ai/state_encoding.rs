use burn::prelude::*;
use burn::tensor::TensorData;

use crate::game::{StateVector, STATE_SIZE};

/// Encode a single state as a tensor of shape [1, 5].
pub fn encode_state_tensor<B: Backend>(state: &StateVector, device: &B::Device) -> Tensor<B, 2> {
    encode_states_batch(std::slice::from_ref(state), device)
}

/// Encode multiple states as a batched tensor of shape [batch, 5].
pub fn encode_states_batch<B: Backend>(states: &[StateVector], device: &B::Device) -> Tensor<B, 2> {
    let mut flat = Vec::with_capacity(states.len() * STATE_SIZE);
    for state in states {
        flat.extend_from_slice(state.as_array());
    }
    Tensor::<B, 2>::from_data(TensorData::new(flat, [states.len(), STATE_SIZE]), device)
}

/// Hand description as a consuming game application tracks it, before any
/// normalisation.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HandSummary {
    pub player_total: u32,
    pub dealer_upcard_value: u32,
    pub has_ace: bool,
    pub can_split: bool,
    pub card_count: usize,
}

impl HandSummary {
    /// Map onto the exact layout the network was trained on.
    pub fn to_state_vector(&self) -> StateVector {
        StateVector([
            self.player_total as f32 / 21.0,
            self.dealer_upcard_value as f32 / 11.0,
            if self.has_ace { 1.0 } else { 0.0 },
            if self.can_split { 1.0 } else { 0.0 },
            self.card_count as f32 / 5.0,
        ])
    }
}
