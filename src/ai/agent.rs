use crate::error::TrainingError;
use crate::game::{Action, StateVector};

/// A single step of experience for TD training.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub state: StateVector,
    pub action: Action,
    pub reward: f32,
    pub next_state: StateVector,
    pub done: bool,
}

/// Universal interface for blackjack players.
pub trait Agent {
    /// Select an action for the given state.
    /// When `training` is true, the agent may explore; otherwise it exploits.
    fn select_action(&mut self, state: &StateVector, training: bool) -> Result<Action, TrainingError>;

    /// Return the agent's display name.
    fn name(&self) -> &str;
}
