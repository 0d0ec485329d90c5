//! Learning side: the agent interface, the DQN agent, the value network and
//! tensor encoding of states.

mod agent;
pub mod algorithms;
pub mod networks;
mod random;
pub mod state_encoding;

pub use agent::{Agent, Transition};
pub use algorithms::{DqnAgent, DqnConfig, ExplorationSchedule, InferBackend, TrainBackend};
pub use networks::{Activation, DenseLayer, ValueNetwork, ValueNetworkConfig};
pub use random::RandomAgent;
pub use state_encoding::HandSummary;
