mod dqn;

pub use dqn::{apply_td_targets, DqnAgent, DqnConfig, ExplorationSchedule, InferBackend, TrainBackend};
