//! Training infrastructure: the episode loop, replay memory, rolling
//! metrics and the persisted run summary.

pub mod metrics;
pub mod replay_buffer;
pub mod stats;
pub mod trainer;

pub use metrics::{EpisodeResult, TrainingMetrics};
pub use replay_buffer::ReplayBuffer;
pub use stats::{StatsRecorder, TrainingStats};
pub use trainer::{EvalReport, Evaluation, TrainerConfig, TrainingSession};
