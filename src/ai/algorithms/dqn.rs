use burn::backend::{Autodiff, NdArray};
use burn::module::AutodiffModule;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::TensorData;
use rand::rngs::StdRng;
use rand::Rng;

use crate::ai::agent::{Agent, Transition};
use crate::ai::networks::{tensor_to_vec, ValueNetwork, ValueNetworkConfig};
use crate::ai::state_encoding::encode_states_batch;
use crate::error::TrainingError;
use crate::game::{argmax, Action, StateVector, NUM_ACTIONS};
use crate::training::replay_buffer::ReplayBuffer;

pub type InferBackend = NdArray<f32>;
pub type TrainBackend = Autodiff<InferBackend>;

/// DQN hyperparameters.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DqnConfig {
    pub learning_rate: f64,
    pub gamma: f32,
    pub epsilon_start: f32,
    pub epsilon_min: f32,
    pub epsilon_decay: f32,
    pub batch_size: usize,
    pub replay_capacity: usize,
}

impl Default for DqnConfig {
    fn default() -> Self {
        DqnConfig {
            learning_rate: 1e-3,
            gamma: 0.99,
            epsilon_start: 1.0,
            epsilon_min: 0.01,
            epsilon_decay: 0.995,
            batch_size: 32,
            replay_capacity: 10_000,
        }
    }
}

/// Multiplicative epsilon decay with a floor. Epsilon never increases and
/// never drops below `min`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExplorationSchedule {
    epsilon: f32,
    min: f32,
    decay: f32,
}

impl ExplorationSchedule {
    pub fn new(start: f32, min: f32, decay: f32) -> Self {
        ExplorationSchedule {
            epsilon: start.max(min),
            min,
            decay,
        }
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    pub fn decay(&mut self) {
        self.epsilon = (self.epsilon * self.decay).max(self.min);
    }
}

/// Overwrite the taken action's column of `targets` (row-major
/// `[batch, NUM_ACTIONS]`) with its TD target. Other columns keep the
/// network's own prediction, so they contribute no error.
pub fn apply_td_targets(
    targets: &mut [f32],
    batch: &[Transition],
    next_q: &[[f32; NUM_ACTIONS]],
    gamma: f32,
) {
    for (i, (t, next)) in batch.iter().zip(next_q).enumerate() {
        let target = if t.done {
            t.reward
        } else {
            let max_next = next.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            t.reward + gamma * max_next
        };
        targets[i * NUM_ACTIONS + t.action.index()] = target;
    }
}

/// DQN agent with online + target value networks, replay buffer, and Adam
/// optimizer.
///
/// The target network is copied from the online network once, at
/// construction, and stays frozen for the rest of the run.
pub struct DqnAgent {
    q_network: ValueNetwork<TrainBackend>,
    target_network: ValueNetwork<InferBackend>,
    optimizer: burn::optim::adaptor::OptimizerAdaptor<burn::optim::Adam, ValueNetwork<TrainBackend>, TrainBackend>,
    replay_buffer: ReplayBuffer,
    config: DqnConfig,
    device: <TrainBackend as Backend>::Device,
    exploration: ExplorationSchedule,
    step_count: usize,
    rng: StdRng,
}

impl DqnAgent {
    /// Build an agent with explicit generators for exploration and replay
    /// sampling.
    pub fn with_rngs(config: DqnConfig, action_rng: StdRng, replay_rng: StdRng) -> Self {
        let device = Default::default();
        let q_network: ValueNetwork<TrainBackend> = ValueNetworkConfig::new().init(&device);
        let target_network = q_network.valid();
        let optimizer = AdamConfig::new().init();

        let exploration = ExplorationSchedule::new(
            config.epsilon_start,
            config.epsilon_min,
            config.epsilon_decay,
        );
        let replay_buffer = ReplayBuffer::with_rng(config.replay_capacity, replay_rng);

        DqnAgent {
            q_network,
            target_network,
            optimizer,
            replay_buffer,
            config,
            device,
            exploration,
            step_count: 0,
            rng: action_rng,
        }
    }

    /// Epsilon-greedy selection: with probability `epsilon` a uniformly
    /// random action, otherwise the online network's argmax (first maximum
    /// on ties).
    pub fn act(&mut self, state: &StateVector, epsilon: f32) -> Result<Action, TrainingError> {
        if self.rng.random_range(0.0..1.0) < epsilon {
            let idx = self.rng.random_range(0..NUM_ACTIONS);
            return Ok(Action::ALL[idx]);
        }
        let q = self.q_values(state)?;
        Ok(Action::ALL[argmax(&q)])
    }

    /// Online network's action values for one state.
    pub fn q_values(&self, state: &StateVector) -> Result<[f32; NUM_ACTIONS], TrainingError> {
        let rows = self.q_network.predict(std::slice::from_ref(state), &self.device)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| TrainingError::Tensor("empty prediction".to_string()))
    }

    pub fn remember(&mut self, transition: Transition) {
        self.replay_buffer.push(transition);
    }

    /// One TD learning step on a uniformly sampled batch, followed by one
    /// epsilon decay. Does nothing and returns `Ok(None)` while the buffer
    /// holds fewer than `batch_size` transitions.
    pub fn replay(&mut self, batch_size: usize) -> Result<Option<f32>, TrainingError> {
        if batch_size == 0 || self.replay_buffer.len() < batch_size {
            return Ok(None);
        }

        let batch = self.replay_buffer.sample(batch_size);
        let states: Vec<StateVector> = batch.iter().map(|t| t.state).collect();
        let next_states: Vec<StateVector> = batch.iter().map(|t| t.next_state).collect();

        // Forward pass on current states: [B, 3]
        let state_tensors = encode_states_batch::<TrainBackend>(&states, &self.device);
        let q_all = self.q_network.forward(state_tensors);

        // Targets start as the online prediction; only taken actions change
        let mut target_data = tensor_to_vec(q_all.clone())?;
        let next_q = self.target_network.predict(&next_states, &self.device)?;
        apply_td_targets(&mut target_data, &batch, &next_q, self.config.gamma);

        let targets = Tensor::<TrainBackend, 2>::from_data(
            TensorData::new(target_data, [batch_size, NUM_ACTIONS]),
            &self.device,
        );

        // MSE loss over the whole [B, 3] matrix
        let diff = q_all - targets;
        let loss = (diff.clone() * diff).mean();

        let loss_val = tensor_to_vec(loss.clone())?
            .first()
            .copied()
            .unwrap_or(f32::NAN);
        if !loss_val.is_finite() {
            tracing::error!(step = self.step_count, loss = loss_val, "training diverged");
            return Err(TrainingError::NonFiniteLoss {
                step: self.step_count,
                loss: loss_val,
            });
        }

        // Backward pass
        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.q_network);

        // Optimizer step: consumes q_network, returns updated one
        self.q_network =
            self.optimizer
                .step(self.config.learning_rate, self.q_network.clone(), grads);

        self.step_count += 1;
        self.exploration.decay();

        tracing::trace!(step = self.step_count, loss = loss_val, "replay step");
        Ok(Some(loss_val))
    }

    pub fn epsilon(&self) -> f32 {
        self.exploration.epsilon()
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn replay_len(&self) -> usize {
        self.replay_buffer.len()
    }

    pub fn config(&self) -> &DqnConfig {
        &self.config
    }

    /// Gradient-free copy of the online network.
    pub fn online_network(&self) -> ValueNetwork<InferBackend> {
        self.q_network.valid()
    }

    pub fn target_network(&self) -> &ValueNetwork<InferBackend> {
        &self.target_network
    }
}

impl Agent for DqnAgent {
    fn select_action(&mut self, state: &StateVector, training: bool) -> Result<Action, TrainingError> {
        let epsilon = if training { self.epsilon() } else { 0.0 };
        self.act(state, epsilon)
    }

    fn name(&self) -> &str {
        "DQN"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{encode_state, Rank};
    use rand::SeedableRng;

    fn seeded_agent(config: DqnConfig) -> DqnAgent {
        DqnAgent::with_rngs(config, StdRng::seed_from_u64(1), StdRng::seed_from_u64(2))
    }

    fn terminal(reward: f32, action: Action, pip: u8) -> Transition {
        let state = encode_state(&[Rank::from_pip(pip).unwrap()], Rank::TEN);
        Transition {
            state,
            action,
            reward,
            next_state: state,
            done: true,
        }
    }

    #[test]
    fn test_exploration_decay_floors_at_min() {
        let mut schedule = ExplorationSchedule::new(1.0, 0.01, 0.995);
        let mut previous = schedule.epsilon();
        for step in 1..=2000 {
            schedule.decay();
            let eps = schedule.epsilon();
            assert!(eps >= 0.01, "epsilon {} below floor at step {}", eps, step);
            assert!(eps <= previous, "epsilon increased at step {}", step);
            if step == 100 {
                let expected = 0.995f64.powi(100) as f32;
                assert!((eps - expected).abs() < 1e-4, "{} vs {}", eps, expected);
            }
            previous = eps;
        }
        let expected = 0.01f64.max(0.995f64.powi(2000)) as f32;
        assert!((schedule.epsilon() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_td_targets_only_touch_taken_action() {
        let s = encode_state(&[Rank::TEN], Rank::TEN);
        let batch = [
            Transition {
                state: s,
                action: Action::Stand,
                reward: 1.0,
                next_state: s,
                done: true,
            },
            Transition {
                state: s,
                action: Action::Hit,
                reward: 0.0,
                next_state: s,
                done: false,
            },
        ];
        let next_q = [[9.0, 9.0, 9.0], [0.2, 0.5, -0.1]];
        let mut targets = vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
        apply_td_targets(&mut targets, &batch, &next_q, 0.99);

        assert_eq!(&targets[..3], &[0.1, 1.0, 0.3]);
        assert!((targets[3] - 0.99 * 0.5).abs() < 1e-6);
        assert_eq!(&targets[4..], &[0.5, 0.6]);
    }

    #[test]
    fn test_target_matches_online_at_construction() {
        let agent = seeded_agent(DqnConfig::default());
        let online = agent.online_network().dense_layers().unwrap();
        let target = agent.target_network().dense_layers().unwrap();
        assert_eq!(online, target);
    }

    #[test]
    fn test_greedy_action_is_stable() {
        let mut agent = seeded_agent(DqnConfig::default());
        let state = encode_state(&[Rank::from_pip(8).unwrap()], Rank::from_pip(7).unwrap());
        let q = agent.q_values(&state).unwrap();
        let expected = Action::ALL[argmax(&q)];
        for _ in 0..10 {
            assert_eq!(agent.q_values(&state).unwrap(), q);
            assert_eq!(agent.act(&state, 0.0).unwrap(), expected);
            assert_eq!(agent.select_action(&state, false).unwrap(), expected);
        }
    }

    #[test]
    fn test_full_exploration_hits_every_action() {
        let mut agent = seeded_agent(DqnConfig::default());
        let state = encode_state(&[Rank::TEN], Rank::ACE);
        let mut seen = [false; NUM_ACTIONS];
        for _ in 0..200 {
            seen[agent.act(&state, 1.0).unwrap().index()] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_replay_is_noop_below_batch_size() {
        let mut agent = seeded_agent(DqnConfig {
            batch_size: 8,
            ..Default::default()
        });
        for _ in 0..7 {
            agent.remember(terminal(1.0, Action::Stand, 9));
        }
        assert_eq!(agent.replay(8).unwrap(), None);
        assert_eq!(agent.epsilon(), 1.0);
        assert_eq!(agent.step_count(), 0);
    }

    #[test]
    fn test_replay_decays_epsilon_per_step() {
        let mut agent = seeded_agent(DqnConfig {
            batch_size: 4,
            ..Default::default()
        });
        for pip in 2..=9 {
            agent.remember(terminal(-1.0, Action::Hit, pip));
        }
        for _ in 0..3 {
            let loss = agent.replay(4).unwrap();
            assert!(loss.is_some());
        }
        assert_eq!(agent.step_count(), 3);
        let expected = 0.995f32.powi(3);
        assert!((agent.epsilon() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_epsilon_after_2000_replays() {
        let mut agent = seeded_agent(DqnConfig {
            batch_size: 1,
            replay_capacity: 1,
            ..Default::default()
        });
        agent.remember(terminal(1.0, Action::Stand, 9));

        let mut previous = agent.epsilon();
        for step in 1..=2000 {
            assert!(agent.replay(1).unwrap().is_some());
            let eps = agent.epsilon();
            assert!(eps >= 0.01, "epsilon {} below floor at step {}", eps, step);
            assert!(eps <= previous, "epsilon increased at step {}", step);
            previous = eps;
        }
        assert_eq!(agent.step_count(), 2000);
        let expected = 0.01f64.max(0.995f64.powi(2000)) as f32;
        assert!((agent.epsilon() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_replay_reduces_loss_and_leaves_target_frozen() {
        let mut agent = seeded_agent(DqnConfig {
            batch_size: 8,
            replay_capacity: 8,
            ..Default::default()
        });
        let target_before = agent.target_network().dense_layers().unwrap();

        for pip in 2..=9 {
            let reward = if pip >= 6 { 1.0 } else { -1.0 };
            agent.remember(terminal(reward, Action::Stand, pip));
        }

        let first = agent.replay(8).unwrap().unwrap();
        let mut last = first;
        for _ in 0..150 {
            last = agent.replay(8).unwrap().unwrap();
        }
        assert!(last < first, "loss did not decrease: {} -> {}", first, last);

        let target_after = agent.target_network().dense_layers().unwrap();
        assert_eq!(target_before, target_after);
        assert_ne!(agent.online_network().dense_layers().unwrap(), target_after);
    }
}
