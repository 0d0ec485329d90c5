use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::ai::algorithms::{DqnAgent, DqnConfig};
use crate::ai::{Agent, RandomAgent, Transition};
use crate::error::{ArtifactError, TrainingError};
use crate::export::{ExportConfig, ExportInfo, ExportReport, ModelExporter};
use crate::game::{Outcome, Simulator};
use crate::training::metrics::{EpisodeResult, TrainingMetrics};
use crate::training::stats::{StatsRecorder, TrainingStats};

/// Trainer configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub num_episodes: usize,
    /// Hard cap on decisions per hand.
    pub max_steps_per_episode: usize,
    pub log_interval: usize,
    /// Trailing window for the average reward in reports and stats.
    pub reward_window: usize,
    pub num_decks: usize,
    /// Player cards dealt before the first decision.
    pub initial_player_cards: usize,
    /// Greedy evaluation hands after training; 0 skips evaluation.
    pub eval_hands: usize,
    pub seed: Option<u64>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            num_episodes: 1000,
            max_steps_per_episode: 20,
            log_interval: 100,
            reward_window: 100,
            num_decks: 1,
            initial_player_cards: 1,
            eval_hands: 1000,
            seed: None,
        }
    }
}

/// Tally of hands played by one policy without learning.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EvalReport {
    pub hands: usize,
    pub wins: usize,
    pub pushes: usize,
    pub losses: usize,
    pub total_reward: f32,
}

impl EvalReport {
    fn record(&mut self, reward: f32, outcome: Option<Outcome>) {
        self.hands += 1;
        self.total_reward += reward;
        match outcome {
            Some(Outcome::Win) => self.wins += 1,
            Some(Outcome::Push) => self.pushes += 1,
            Some(Outcome::Loss) => self.losses += 1,
            None => {}
        }
    }

    pub fn win_rate(&self) -> f32 {
        self.rate(self.wins)
    }

    pub fn push_rate(&self) -> f32 {
        self.rate(self.pushes)
    }

    pub fn loss_rate(&self) -> f32 {
        self.rate(self.losses)
    }

    pub fn average_reward(&self) -> f32 {
        if self.hands == 0 {
            0.0
        } else {
            self.total_reward / self.hands as f32
        }
    }

    fn rate(&self, count: usize) -> f32 {
        if self.hands == 0 {
            0.0
        } else {
            count as f32 / self.hands as f32
        }
    }
}

/// Greedy agent results next to the random baseline on the same number of
/// hands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub agent: EvalReport,
    pub baseline: EvalReport,
}

// Per-site seed offsets when a run seed is configured.
const SHOE_SEED: u64 = 0;
const ACTION_SEED: u64 = 1;
const REPLAY_SEED: u64 = 2;
const EVAL_SEED: u64 = 3;

fn site_rng(seed: Option<u64>, site: u64) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s.wrapping_add(site)),
        None => StdRng::from_os_rng(),
    }
}

/// One training run: owns the simulator, the agent and the collected
/// metrics. Construct, `run`, then `export` and `record_stats`.
pub struct TrainingSession {
    config: TrainerConfig,
    simulator: Simulator,
    agent: DqnAgent,
    metrics: TrainingMetrics,
}

impl TrainingSession {
    pub fn new(config: TrainerConfig, agent_config: DqnConfig) -> Self {
        let simulator = Simulator::new(
            config.num_decks,
            config.initial_player_cards,
            site_rng(config.seed, SHOE_SEED),
        );
        let agent = DqnAgent::with_rngs(
            agent_config,
            site_rng(config.seed, ACTION_SEED),
            site_rng(config.seed, REPLAY_SEED),
        );
        let metrics = TrainingMetrics::with_capacity(config.reward_window.max(config.log_interval));
        TrainingSession {
            config,
            simulator,
            agent,
            metrics,
        }
    }

    /// Run the full training loop. Each episode plays one hand, then runs
    /// a single replay step.
    pub fn run(&mut self) -> Result<TrainingStats, TrainingError> {
        let total = self.config.num_episodes;
        let batch_size = self.agent.config().batch_size;
        tracing::info!(
            episodes = total,
            batch_size,
            initial_player_cards = self.config.initial_player_cards,
            seed = ?self.config.seed,
            "starting DQN training"
        );

        for episode in 1..=total {
            let result = self.play_episode()?;
            if let Some(loss) = self.agent.replay(batch_size)? {
                self.metrics.record_update(loss);
            }
            self.metrics.record_episode(result);

            if episode % self.config.log_interval == 0 {
                let window = self.config.reward_window;
                tracing::info!(
                    episode,
                    total,
                    avg_reward = self.metrics.average_reward(window),
                    epsilon = self.agent.epsilon(),
                    loss = self.metrics.average_loss(self.config.log_interval),
                    win_rate = self.metrics.win_rate(window),
                    push_rate = self.metrics.push_rate(window),
                    avg_steps = self.metrics.average_steps(window),
                    "training progress"
                );
            }
        }

        let stats = self.stats();
        tracing::info!(
            episodes = stats.episodes,
            final_avg_reward = stats.final_avg_reward,
            max_reward = stats.max_reward,
            min_reward = stats.min_reward,
            updates = self.agent.step_count(),
            "training complete"
        );
        Ok(stats)
    }

    /// Play one hand with epsilon-greedy actions, storing every transition.
    fn play_episode(&mut self) -> Result<EpisodeResult, TrainingError> {
        let mut round = self.simulator.deal();
        let mut state = round.state();
        let mut reward = 0.0;
        let mut steps = 0;

        while steps < self.config.max_steps_per_episode {
            let epsilon = self.agent.epsilon();
            let action = self.agent.act(&state, epsilon)?;
            let step = self.simulator.step(&mut round, action)?;
            self.agent.remember(Transition {
                state,
                action,
                reward: step.reward,
                next_state: step.next_state,
                done: step.done,
            });
            reward += step.reward;
            steps += 1;
            state = step.next_state;
            if step.done {
                break;
            }
        }

        tracing::debug!(reward, steps, outcome = ?round.outcome(), "episode finished");
        Ok(EpisodeResult {
            reward,
            steps,
            outcome: round.outcome(),
        })
    }

    /// Play `hands` hands greedily with the trained agent and uniformly at
    /// random, on a separate shoe. Neither policy learns and the training
    /// metrics are untouched.
    pub fn evaluate(&mut self, hands: usize) -> Result<Evaluation, TrainingError> {
        let mut eval_rng = site_rng(self.config.seed, EVAL_SEED);
        let mut simulator = Simulator::new(
            self.config.num_decks,
            self.config.initial_player_cards,
            StdRng::from_rng(&mut eval_rng),
        );
        let agent = self.play_hands(&mut simulator, Policy::Trained, hands)?;

        let mut random = RandomAgent::with_rng(StdRng::from_rng(&mut eval_rng));
        let baseline = self.play_hands(&mut simulator, Policy::Other(&mut random), hands)?;

        tracing::info!(
            hands,
            agent_win_rate = agent.win_rate(),
            agent_avg_reward = agent.average_reward(),
            random_win_rate = baseline.win_rate(),
            random_avg_reward = baseline.average_reward(),
            "evaluation complete"
        );
        Ok(Evaluation { agent, baseline })
    }

    fn play_hands(
        &mut self,
        simulator: &mut Simulator,
        mut policy: Policy<'_>,
        hands: usize,
    ) -> Result<EvalReport, TrainingError> {
        let mut report = EvalReport::default();
        for _ in 0..hands {
            let mut round = simulator.deal();
            let mut reward = 0.0;
            for _ in 0..self.config.max_steps_per_episode {
                let state = round.state();
                let action = match &mut policy {
                    Policy::Trained => self.agent.select_action(&state, false)?,
                    Policy::Other(agent) => agent.select_action(&state, false)?,
                };
                let step = simulator.step(&mut round, action)?;
                reward += step.reward;
                if step.done {
                    break;
                }
            }
            report.record(reward, round.outcome());
        }
        Ok(report)
    }

    /// Write the online network to `config.model_path`.
    pub fn export(&self, config: &ExportConfig) -> Result<ExportReport, ArtifactError> {
        let info = ExportInfo {
            episodes: self.metrics.total_episodes(),
            final_epsilon: self.agent.epsilon(),
        };
        ModelExporter::new(config.quantization).export(
            &self.agent.online_network(),
            info,
            &config.model_path,
        )
    }

    /// Summarise the run so far and write it to `path`.
    pub fn record_stats(&self, path: &Path) -> Result<TrainingStats, ArtifactError> {
        let stats = self.stats();
        StatsRecorder::write(path, &stats)?;
        Ok(stats)
    }

    pub fn stats(&self) -> TrainingStats {
        TrainingStats::from_metrics(&self.metrics, self.config.reward_window)
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn agent(&self) -> &DqnAgent {
        &self.agent
    }

    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    /// End the session, keeping the trained agent.
    pub fn into_agent(self) -> DqnAgent {
        self.agent
    }
}

enum Policy<'a> {
    Trained,
    Other(&'a mut dyn Agent),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{ExportedModel, Quantization};

    fn small_config(episodes: usize) -> TrainerConfig {
        TrainerConfig {
            num_episodes: episodes,
            log_interval: 10,
            reward_window: 10,
            eval_hands: 20,
            seed: Some(7),
            ..Default::default()
        }
    }

    fn small_agent() -> DqnConfig {
        DqnConfig {
            batch_size: 8,
            replay_capacity: 200,
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = TrainerConfig::default();
        assert_eq!(config.num_episodes, 1000);
        assert_eq!(config.max_steps_per_episode, 20);
        assert_eq!(config.initial_player_cards, 1);
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_run_records_every_episode() {
        let mut session = TrainingSession::new(small_config(30), small_agent());
        let stats = session.run().unwrap();

        assert_eq!(stats.episodes, 30);
        assert_eq!(session.metrics().total_episodes(), 30);
        assert!(stats.max_reward <= 1.0 && stats.min_reward >= -1.0);
        assert!(stats.min_reward <= stats.final_avg_reward);
        assert!(stats.final_avg_reward <= stats.max_reward);
        // Every hand stores at least one transition, so replay ran once the
        // buffer reached the batch size.
        assert!(session.agent().replay_len() >= 30);
        assert!(session.agent().step_count() > 0);
        assert!(session.agent().epsilon() < 1.0);
    }

    #[test]
    fn test_episode_rewards_in_range() {
        let mut session = TrainingSession::new(small_config(0), small_agent());
        for _ in 0..50 {
            let result = session.play_episode().unwrap();
            assert!(result.steps >= 1 && result.steps <= 20);
            assert!((-1.0..=1.0).contains(&result.reward));
            // One deck cannot supply 20 hits without a bust.
            assert!(result.outcome.is_some());
        }
    }

    #[test]
    fn test_step_cap_ends_hand() {
        let config = TrainerConfig {
            max_steps_per_episode: 1,
            ..small_config(0)
        };
        let mut session = TrainingSession::new(config, small_agent());
        for _ in 0..20 {
            let result = session.play_episode().unwrap();
            assert_eq!(result.steps, 1);
        }
    }

    #[test]
    fn test_evaluate_does_not_touch_training_metrics() {
        let mut session = TrainingSession::new(small_config(10), small_agent());
        session.run().unwrap();
        let steps = session.agent().step_count();

        let eval = session.evaluate(25).unwrap();
        assert_eq!(eval.agent.hands, 25);
        assert_eq!(eval.baseline.hands, 25);
        assert!(eval.agent.wins + eval.agent.pushes + eval.agent.losses <= 25);
        assert_eq!(session.metrics().total_episodes(), 10);
        assert_eq!(session.agent().step_count(), steps);
    }

    #[test]
    fn test_export_and_stats_after_run() {
        let dir = tempfile::tempdir().unwrap();
        let export = ExportConfig {
            model_path: dir.path().join("models").join("policy.safetensors"),
            stats_path: dir.path().join("data").join("stats.json"),
            quantization: Quantization::Int8,
        };

        let mut session = TrainingSession::new(small_config(20), small_agent());
        let stats = session.run().unwrap();
        let report = session.export(&export).unwrap();
        session.record_stats(&export.stats_path).unwrap();

        assert!(report.bytes > 0);
        let model = ExportedModel::load(&export.model_path).unwrap();
        assert_eq!(model.metadata().episodes, 20);
        assert_eq!(StatsRecorder::read(&export.stats_path).unwrap(), stats);

        let agent = session.into_agent();
        assert!(agent.replay_len() > 0);
    }

    #[test]
    fn test_eval_report_rates() {
        let mut report = EvalReport::default();
        report.record(1.0, Some(Outcome::Win));
        report.record(0.0, Some(Outcome::Push));
        report.record(-1.0, Some(Outcome::Loss));
        report.record(1.0, Some(Outcome::Win));
        assert!((report.win_rate() - 0.5).abs() < 1e-6);
        assert!((report.push_rate() - 0.25).abs() < 1e-6);
        assert!((report.loss_rate() - 0.25).abs() < 1e-6);
        assert!((report.average_reward() - 0.25).abs() < 1e-6);
        assert_eq!(EvalReport::default().average_reward(), 0.0);
    }
}
