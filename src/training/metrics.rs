use std::collections::VecDeque;

use crate::game::Outcome;

/// Result of a single episode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpisodeResult {
    /// Sum of step rewards over the hand.
    pub reward: f32,
    pub steps: usize,
    /// `None` when the step cap ended the hand before it settled.
    pub outcome: Option<Outcome>,
}

/// Training metrics tracker with rolling window computations. Extremes and
/// totals cover the whole run; rates and averages cover the window.
pub struct TrainingMetrics {
    episode_results: VecDeque<EpisodeResult>,
    update_losses: VecDeque<f32>,
    capacity: usize,
    total_episodes: usize, // lifetime count, never capped
    max_reward: Option<f32>,
    min_reward: Option<f32>,
}

impl TrainingMetrics {
    pub fn with_capacity(capacity: usize) -> Self {
        TrainingMetrics {
            episode_results: VecDeque::with_capacity(capacity),
            update_losses: VecDeque::with_capacity(capacity),
            capacity,
            total_episodes: 0,
            max_reward: None,
            min_reward: None,
        }
    }

    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn record_episode(&mut self, result: EpisodeResult) {
        self.total_episodes += 1;
        self.max_reward = Some(self.max_reward.map_or(result.reward, |m| m.max(result.reward)));
        self.min_reward = Some(self.min_reward.map_or(result.reward, |m| m.min(result.reward)));
        self.episode_results.push_back(result);
        if self.episode_results.len() > self.capacity {
            self.episode_results.pop_front();
        }
    }

    pub fn record_update(&mut self, loss: f32) {
        self.update_losses.push_back(loss);
        if self.update_losses.len() > self.capacity {
            self.update_losses.pop_front();
        }
    }

    /// Mean episode reward over the last N episodes.
    pub fn average_reward(&self, last_n: usize) -> f32 {
        let n = self.episode_results.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let sum: f32 = self
            .episode_results
            .iter()
            .rev()
            .take(n)
            .map(|r| r.reward)
            .sum();
        sum / n as f32
    }

    fn outcome_rate(&self, last_n: usize, outcome: Outcome) -> f32 {
        let n = self.episode_results.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let hits = self
            .episode_results
            .iter()
            .rev()
            .take(n)
            .filter(|r| r.outcome == Some(outcome))
            .count();
        hits as f32 / n as f32
    }

    /// Player win rate in the last N episodes.
    pub fn win_rate(&self, last_n: usize) -> f32 {
        self.outcome_rate(last_n, Outcome::Win)
    }

    /// Push rate in the last N episodes.
    pub fn push_rate(&self, last_n: usize) -> f32 {
        self.outcome_rate(last_n, Outcome::Push)
    }

    /// Average loss over the last N updates.
    pub fn average_loss(&self, last_n: usize) -> f32 {
        let n = self.update_losses.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let sum: f32 = self.update_losses.iter().rev().take(n).sum();
        sum / n as f32
    }

    /// Average number of decisions per hand over the last N episodes.
    pub fn average_steps(&self, last_n: usize) -> f32 {
        let n = self.episode_results.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let total: usize = self
            .episode_results
            .iter()
            .rev()
            .take(n)
            .map(|r| r.steps)
            .sum();
        total as f32 / n as f32
    }

    /// Best single-episode reward so far; 0.0 before any episode.
    pub fn max_reward(&self) -> f32 {
        self.max_reward.unwrap_or(0.0)
    }

    /// Worst single-episode reward so far; 0.0 before any episode.
    pub fn min_reward(&self) -> f32 {
        self.min_reward.unwrap_or(0.0)
    }

    pub fn total_episodes(&self) -> usize {
        self.total_episodes
    }
}

impl Default for TrainingMetrics {
    fn default() -> Self {
        Self::new()
    }
}
