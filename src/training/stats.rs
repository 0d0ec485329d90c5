use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ArtifactError;
use crate::training::metrics::TrainingMetrics;

/// Summary of a finished training run, written as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingStats {
    pub episodes: usize,
    pub final_avg_reward: f32,
    pub max_reward: f32,
    pub min_reward: f32,
}

impl TrainingStats {
    /// Summarise `metrics`, averaging the final `window` episodes.
    pub fn from_metrics(metrics: &TrainingMetrics, window: usize) -> Self {
        TrainingStats {
            episodes: metrics.total_episodes(),
            final_avg_reward: metrics.average_reward(window),
            max_reward: metrics.max_reward(),
            min_reward: metrics.min_reward(),
        }
    }
}

/// Persists [`TrainingStats`] records.
pub struct StatsRecorder;

impl StatsRecorder {
    /// Write `stats` to `path`, creating parent directories as needed. The
    /// record is written to a sibling temp file and renamed into place.
    pub fn write(path: &Path, stats: &TrainingStats) -> Result<(), ArtifactError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(stats)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        tracing::info!(path = %path.display(), "training stats saved");
        Ok(())
    }

    pub fn read(path: &Path) -> Result<TrainingStats, ArtifactError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Outcome;
    use crate::training::metrics::EpisodeResult;

    fn stats() -> TrainingStats {
        TrainingStats {
            episodes: 1000,
            final_avg_reward: -0.12,
            max_reward: 1.0,
            min_reward: -1.0,
        }
    }

    #[test]
    fn test_write_creates_directories_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("training_stats.json");

        StatsRecorder::write(&path, &stats()).unwrap();
        assert!(path.exists());
        assert_eq!(StatsRecorder::read(&path).unwrap(), stats());

        // Second write over an existing record
        StatsRecorder::write(&path, &stats()).unwrap();
    }

    #[test]
    fn test_json_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");
        StatsRecorder::write(&path, &stats()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["episodes"], 1000);
        assert!(value.get("final_avg_reward").is_some());
        assert!(value.get("max_reward").is_some());
        assert!(value.get("min_reward").is_some());
    }

    #[test]
    fn test_from_metrics() {
        let mut metrics = TrainingMetrics::with_capacity(100);
        for reward in [-1.0, 1.0, 0.0, 1.0] {
            metrics.record_episode(EpisodeResult {
                reward,
                steps: 1,
                outcome: Some(Outcome::Win),
            });
        }
        let stats = TrainingStats::from_metrics(&metrics, 100);
        assert_eq!(stats.episodes, 4);
        assert!((stats.final_avg_reward - 0.25).abs() < 1e-6);
        assert_eq!(stats.max_reward, 1.0);
        assert_eq!(stats.min_reward, -1.0);
    }

    #[test]
    fn test_read_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(StatsRecorder::read(&dir.path().join("nope.json")).is_err());
    }
}
