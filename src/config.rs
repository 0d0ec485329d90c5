use std::path::Path;

use crate::ai::algorithms::DqnConfig;
use crate::error::ConfigError;
use crate::export::ExportConfig;
use crate::training::trainer::TrainerConfig;

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub agent: DqnConfig,
    pub training: TrainerConfig,
    pub export: ExportConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let agent = &self.agent;
        if agent.learning_rate <= 0.0 {
            return Err(ConfigError::Validation(
                "agent.learning_rate must be > 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&agent.gamma) {
            return Err(ConfigError::Validation(
                "agent.gamma must be in [0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&agent.epsilon_start) {
            return Err(ConfigError::Validation(
                "agent.epsilon_start must be in [0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&agent.epsilon_min) {
            return Err(ConfigError::Validation(
                "agent.epsilon_min must be in [0, 1]".into(),
            ));
        }
        if agent.epsilon_min > agent.epsilon_start {
            return Err(ConfigError::Validation(
                "agent.epsilon_min must be <= agent.epsilon_start".into(),
            ));
        }
        if agent.epsilon_decay <= 0.0 || agent.epsilon_decay > 1.0 {
            return Err(ConfigError::Validation(
                "agent.epsilon_decay must be in (0, 1]".into(),
            ));
        }
        if agent.batch_size == 0 {
            return Err(ConfigError::Validation(
                "agent.batch_size must be > 0".into(),
            ));
        }
        if agent.replay_capacity < agent.batch_size {
            return Err(ConfigError::Validation(
                "agent.replay_capacity must be >= agent.batch_size".into(),
            ));
        }

        let training = &self.training;
        if training.num_episodes == 0 {
            return Err(ConfigError::Validation(
                "training.num_episodes must be > 0".into(),
            ));
        }
        if training.max_steps_per_episode == 0 {
            return Err(ConfigError::Validation(
                "training.max_steps_per_episode must be > 0".into(),
            ));
        }
        if training.log_interval == 0 {
            return Err(ConfigError::Validation(
                "training.log_interval must be > 0".into(),
            ));
        }
        if training.reward_window == 0 {
            return Err(ConfigError::Validation(
                "training.reward_window must be > 0".into(),
            ));
        }
        if training.num_decks == 0 {
            return Err(ConfigError::Validation(
                "training.num_decks must be >= 1".into(),
            ));
        }
        if !(1..=2).contains(&training.initial_player_cards) {
            return Err(ConfigError::Validation(
                "training.initial_player_cards must be 1 or 2".into(),
            ));
        }

        Ok(())
    }

    /// Generate a TOML string with all default values (useful for creating
    /// example config files).
    pub fn default_toml() -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(&AppConfig::default())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::Quantization;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        config.validate().expect("default config should be valid");
    }

    #[test]
    fn test_defaults_match_entry_point() {
        let config = AppConfig::default();
        assert_eq!(config.training.num_episodes, 1000);
        assert_eq!(config.agent.batch_size, 32);
        assert_eq!(config.agent.replay_capacity, 10_000);
        assert!((config.agent.gamma - 0.99).abs() < 1e-6);
        assert!((config.agent.epsilon_start - 1.0).abs() < 1e-6);
        assert!((config.agent.epsilon_min - 0.01).abs() < 1e-6);
        assert!((config.agent.epsilon_decay - 0.995).abs() < 1e-6);
        assert!((config.agent.learning_rate - 0.001).abs() < 1e-9);
        assert_eq!(config.export.quantization, Quantization::Int8);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_str = r#"
[agent]
learning_rate = 0.0005
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert!((config.agent.learning_rate - 0.0005).abs() < 1e-9);
        // Other fields should be defaults
        assert!((config.agent.gamma - 0.99).abs() < 1e-6);
        assert_eq!(config.training.num_episodes, 1000);
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        let default = AppConfig::default();
        assert!((config.agent.learning_rate - default.agent.learning_rate).abs() < 1e-9);
        assert_eq!(config.training.num_episodes, default.training.num_episodes);
        assert_eq!(config.export.model_path, default.export.model_path);
    }

    #[test]
    fn test_export_section_parses() {
        let toml_str = r#"
[export]
model_path = "out/model.safetensors"
quantization = "none"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.export.model_path, Path::new("out/model.safetensors"));
        assert_eq!(config.export.quantization, Quantization::None);
        assert_eq!(config.export.stats_path, Path::new("data/training_stats.json"));
    }

    #[test]
    fn test_seed_parses() {
        let config: AppConfig = toml::from_str("[training]\nseed = 42\n").unwrap();
        assert_eq!(config.training.seed, Some(42));
    }

    #[test]
    fn test_validation_rejects_zero_episodes() {
        let mut config = AppConfig::default();
        config.training.num_episodes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_negative_lr() {
        let mut config = AppConfig::default();
        config.agent.learning_rate = -0.001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_invalid_gamma() {
        let mut config = AppConfig::default();
        config.agent.gamma = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = AppConfig::load_or_default(Path::new("nonexistent_config.toml")).unwrap();
        assert_eq!(config.training.num_episodes, 1000);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            r#"
[training]
num_episodes = 500
"#
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.training.num_episodes, 500);
        // Others are defaults
        assert!((config.agent.learning_rate - 1e-3).abs() < 1e-9);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[agent]\nbatch_size = 0\n").unwrap();
        assert!(matches!(
            AppConfig::load(&path),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_load_rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[agent\n").unwrap();
        assert!(matches!(AppConfig::load(&path), Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_default_toml_roundtrips() {
        let toml_str = AppConfig::default_toml().unwrap();
        let config: AppConfig = toml::from_str(&toml_str).unwrap();
        config.validate().expect("roundtripped config should be valid");
    }

    #[test]
    fn test_validation_rejects_epsilon_start_out_of_range() {
        let mut config = AppConfig::default();
        config.agent.epsilon_start = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_epsilon_min_out_of_range() {
        let mut config = AppConfig::default();
        config.agent.epsilon_min = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_epsilon_min_gt_start() {
        let mut config = AppConfig::default();
        config.agent.epsilon_start = 0.1;
        config.agent.epsilon_min = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_bad_decay() {
        let mut config = AppConfig::default();
        config.agent.epsilon_decay = 0.0;
        assert!(config.validate().is_err());
        config.agent.epsilon_decay = 1.01;
        assert!(config.validate().is_err());
        config.agent.epsilon_decay = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_replay_capacity_lt_batch() {
        let mut config = AppConfig::default();
        config.agent.replay_capacity = 10;
        config.agent.batch_size = 64;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_step_cap() {
        let mut config = AppConfig::default();
        config.training.max_steps_per_episode = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_log_interval() {
        let mut config = AppConfig::default();
        config.training.log_interval = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_decks() {
        let mut config = AppConfig::default();
        config.training.num_decks = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_initial_player_cards() {
        let mut config = AppConfig::default();
        config.training.initial_player_cards = 0;
        assert!(config.validate().is_err());
        config.training.initial_player_cards = 3;
        assert!(config.validate().is_err());
        config.training.initial_player_cards = 2;
        assert!(config.validate().is_ok());
    }
}
