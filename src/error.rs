use std::path::PathBuf;

/// Errors from the hand state machine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("hand is already finished")]
    HandFinished,
}

/// Errors that can occur during training.
#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("tensor data extraction failed: {0}")]
    Tensor(String),

    #[error("non-finite loss {loss} at training step {step}")]
    NonFiniteLoss { step: usize, loss: f32 },

    #[error("game error: {0}")]
    Game(#[from] GameError),
}

/// Errors reading or writing run artifacts (model export, stats record).
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("failed to serialize model: {0}")]
    Serialize(String),

    #[error("failed to read model {path}: {reason}")]
    Deserialize { path: PathBuf, reason: String },

    #[error("tensor '{0}' missing from model file")]
    MissingTensor(String),

    #[error("tensor '{name}' has shape {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        name: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("tensor '{name}' has unsupported dtype {dtype}")]
    UnsupportedDtype { name: String, dtype: String },

    #[error("model file has no metadata header")]
    MissingMetadata,

    #[error("tensor data extraction failed: {0}")]
    Tensor(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
