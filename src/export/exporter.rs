use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use burn::prelude::*;
use safetensors::serialize;
use safetensors::tensor::{Dtype, TensorView};
use serde::{Deserialize, Serialize};

use crate::ai::{Activation, DenseLayer, ValueNetwork};
use crate::error::{ArtifactError, TrainingError};
use crate::game::{Action, NUM_ACTIONS, STATE_SIZE};

/// Key of the JSON metadata entry in the safetensors header.
pub const METADATA_KEY: &str = "blackjack_policy";

/// Current artifact layout version.
pub const FORMAT_VERSION: u32 = 1;

/// Weight storage precision in the exported artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quantization {
    /// Full f32 weights.
    None,
    /// Symmetric per-tensor int8 weights with an f32 scale; biases stay f32.
    Int8,
}

/// Where run artifacts go and how the model is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub model_path: PathBuf,
    pub stats_path: PathBuf,
    pub quantization: Quantization,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            model_path: PathBuf::from("models/blackjack_policy.safetensors"),
            stats_path: PathBuf::from("data/training_stats.json"),
            quantization: Quantization::Int8,
        }
    }
}

/// Shape and activation of one dense layer, as recorded in the header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerInfo {
    pub name: String,
    pub input_size: usize,
    pub output_size: usize,
    pub activation: Activation,
}

/// Header metadata describing the inference contract. A batch dimension
/// of `-1` means any batch size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub format_version: u32,
    pub input_shape: [i64; 2],
    pub output_shape: [i64; 2],
    pub state_features: Vec<String>,
    pub actions: Vec<String>,
    pub layers: Vec<LayerInfo>,
    pub quantization: Quantization,
    pub episodes: usize,
    pub final_epsilon: f32,
}

/// Training facts stamped into the artifact.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportInfo {
    pub episodes: usize,
    pub final_epsilon: f32,
}

/// What an export produced.
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub path: PathBuf,
    pub bytes: usize,
    pub parameters: usize,
    pub quantization: Quantization,
}

/// Symmetric int8 quantization. Returns the codes and the scale that maps
/// them back (`value ≈ code * scale`).
pub fn quantize_int8(values: &[f32]) -> (Vec<i8>, f32) {
    let max_abs = values.iter().fold(0.0f32, |m, v| m.max(v.abs()));
    let scale = if max_abs > 0.0 { max_abs / 127.0 } else { 1.0 };
    let codes = values
        .iter()
        .map(|v| (v / scale).round().clamp(-127.0, 127.0) as i8)
        .collect();
    (codes, scale)
}

fn f32_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|f| f.to_le_bytes()).collect()
}

struct OwnedTensor {
    name: String,
    dtype: Dtype,
    shape: Vec<usize>,
    data: Vec<u8>,
}

/// Serializes the online value network into a safetensors file that a
/// game client can run without this crate.
pub struct ModelExporter {
    quantization: Quantization,
}

impl ModelExporter {
    pub fn new(quantization: Quantization) -> Self {
        ModelExporter { quantization }
    }

    /// Export `network` to `path`, creating parent directories as needed.
    pub fn export<B: Backend>(
        &self,
        network: &ValueNetwork<B>,
        info: ExportInfo,
        path: &Path,
    ) -> Result<ExportReport, ArtifactError> {
        let layers = network.dense_layers().map_err(|e| match e {
            TrainingError::Tensor(msg) => ArtifactError::Tensor(msg),
            other => ArtifactError::Tensor(other.to_string()),
        })?;
        let bytes = self.to_bytes(&layers, info)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, path)?;

        let parameters = layers.iter().map(|l| l.weight.len() + l.bias.len()).sum();
        tracing::info!(
            path = %path.display(),
            size_kb = bytes.len() as f64 / 1024.0,
            parameters,
            quantization = ?self.quantization,
            "model exported"
        );

        Ok(ExportReport {
            path: path.to_path_buf(),
            bytes: bytes.len(),
            parameters,
            quantization: self.quantization,
        })
    }

    /// Encode layers and metadata as safetensors bytes.
    pub fn to_bytes(&self, layers: &[DenseLayer], info: ExportInfo) -> Result<Vec<u8>, ArtifactError> {
        let metadata = ExportMetadata {
            format_version: FORMAT_VERSION,
            input_shape: [-1, STATE_SIZE as i64],
            output_shape: [-1, NUM_ACTIONS as i64],
            state_features: [
                "player_total/21",
                "dealer_upcard_value/11",
                "has_ace",
                "can_split",
                "hand_size/5",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            actions: Action::ALL.iter().map(|a| a.name().to_string()).collect(),
            layers: layers
                .iter()
                .map(|l| LayerInfo {
                    name: l.name.clone(),
                    input_size: l.input_size,
                    output_size: l.output_size,
                    activation: l.activation,
                })
                .collect(),
            quantization: self.quantization,
            episodes: info.episodes,
            final_epsilon: info.final_epsilon,
        };

        let mut owned = Vec::with_capacity(layers.len() * 3);
        for layer in layers {
            let weight_shape = vec![layer.input_size, layer.output_size];
            match self.quantization {
                Quantization::None => owned.push(OwnedTensor {
                    name: format!("{}.weight", layer.name),
                    dtype: Dtype::F32,
                    shape: weight_shape,
                    data: f32_bytes(&layer.weight),
                }),
                Quantization::Int8 => {
                    let (codes, scale) = quantize_int8(&layer.weight);
                    owned.push(OwnedTensor {
                        name: format!("{}.weight", layer.name),
                        dtype: Dtype::I8,
                        shape: weight_shape,
                        data: codes.into_iter().map(|c| c as u8).collect(),
                    });
                    owned.push(OwnedTensor {
                        name: format!("{}.weight_scale", layer.name),
                        dtype: Dtype::F32,
                        shape: vec![1],
                        data: f32_bytes(&[scale]),
                    });
                }
            }
            owned.push(OwnedTensor {
                name: format!("{}.bias", layer.name),
                dtype: Dtype::F32,
                shape: vec![layer.output_size],
                data: f32_bytes(&layer.bias),
            });
        }

        let views = owned
            .iter()
            .map(|t| {
                TensorView::new(t.dtype, t.shape.clone(), &t.data)
                    .map(|view| (t.name.as_str(), view))
                    .map_err(|e| ArtifactError::Serialize(format!("{e:?}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut meta_map: HashMap<String, String> = HashMap::new();
        meta_map.insert(METADATA_KEY.to_string(), serde_json::to_string(&metadata)?);

        serialize(views, &Some(meta_map)).map_err(|e| ArtifactError::Serialize(format!("{e:?}")))
    }
}
