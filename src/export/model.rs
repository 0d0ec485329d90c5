use std::fs;
use std::path::{Path, PathBuf};

use safetensors::tensor::{Dtype, SafeTensors, TensorView};

use super::exporter::{ExportMetadata, Quantization, METADATA_KEY};
use crate::ai::{Activation, DenseLayer};
use crate::error::ArtifactError;
use crate::game::{argmax, Action, StateVector, NUM_ACTIONS, STATE_SIZE};

/// Exported policy loaded back into plain Rust: dequantized dense layers and
/// a CPU forward pass. This is what a consuming game runs.
#[derive(Debug, Clone)]
pub struct ExportedModel {
    metadata: ExportMetadata,
    layers: Vec<DenseLayer>,
}

impl ExportedModel {
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes).map_err(|e| match e {
            ArtifactError::Deserialize { reason, .. } => ArtifactError::Deserialize {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArtifactError> {
        let bad = |reason: String| ArtifactError::Deserialize {
            path: PathBuf::new(),
            reason,
        };

        let (_, header) = SafeTensors::read_metadata(bytes).map_err(|e| bad(format!("{e:?}")))?;
        let json = header
            .metadata()
            .as_ref()
            .and_then(|m| m.get(METADATA_KEY))
            .ok_or(ArtifactError::MissingMetadata)?;
        let metadata: ExportMetadata = serde_json::from_str(json)?;

        let tensors = SafeTensors::deserialize(bytes).map_err(|e| bad(format!("{e:?}")))?;

        let mut layers = Vec::with_capacity(metadata.layers.len());
        for info in &metadata.layers {
            let weight_name = format!("{}.weight", info.name);
            let weight_view = tensor(&tensors, &weight_name)?;
            check_shape(&weight_name, &weight_view, &[info.input_size, info.output_size])?;
            let weight = match weight_view.dtype() {
                Dtype::F32 => read_f32(&weight_view),
                Dtype::I8 => {
                    let scale_name = format!("{}.weight_scale", info.name);
                    let scale_view = tensor(&tensors, &scale_name)?;
                    check_shape(&scale_name, &scale_view, &[1])?;
                    if scale_view.dtype() != Dtype::F32 {
                        return Err(ArtifactError::UnsupportedDtype {
                            name: scale_name,
                            dtype: format!("{:?}", scale_view.dtype()),
                        });
                    }
                    let scale = read_f32(&scale_view)
                        .first()
                        .copied()
                        .ok_or_else(|| ArtifactError::MissingTensor(scale_name.clone()))?;
                    weight_view
                        .data()
                        .iter()
                        .map(|&b| b as i8 as f32 * scale)
                        .collect()
                }
                other => {
                    return Err(ArtifactError::UnsupportedDtype {
                        name: weight_name,
                        dtype: format!("{other:?}"),
                    })
                }
            };

            let bias_name = format!("{}.bias", info.name);
            let bias_view = tensor(&tensors, &bias_name)?;
            check_shape(&bias_name, &bias_view, &[info.output_size])?;
            if bias_view.dtype() != Dtype::F32 {
                return Err(ArtifactError::UnsupportedDtype {
                    name: bias_name,
                    dtype: format!("{:?}", bias_view.dtype()),
                });
            }

            layers.push(DenseLayer {
                name: info.name.clone(),
                input_size: info.input_size,
                output_size: info.output_size,
                weight,
                bias: read_f32(&bias_view),
                activation: info.activation,
            });
        }

        let model = ExportedModel { metadata, layers };
        model.check_contract()?;
        Ok(model)
    }

    /// Input must be 5 wide, output 3 wide, and layers must chain.
    fn check_contract(&self) -> Result<(), ArtifactError> {
        let mut width = STATE_SIZE;
        for layer in &self.layers {
            if layer.input_size != width {
                return Err(ArtifactError::ShapeMismatch {
                    name: format!("{}.weight", layer.name),
                    expected: vec![width, layer.output_size],
                    actual: vec![layer.input_size, layer.output_size],
                });
            }
            width = layer.output_size;
        }
        if width != NUM_ACTIONS {
            return Err(ArtifactError::ShapeMismatch {
                name: "output".to_string(),
                expected: vec![NUM_ACTIONS],
                actual: vec![width],
            });
        }
        Ok(())
    }

    pub fn metadata(&self) -> &ExportMetadata {
        &self.metadata
    }

    pub fn quantization(&self) -> Quantization {
        self.metadata.quantization
    }

    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    /// Value estimates for hit, stand and double.
    pub fn predict(&self, state: &StateVector) -> [f32; NUM_ACTIONS] {
        let mut x: Vec<f32> = state.as_array().to_vec();
        for layer in &self.layers {
            let mut y = layer.bias.clone();
            for (i, &xi) in x.iter().enumerate() {
                if xi == 0.0 {
                    continue;
                }
                let row = &layer.weight[i * layer.output_size..(i + 1) * layer.output_size];
                for (yo, w) in y.iter_mut().zip(row) {
                    *yo += xi * w;
                }
            }
            if layer.activation != Activation::Linear {
                y.iter_mut().for_each(|v| *v = layer.activation.apply(*v));
            }
            x = y;
        }
        [x[0], x[1], x[2]]
    }

    pub fn predict_batch(&self, states: &[StateVector]) -> Vec<[f32; NUM_ACTIONS]> {
        states.iter().map(|s| self.predict(s)).collect()
    }

    /// Highest-valued action for the state.
    pub fn recommend(&self, state: &StateVector) -> Action {
        Action::ALL[argmax(&self.predict(state))]
    }
}

fn tensor<'a>(tensors: &'a SafeTensors<'a>, name: &str) -> Result<TensorView<'a>, ArtifactError> {
    tensors
        .tensor(name)
        .map_err(|_| ArtifactError::MissingTensor(name.to_string()))
}

fn check_shape(name: &str, view: &TensorView<'_>, expected: &[usize]) -> Result<(), ArtifactError> {
    if view.shape() != expected {
        return Err(ArtifactError::ShapeMismatch {
            name: name.to_string(),
            expected: expected.to_vec(),
            actual: view.shape().to_vec(),
        });
    }
    Ok(())
}

fn read_f32(view: &TensorView<'_>) -> Vec<f32> {
    view.data()
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
