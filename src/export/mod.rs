//! Portable model artifact: safetensors export of the trained value
//! network (optionally int8-quantized) and a dependency-free reader that
//! runs it.

mod exporter;
mod model;

pub use exporter::{
    quantize_int8, ExportConfig, ExportInfo, ExportMetadata, ExportReport, LayerInfo,
    ModelExporter, Quantization, FORMAT_VERSION, METADATA_KEY,
};
pub use model::ExportedModel;
