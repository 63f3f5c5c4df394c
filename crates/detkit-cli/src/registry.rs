use std::path::Path;

use anyhow::{Context, Result};
use bytes::Bytes;
use detkit_backend_tflite::{has_tflite_identifier, TfLiteBackend};
use detkit_core::{Backend, BackendModel, Device, ModelArtifact, ModelSpec};
use tracing::debug;

/// Extensions the inspector can open in this build.
pub fn supported_extensions() -> Vec<&'static str> {
    #[allow(unused_mut)]
    let mut exts = TfLiteBackend::new().extensions().to_vec();
    #[cfg(feature = "onnx")]
    exts.extend_from_slice(detkit_backend_ort::OrtBackend::new().extensions());
    exts
}

/// Reads the tensor description of the model at `path`.
///
/// The backend is picked by extension. Files with any other name are accepted when their
/// contents carry the TFLite identifier.
pub fn load_spec(path: &Path) -> Result<ModelSpec> {
    let artifact = match ModelArtifact::from_path(path) {
        Ok(artifact) => artifact,
        Err(err) => match sniff_tflite(path) {
            Some(data) => {
                debug!(path = %path.display(), "no model extension; contents are TFLite");
                let artifact = ModelArtifact::TfLiteBytes(data);
                return load_with(&TfLiteBackend::new(), &artifact)
                    .with_context(|| format!("failed to load TFLite model {}", path.display()));
            }
            None => return Err(err),
        },
    };
    match &artifact {
        ModelArtifact::TfLitePath(_) | ModelArtifact::TfLiteBytes(_) => {
            load_with(&TfLiteBackend::new(), &artifact)
        }
        ModelArtifact::OnnxPath(_) => load_onnx(&artifact),
    }
}

#[cfg(feature = "onnx")]
fn load_onnx(artifact: &ModelArtifact) -> Result<ModelSpec> {
    load_with(&detkit_backend_ort::OrtBackend::new(), artifact)
}

#[cfg(not(feature = "onnx"))]
fn load_onnx(artifact: &ModelArtifact) -> Result<ModelSpec> {
    let path = artifact.path().unwrap_or_else(|| Path::new("<memory>"));
    anyhow::bail!(
        "{} is an ONNX model, but this build only reads {}; rebuild with `--features onnx`",
        path.display(),
        supported_extensions().join(", ")
    )
}

fn sniff_tflite(path: &Path) -> Option<Bytes> {
    let data = std::fs::read(path).ok()?;
    has_tflite_identifier(&data).then(|| Bytes::from(data))
}

fn load_with<B: Backend>(backend: &B, artifact: &ModelArtifact) -> Result<ModelSpec> {
    debug!(backend = backend.name(), format = artifact.format_name(), "loading model");
    let model = backend.load(artifact, Device::Cpu)?;
    Ok(model.spec().clone())
}
