use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use bytes::Bytes;

#[derive(Clone, Debug)]
pub enum ModelArtifact {
    TfLitePath(PathBuf),
    /// An already-read flatbuffer, e.g. one built in memory.
    TfLiteBytes(Bytes),
    OnnxPath(PathBuf),
}

impl ModelArtifact {
    /// Picks the artifact kind from the file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("tflite") => Ok(ModelArtifact::TfLitePath(path.to_path_buf())),
            Some("onnx") => Ok(ModelArtifact::OnnxPath(path.to_path_buf())),
            Some(other) => bail!(
                "unsupported model file extension .{other} for {} (expected .tflite or .onnx)",
                path.display()
            ),
            None => bail!(
                "cannot tell the model format of {} (expected a .tflite or .onnx file)",
                path.display()
            ),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            ModelArtifact::TfLitePath(p) | ModelArtifact::OnnxPath(p) => Some(p),
            ModelArtifact::TfLiteBytes(_) => None,
        }
    }

    pub fn format_name(&self) -> &'static str {
        match self {
            ModelArtifact::TfLitePath(_) | ModelArtifact::TfLiteBytes(_) => "tflite",
            ModelArtifact::OnnxPath(_) => "onnx",
        }
    }
}
