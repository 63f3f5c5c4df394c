//! TensorFlow Lite model reader.
//!
//! Reads tensor metadata straight from the flatbuffer; no interpreter is built and no
//! weights are touched.

#[cfg(any(test, feature = "fixture"))]
pub mod fixture;
pub mod schema;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use detkit_core::{Backend, BackendModel, DType, Device, ModelArtifact, ModelSpec, TensorSpec};
use flatbuffers::{ForwardsUOffset, Vector};
use thiserror::Error;
use tracing::{debug, info};

use crate::schema::{SubGraph, Tensor};

#[derive(Debug, Error)]
pub enum TfLiteError {
    #[error("failed to read model file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("not a TFLite model (missing `{}` file identifier)", schema::FILE_IDENTIFIER)]
    BadIdentifier,
    #[error("malformed TFLite flatbuffer: {0}")]
    InvalidFlatbuffer(#[from] flatbuffers::InvalidFlatbuffer),
    #[error("TFLite model has no subgraphs")]
    NoSubgraphs,
    #[error("subgraph {kind} refers to tensor {index}, but only {count} tensors exist")]
    TensorIndex {
        kind: &'static str,
        index: i32,
        count: usize,
    },
}

pub struct TfLiteBackend;

impl TfLiteBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TfLiteBackend {
    fn default() -> Self {
        Self::new()
    }
}

pub struct TfLiteModel {
    spec: ModelSpec,
}

impl Backend for TfLiteBackend {
    type Model = TfLiteModel;

    fn name(&self) -> &'static str {
        "tflite"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["tflite"]
    }

    fn load(&self, artifact: &ModelArtifact, _device: Device) -> Result<Self::Model> {
        let data = match artifact {
            ModelArtifact::TfLitePath(path) => {
                let raw = std::fs::read(path).map_err(|source| TfLiteError::Io {
                    path: path.clone(),
                    source,
                })?;
                Bytes::from(raw)
            }
            ModelArtifact::TfLiteBytes(bytes) => bytes.clone(),
            _ => bail!("tflite backend expects a TFLite file or buffer"),
        };

        let spec = parse_model_spec(&data).with_context(|| match artifact.path() {
            Some(path) => format!("failed to load TFLite model {}", path.display()),
            None => "failed to load in-memory TFLite model".to_string(),
        })?;
        info!(
            inputs = spec.inputs.len(),
            outputs = spec.outputs.len(),
            bytes = data.len(),
            "loaded TFLite model"
        );

        Ok(TfLiteModel { spec })
    }
}

impl BackendModel for TfLiteModel {
    fn spec(&self) -> &ModelSpec {
        &self.spec
    }
}

/// True when `data` starts like a TFLite flatbuffer, whatever the file is called.
pub fn has_tflite_identifier(data: &[u8]) -> bool {
    // 4-byte root offset followed by the identifier.
    data.len() >= 8 && flatbuffers::buffer_has_identifier(data, schema::FILE_IDENTIFIER, false)
}

/// Reads the input/output descriptors of the primary subgraph.
pub fn parse_model_spec(data: &[u8]) -> Result<ModelSpec, TfLiteError> {
    if !has_tflite_identifier(data) {
        return Err(TfLiteError::BadIdentifier);
    }
    let model = schema::root_as_model(data)?;
    let subgraphs = model.subgraphs().ok_or(TfLiteError::NoSubgraphs)?;
    if subgraphs.is_empty() {
        return Err(TfLiteError::NoSubgraphs);
    }
    if subgraphs.len() > 1 {
        debug!(count = subgraphs.len(), "model has several subgraphs; reading the first");
    }
    let graph = subgraphs.get(0);
    debug!(name = graph.name().unwrap_or(""), "reading subgraph");

    let inputs = collect_io(&graph, graph.inputs(), "inputs")?;
    let outputs = collect_io(&graph, graph.outputs(), "outputs")?;

    let mut spec = ModelSpec::new("tflite", inputs, outputs);
    spec.version = Some(model.version());
    spec.description = model.description().map(str::to_string);
    Ok(spec)
}

fn collect_io(
    graph: &SubGraph<'_>,
    indices: Option<Vector<'_, i32>>,
    kind: &'static str,
) -> Result<Vec<TensorSpec>, TfLiteError> {
    let Some(indices) = indices else {
        return Ok(Vec::new());
    };
    let tensors = graph.tensors();
    let count = tensors.as_ref().map_or(0, |t| t.len());

    indices
        .iter()
        .map(|index| {
            let tensor = lookup(tensors.as_ref(), index).ok_or(TfLiteError::TensorIndex {
                kind,
                index,
                count,
            })?;
            Ok(tensor_spec(index, &tensor))
        })
        .collect()
}

fn lookup<'a>(
    tensors: Option<&Vector<'a, ForwardsUOffset<Tensor<'a>>>>,
    index: i32,
) -> Option<Tensor<'a>> {
    let tensors = tensors?;
    let index = usize::try_from(index).ok()?;
    (index < tensors.len()).then(|| tensors.get(index))
}

fn tensor_spec(index: i32, tensor: &Tensor<'_>) -> TensorSpec {
    // `shape` is what the interpreter reports after allocation; the signature keeps -1 for
    // dynamic axes and is only used when `shape` is absent.
    let raw = tensor.shape().or_else(|| tensor.shape_signature());
    let dims = raw
        .map(|dims| {
            dims.iter()
                .map(|d| usize::try_from(d).ok())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    let name = tensor
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("tensor_{index}"));

    TensorSpec::new(name, tensor_type_to_dtype(tensor.type_code()), dims)
}

/// Maps a TFLite `TensorType` code to a `DType`.
pub fn tensor_type_to_dtype(code: i8) -> DType {
    match code {
        0 => DType::F32,
        1 => DType::F16,
        2 => DType::I32,
        3 => DType::U8,
        4 => DType::I64,
        5 => DType::Str,
        6 => DType::Bool,
        7 => DType::I16,
        8 => DType::Complex64,
        9 => DType::I8,
        10 => DType::F64,
        11 => DType::Complex128,
        12 => DType::U64,
        13 => DType::Resource,
        14 => DType::Variant,
        15 => DType::U32,
        16 => DType::U16,
        17 => DType::I4,
        18 => DType::BF16,
        other => DType::Unknown(i32::from(other)),
    }
}
