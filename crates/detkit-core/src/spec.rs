use std::fmt;

use serde::Serialize;

use crate::{DType, Shape};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct IOName(pub String);

impl fmt::Display for IOName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TensorSpec {
    pub name: IOName,
    pub dtype: DType,
    pub rank: usize,
    pub dims: Vec<Option<usize>>, // None = dynamic
}

impl TensorSpec {
    pub fn new(name: impl Into<String>, dtype: DType, dims: Vec<Option<usize>>) -> Self {
        Self {
            name: IOName(name.into()),
            dtype,
            rank: dims.len(),
            dims,
        }
    }

    /// Fully static tensor, as most exported detectors are.
    pub fn fixed(name: impl Into<String>, dtype: DType, dims: &[usize]) -> Self {
        Self::new(name, dtype, dims.iter().map(|d| Some(*d)).collect())
    }

    pub fn dim(&self, axis: usize) -> Option<usize> {
        self.dims.get(axis).copied().flatten()
    }

    /// Concrete shape, or `None` if any dimension is dynamic.
    pub fn shape(&self) -> Option<Shape> {
        let dims = self.dims.iter().copied().collect::<Option<Vec<_>>>()?;
        Some(Shape::from_slice(&dims))
    }

    /// Shape as printed in reports; dynamic axes show as `-1`.
    pub fn shape_display(&self) -> String {
        let dims = self
            .dims
            .iter()
            .map(|d| d.map_or_else(|| "-1".to_string(), |v| v.to_string()))
            .collect::<Vec<_>>();
        format!("[{}]", dims.join(", "))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModelSpec {
    pub format: String,
    pub version: Option<u32>,
    pub description: Option<String>,
    pub inputs: Vec<TensorSpec>,
    pub outputs: Vec<TensorSpec>,
}

impl ModelSpec {
    pub fn new(format: impl Into<String>, inputs: Vec<TensorSpec>, outputs: Vec<TensorSpec>) -> Self {
        Self {
            format: format.into(),
            version: None,
            description: None,
            inputs,
            outputs,
        }
    }
}
