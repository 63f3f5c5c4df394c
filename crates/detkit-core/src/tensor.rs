use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Context};
use serde::Serialize;
use smallvec::SmallVec;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    Cpu,
    Cuda { device_id: u32 },
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => f.write_str("cpu"),
            Device::Cuda { device_id } => write!(f, "cuda:{device_id}"),
        }
    }
}

impl FromStr for Device {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.eq_ignore_ascii_case("cpu") {
            return Ok(Device::Cpu);
        }
        if raw.eq_ignore_ascii_case("cuda") {
            return Ok(Device::Cuda { device_id: 0 });
        }
        if let Some(rest) = raw.strip_prefix("cuda:") {
            let device_id: u32 = rest.parse().context("invalid cuda device id")?;
            return Ok(Device::Cuda { device_id });
        }

        bail!("unsupported device: {raw} (expected cpu or cuda:N)");
    }
}

/// Element type of a model input or output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum DType {
    F32,
    F16,
    BF16,
    F64,
    I4,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    Bool,
    Str,
    Complex64,
    Complex128,
    Resource,
    Variant,
    /// A type code this build does not know about.
    Unknown(i32),
}

impl DType {
    /// Numpy-style name, which is what the mobile side reads in docs and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            DType::F32 => "float32",
            DType::F16 => "float16",
            DType::BF16 => "bfloat16",
            DType::F64 => "float64",
            DType::I4 => "int4",
            DType::I8 => "int8",
            DType::I16 => "int16",
            DType::I32 => "int32",
            DType::I64 => "int64",
            DType::U8 => "uint8",
            DType::U16 => "uint16",
            DType::U32 => "uint32",
            DType::U64 => "uint64",
            DType::Bool => "bool",
            DType::Str => "string",
            DType::Complex64 => "complex64",
            DType::Complex128 => "complex128",
            DType::Resource => "resource",
            DType::Variant => "variant",
            DType::Unknown(_) => "unknown",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::Unknown(code) => write!(f, "unknown({code})"),
            other => f.write_str(other.as_str()),
        }
    }
}

impl From<DType> for String {
    fn from(dtype: DType) -> Self {
        dtype.to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Shape(pub SmallVec<[usize; 6]>);

impl Shape {
    pub fn from_slice(d: &[usize]) -> Self {
        Self(d.iter().copied().collect())
    }
    pub fn rank(&self) -> usize {
        self.0.len()
    }
    pub fn dim(&self, axis: usize) -> Option<usize> {
        self.0.get(axis).copied()
    }
    pub fn numel(&self) -> usize {
        self.0.iter().product::<usize>().max(1)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_devices() {
        assert_eq!("cpu".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!("CUDA".parse::<Device>().unwrap(), Device::Cuda { device_id: 0 });
        assert_eq!(
            "cuda:2".parse::<Device>().unwrap(),
            Device::Cuda { device_id: 2 }
        );
        assert!("tpu".parse::<Device>().is_err());
        assert!("cuda:x".parse::<Device>().is_err());
    }

    #[test]
    fn device_display_round_trips() {
        let dev = Device::Cuda { device_id: 1 };
        assert_eq!(dev.to_string().parse::<Device>().unwrap(), dev);
    }

    #[test]
    fn shape_helpers() {
        let shape = Shape::from_slice(&[1, 84, 8400]);
        assert_eq!(shape.rank(), 3);
        assert_eq!(shape.dim(2), Some(8400));
        assert_eq!(shape.dim(3), None);
        assert_eq!(shape.numel(), 84 * 8400);
        assert_eq!(shape.to_string(), "[1, 84, 8400]");
    }

    #[test]
    fn dtype_names_follow_numpy() {
        assert_eq!(DType::F32.to_string(), "float32");
        assert_eq!(DType::U8.to_string(), "uint8");
        assert_eq!(DType::Unknown(42).to_string(), "unknown(42)");
    }
}
