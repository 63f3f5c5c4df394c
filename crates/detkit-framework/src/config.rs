use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

pub const DEFAULT_DATASET: &str = "dataset.yaml";
pub const DEFAULT_PROJECT: &str = "runs/detect";
pub const DEFAULT_RUN_NAME: &str = "pepsico_yolov8e";
pub const DEFAULT_IMGSZ: u32 = 640;

/// A single training parameter value as the framework's CLI understands it.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ParamValue {
    /// Parses a `--set` style literal: bool, then integer, then float, else string.
    pub fn parse_literal(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "true" => return ParamValue::Bool(true),
            "false" => return ParamValue::Bool(false),
            _ => {}
        }
        if let Ok(v) = trimmed.parse::<i64>() {
            return ParamValue::Int(v);
        }
        if let Ok(v) = trimmed.parse::<f64>() {
            return ParamValue::Float(v);
        }
        ParamValue::Str(trimmed.to_string())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::Int(v) => write!(f, "{v}"),
            // Debug keeps the decimal point on whole floats (1.0, not 1).
            ParamValue::Float(v) => write!(f, "{v:?}"),
            ParamValue::Str(v) => f.write_str(v),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(i64::from(v))
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

/// Ordered training parameters handed to the framework as `key=value` pairs.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrainConfig {
    params: Vec<(String, ParamValue)>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self::defaults()
    }
}

impl TrainConfig {
    pub fn empty() -> Self {
        Self { params: Vec::new() }
    }

    /// The shipped recipe for the product detector.
    pub fn defaults() -> Self {
        use ParamValue::{Bool, Float, Int, Str};

        let params = vec![
            ("data", Str(DEFAULT_DATASET.into())),
            ("epochs", Int(100)),
            ("imgsz", Int(i64::from(DEFAULT_IMGSZ))),
            ("batch", Int(16)),
            ("device", Str("cpu".into())),
            ("workers", Int(8)),
            ("patience", Int(20)),
            ("save", Bool(true)),
            ("save_period", Int(10)),
            ("project", Str(DEFAULT_PROJECT.into())),
            ("name", Str(DEFAULT_RUN_NAME.into())),
            ("exist_ok", Bool(true)),
            ("pretrained", Bool(true)),
            ("optimizer", Str("Adam".into())),
            ("lr0", Float(0.001)),
            ("lrf", Float(0.01)),
            ("momentum", Float(0.937)),
            ("weight_decay", Float(0.0005)),
            ("warmup_epochs", Int(3)),
            ("warmup_momentum", Float(0.8)),
            ("box", Float(7.5)),
            ("cls", Float(0.5)),
            ("dfl", Float(1.5)),
            ("augment", Bool(true)),
            ("hsv_h", Float(0.015)),
            ("hsv_s", Float(0.7)),
            ("hsv_v", Float(0.4)),
            ("degrees", Float(0.0)),
            ("translate", Float(0.1)),
            ("scale", Float(0.5)),
            ("shear", Float(0.0)),
            ("perspective", Float(0.0)),
            ("flipud", Float(0.0)),
            ("fliplr", Float(0.5)),
            ("mosaic", Float(1.0)),
            ("mixup", Float(0.0)),
        ];

        Self {
            params: params
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.params.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Replaces an existing parameter in place, or appends a new one.
    pub fn set(&mut self, key: &str, value: impl Into<ParamValue>) {
        let value = value.into();
        match self.params.iter_mut().find(|(k, _)| k == key) {
            Some((_, slot)) => *slot = value,
            None => {
                debug!(key, %value, "adding training parameter");
                self.params.push((key.to_string(), value));
            }
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn to_cli_args(&self) -> Vec<String> {
        self.iter().map(|(k, v)| format!("{k}={v}")).collect()
    }

    fn str_or<'a>(&'a self, key: &str, fallback: &'a str) -> &'a str {
        self.get(key).and_then(ParamValue::as_str).unwrap_or(fallback)
    }

    pub fn data(&self) -> PathBuf {
        PathBuf::from(self.str_or("data", DEFAULT_DATASET))
    }

    /// `project/name`, where the framework writes the run.
    pub fn run_dir(&self) -> PathBuf {
        Path::new(self.str_or("project", DEFAULT_PROJECT)).join(self.str_or("name", DEFAULT_RUN_NAME))
    }

    pub fn best_weights(&self) -> PathBuf {
        self.run_dir().join("weights").join("best.pt")
    }

    pub fn last_weights(&self) -> PathBuf {
        self.run_dir().join("weights").join("last.pt")
    }
}

/// Default location of the trained detector.
pub fn default_checkpoint() -> PathBuf {
    TrainConfig::defaults().best_weights()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    TfLite,
    Onnx,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::TfLite => "tflite",
            ExportFormat::Onnx => "onnx",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub imgsz: u32,
    pub int8: bool,
    pub half: bool,
    pub optimize: bool,
    pub simplify: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::mobile_float32()
    }
}

impl ExportOptions {
    /// 640x640 float32 TFLite, no quantization.
    pub fn mobile_float32() -> Self {
        Self {
            format: ExportFormat::TfLite,
            imgsz: DEFAULT_IMGSZ,
            int8: false,
            half: false,
            optimize: true,
            simplify: true,
        }
    }

    pub fn with_format(mut self, format: ExportFormat) -> Self {
        self.format = format;
        self
    }

    pub fn precision_label(&self) -> &'static str {
        if self.int8 {
            "int8"
        } else if self.half {
            "float16"
        } else {
            "float32"
        }
    }

    pub fn to_cli_args(&self) -> Vec<String> {
        vec![
            format!("format={}", self.format),
            format!("imgsz={}", self.imgsz),
            format!("int8={}", self.int8),
            format!("half={}", self.half),
            format!("optimize={}", self.optimize),
            format!("simplify={}", self.simplify),
        ]
    }

    /// Where the framework writes the exported file for `checkpoint`.
    pub fn artifact_path(&self, checkpoint: &Path) -> PathBuf {
        let dir = checkpoint.parent().unwrap_or_else(|| Path::new(""));
        let stem = checkpoint
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("model");
        match self.format {
            ExportFormat::TfLite => dir
                .join(format!("{stem}_saved_model"))
                .join(format!("{stem}_{}.tflite", self.precision_label())),
            ExportFormat::Onnx => dir.join(format!("{stem}.onnx")),
        }
    }
}
