use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use detkit_core::OutputLayout;
use detkit_framework::{default_checkpoint, ExportFormat, ParamValue};

/// Parses argv, exiting with status 1 on usage errors (0 for `--help`/`--version`).
pub fn parse_or_exit<P: Parser>() -> P {
    match P::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            std::process::exit(code);
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LayoutArg {
    /// [batch, features, detections], as exported by Ultralytics
    #[default]
    FeaturesFirst,
    /// [batch, detections, features]
    DetectionsFirst,
    /// Take the smaller trailing axis as features
    Auto,
}

impl From<LayoutArg> for OutputLayout {
    fn from(value: LayoutArg) -> Self {
        match value {
            LayoutArg::Auto => OutputLayout::Auto,
            LayoutArg::FeaturesFirst => OutputLayout::FeaturesFirst,
            LayoutArg::DetectionsFirst => OutputLayout::DetectionsFirst,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormatArg {
    #[default]
    Tflite,
    Onnx,
}

impl From<ExportFormatArg> for ExportFormat {
    fn from(value: ExportFormatArg) -> Self {
        match value {
            ExportFormatArg::Tflite => ExportFormat::TfLite,
            ExportFormatArg::Onnx => ExportFormat::Onnx,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "inspect_model",
    version,
    about = "Print a model's tensors and the detector constants the mobile app needs"
)]
pub struct InspectArgs {
    /// Model file (.tflite, or .onnx with the `onnx` feature)
    pub model: PathBuf,

    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Axis order of the detector output
    #[arg(long, value_enum, default_value_t = LayoutArg::FeaturesFirst)]
    pub layout: LayoutArg,

    /// Log level (RUST_LOG overrides)
    #[arg(long, default_value = "info")]
    pub log: String,
}

#[derive(Parser, Debug)]
#[command(
    name = "export_tflite",
    version,
    about = "Export a trained checkpoint to a 640x640 float32 mobile model"
)]
pub struct ExportArgs {
    /// Trained checkpoint [default: runs/detect/pepsico_yolov8e/weights/best.pt]
    pub checkpoint: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = ExportFormatArg::Tflite)]
    pub format: ExportFormatArg,

    /// Framework executable (overrides the config file)
    #[arg(long)]
    pub yolo_bin: Option<PathBuf>,

    /// Log level (RUST_LOG overrides)
    #[arg(long, default_value = "info")]
    pub log: String,
}

impl ExportArgs {
    pub fn checkpoint_or_default(&self) -> PathBuf {
        self.checkpoint.clone().unwrap_or_else(default_checkpoint)
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "train_detector",
    version,
    about = "Train, validate and export the product detector"
)]
pub struct TrainArgs {
    /// TOML config file (else $DETKIT_CONFIG, else ./detkit.toml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override a training parameter, e.g. --set epochs=50
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub overrides: Vec<(String, ParamValue)>,

    /// Pretrained checkpoint to start from
    #[arg(long, default_value = "yolov8e.pt")]
    pub base_model: PathBuf,

    /// Framework executable (overrides the config file)
    #[arg(long)]
    pub yolo_bin: Option<PathBuf>,

    /// Log level (RUST_LOG overrides)
    #[arg(long, default_value = "info")]
    pub log: String,
}

fn parse_key_val(raw: &str) -> Result<(String, ParamValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in `{raw}`"));
    }
    Ok((key.to_string(), ParamValue::parse_literal(value)))
}
