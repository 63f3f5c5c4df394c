//! Inspector report: tensor listing plus the constants the Android detector is built with.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Result;
use detkit_core::{
    input_size, looks_channels_first, try_derive_constants, DetectorConstants, ModelSpec,
    OutputLayout, TensorSpec, BBOX_COORDS,
};
use serde::Serialize;

use crate::RULE;

#[derive(Debug, Serialize)]
pub struct InspectReport {
    pub path: PathBuf,
    pub layout: &'static str,
    pub model: ModelSpec,
    /// Present whenever the model has at least one output and a readable input size.
    pub input_size: Option<usize>,
    /// The input is `[1, C, H, W]`-like, so axis 1 is probably channels.
    pub channels_first: bool,
    pub constants: Option<DetectorConstants>,
    pub skip_reason: Option<String>,
}

impl InspectReport {
    pub fn new(path: &Path, model: ModelSpec, layout: OutputLayout) -> Self {
        let derived = try_derive_constants(&model.inputs, &model.outputs, layout);
        let input_size = match &derived {
            Ok(c) => Some(c.input_size),
            Err(_) if model.outputs.is_empty() => None,
            Err(_) => input_size(&model.inputs),
        };
        let channels_first = model.inputs.first().is_some_and(looks_channels_first);
        let (constants, skip_reason) = match derived {
            Ok(c) => (Some(c), None),
            Err(skip) => (None, Some(skip.to_string())),
        };
        Self {
            path: path.to_path_buf(),
            layout: layout.as_str(),
            model,
            input_size,
            channels_first,
            constants,
            skip_reason,
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = self.write_text(&mut out);
        out
    }

    fn write_text(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "{RULE}")?;
        writeln!(out, "{} MODEL INFO", self.model.format.to_uppercase())?;
        writeln!(out, "{RULE}")?;
        writeln!(out, "File: {}", self.path.display())?;
        if let Some(version) = self.model.version {
            writeln!(out, "Schema version: {version}")?;
        }
        if let Some(description) = self.model.description.as_deref().filter(|d| !d.is_empty()) {
            writeln!(out, "Description: {description}")?;
        }

        writeln!(out, "\nINPUTS:")?;
        write_tensors(out, &self.model.inputs)?;
        writeln!(out, "\nOUTPUTS:")?;
        write_tensors(out, &self.model.outputs)?;
        writeln!(out, "\n{RULE}")?;

        if self.model.outputs.is_empty() {
            return Ok(());
        }
        writeln!(out, "\nDETECTOR CONSTANTS (YoloDetectorTFLite.kt):")?;
        match self.input_size {
            Some(size) if self.channels_first => writeln!(
                out,
                "   INPUT_SIZE = {size}  // input looks [1, C, H, W]; axis 1 may be channels"
            )?,
            Some(size) => writeln!(out, "   INPUT_SIZE = {size}")?,
            None => writeln!(out, "   INPUT_SIZE = ?  // input height is dynamic or missing")?,
        }
        match &self.constants {
            Some(c) => {
                writeln!(out, "   MAX_DETECTION = {}", c.max_detection)?;
                writeln!(out, "   OUTPUT_FEATURES = {}", c.output_features)?;
                writeln!(
                    out,
                    "   OUTPUT_CLASSES = {}  // features - {BBOX_COORDS} (bbox coords)",
                    c.output_classes
                )?;
            }
            None => {
                let reason = self.skip_reason.as_deref().unwrap_or("unknown");
                writeln!(out, "   (no detector constants: {reason})")?;
            }
        }
        writeln!(out, "{RULE}")?;
        if self.constants.is_some() {
            writeln!(out, "\nNEXT STEPS:")?;
            writeln!(out, "   Copy the constants above into YoloDetectorTFLite.kt")?;
            writeln!(
                out,
                "   cp {} app/src/main/assets/best_float32.tflite",
                self.path.display()
            )?;
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn write_tensors(out: &mut String, tensors: &[TensorSpec]) -> std::fmt::Result {
    if tensors.is_empty() {
        return writeln!(out, "  (none)");
    }
    for (i, tensor) in tensors.iter().enumerate() {
        writeln!(out, "  [{i}] Name: {}", tensor.name)?;
        writeln!(out, "      Shape: {}", tensor.shape_display())?;
        writeln!(out, "      Dtype: {}", tensor.dtype)?;
    }
    Ok(())
}
