//! Detector constants derived from a model's tensor shapes.
//!
//! YOLO-style detectors export a single output of shape `[batch, 4 + classes, candidates]`
//! (features-first) or, with some converters, `[batch, candidates, 4 + classes]`. The mobile
//! app needs both sizes plus the input resolution baked in as integer constants.

use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use serde::Serialize;
use tracing::{debug, warn};

use crate::TensorSpec;

/// Box coordinates (cx, cy, w, h) leading every candidate's feature vector.
pub const BBOX_COORDS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DetectorConstants {
    pub input_size: usize,
    pub max_detection: usize,
    pub output_features: usize,
    pub output_classes: usize,
}

/// Axis order of a rank-3 detector output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputLayout {
    /// `[batch, features, detections]`, what Ultralytics exports.
    #[default]
    FeaturesFirst,
    /// `[batch, detections, features]`
    DetectionsFirst,
    /// Treat the smaller trailing axis as the feature axis. Opt-in only.
    Auto,
}

impl OutputLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputLayout::FeaturesFirst => "features-first",
            OutputLayout::DetectionsFirst => "detections-first",
            OutputLayout::Auto => "auto",
        }
    }
}

impl fmt::Display for OutputLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputLayout {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "features-first" => Ok(OutputLayout::FeaturesFirst),
            "detections-first" => Ok(OutputLayout::DetectionsFirst),
            "auto" => Ok(OutputLayout::Auto),
            other => bail!(
                "unknown output layout: {other} (expected features-first, detections-first or auto)"
            ),
        }
    }
}

/// Why no detector constants could be derived.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConstantsSkip {
    NoOutput,
    OutputRank { rank: usize, shape: String },
    DynamicOutput { shape: String },
    FeatureAxisTooSmall { features: usize },
    NoInputSize,
}

impl fmt::Display for ConstantsSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantsSkip::NoOutput => f.write_str("model has no outputs"),
            ConstantsSkip::OutputRank { rank, shape } => write!(
                f,
                "output has rank {rank} (shape {shape}); expected [1, features, detections]"
            ),
            ConstantsSkip::DynamicOutput { shape } => {
                write!(f, "output shape {shape} has dynamic axes")
            }
            ConstantsSkip::FeatureAxisTooSmall { features } => write!(
                f,
                "feature axis of {features} cannot hold {BBOX_COORDS} box coordinates"
            ),
            ConstantsSkip::NoInputSize => f.write_str("input size is missing or dynamic"),
        }
    }
}

/// Square input resolution: axis 1 of the first input, as for NHWC `[1, H, W, C]`.
pub fn input_size(inputs: &[TensorSpec]) -> Option<usize> {
    let input = inputs.first()?;
    if looks_channels_first(input) {
        warn!(
            name = %input.name,
            shape = %input.shape_display(),
            "input looks channels-first; INPUT_SIZE is read from axis 1 regardless"
        );
    }
    input.dim(1)
}

/// `[1, C, H, W]` with a colour-sized axis 1 and an image-sized axis 3.
pub fn looks_channels_first(input: &TensorSpec) -> bool {
    input.rank == 4
        && matches!(
            (input.dim(1), input.dim(3)),
            (Some(c), Some(w)) if c <= 4 && w > 4
        )
}

/// Derives the four detector constants from the first input and first output.
pub fn derive_constants(
    inputs: &[TensorSpec],
    outputs: &[TensorSpec],
    layout: OutputLayout,
) -> Option<DetectorConstants> {
    match try_derive_constants(inputs, outputs, layout) {
        Ok(constants) => Some(constants),
        Err(skip) => {
            debug!(reason = %skip, "skipping detector constants");
            None
        }
    }
}

/// Like [`derive_constants`], but says why nothing could be derived.
pub fn try_derive_constants(
    inputs: &[TensorSpec],
    outputs: &[TensorSpec],
    layout: OutputLayout,
) -> Result<DetectorConstants, ConstantsSkip> {
    let output = outputs.first().ok_or(ConstantsSkip::NoOutput)?;
    if output.rank != 3 {
        return Err(ConstantsSkip::OutputRank {
            rank: output.rank,
            shape: output.shape_display(),
        });
    }
    let (Some(a), Some(b)) = (output.dim(1), output.dim(2)) else {
        return Err(ConstantsSkip::DynamicOutput {
            shape: output.shape_display(),
        });
    };
    let (output_features, max_detection) = match layout {
        OutputLayout::FeaturesFirst => {
            if a > b {
                warn!(
                    name = %output.name,
                    shape = %output.shape_display(),
                    "feature axis is larger than the detection axis; pass --layout detections-first if the export is transposed"
                );
            }
            (a, b)
        }
        OutputLayout::DetectionsFirst => (b, a),
        OutputLayout::Auto if a <= b => (a, b),
        OutputLayout::Auto => {
            warn!(
                name = %output.name,
                shape = %output.shape_display(),
                "output looks detections-first; swapping axes"
            );
            (b, a)
        }
    };
    let output_classes = output_features
        .checked_sub(BBOX_COORDS)
        .ok_or(ConstantsSkip::FeatureAxisTooSmall {
            features: output_features,
        })?;

    Ok(DetectorConstants {
        input_size: input_size(inputs).ok_or(ConstantsSkip::NoInputSize)?,
        max_detection,
        output_features,
        output_classes,
    })
}
