//! Seam between detkit and the external detector training framework.
//!
//! Training, validation and export are delegated; this crate owns the parameters we pass,
//! where the framework leaves its files, and what we read back.

pub mod config;
pub mod device;
pub mod error;
pub mod metrics;
pub mod process;
pub mod ultralytics;

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;

pub use config::{default_checkpoint, ExportFormat, ExportOptions, ParamValue, TrainConfig};
pub use device::{platform_probe, ComputeDevice, CpuOnlyProbe, DeviceProbe, NvidiaSmiProbe};
pub use error::{FrameworkError, Stage};
pub use metrics::{parse_val_summary, DetectionMetrics};
pub use ultralytics::{device_arg, UltralyticsCli, UltralyticsModel};

/// Where a finished training run left its weights.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TrainSummary {
    pub run_dir: PathBuf,
    pub best: PathBuf,
    pub last: PathBuf,
}

pub trait DetectionFramework {
    type Model: FrameworkModel;

    fn name(&self) -> &'static str;

    /// Opens `checkpoint`. Bare names such as `yolov8e.pt` may be fetched by the framework.
    fn load(&self, checkpoint: &Path) -> Result<Self::Model>;
}

pub trait FrameworkModel {
    fn checkpoint(&self) -> &Path;

    /// Trains in place; afterwards the model refers to the run's best weights.
    fn train(&mut self, config: &TrainConfig) -> Result<TrainSummary>;

    fn validate(&mut self) -> Result<DetectionMetrics>;

    /// Returns the path of the written artifact.
    fn export(&mut self, options: &ExportOptions) -> Result<PathBuf>;
}
