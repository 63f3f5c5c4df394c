use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Result;
use detkit_core::Device;
use tracing::{info, warn};

use crate::config::{ExportOptions, ParamValue, TrainConfig};
use crate::error::{FrameworkError, Stage};
use crate::metrics::{parse_val_summary, DetectionMetrics};
use crate::process::{block_on, run_streaming, ProcessOutput};
use crate::{DetectionFramework, FrameworkModel, TrainSummary};

/// Drives the `yolo` command line.
#[derive(Clone, Debug)]
pub struct UltralyticsCli {
    program: PathBuf,
    program_args: Vec<String>,
}

impl UltralyticsCli {
    pub fn new() -> Self {
        Self::with_program("yolo")
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            program_args: Vec::new(),
        }
    }

    /// Arguments placed before the subcommand, e.g. `-m ultralytics` for a Python launcher.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.program_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn run(&self, stage: Stage, args: Vec<String>) -> Result<ProcessOutput, FrameworkError> {
        let mut argv: Vec<OsString> = self.program_args.iter().map(OsString::from).collect();
        argv.extend(args.into_iter().map(OsString::from));
        info!(
            %stage,
            program = %self.program.display(),
            args = argv.len(),
            "running framework"
        );

        let output = block_on(run_streaming(self.program.as_os_str(), &argv))??;
        if !output.status.success() {
            return Err(FrameworkError::Exit {
                stage,
                program: self.program.display().to_string(),
                status: output.status,
            });
        }
        Ok(output)
    }
}

impl Default for UltralyticsCli {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionFramework for UltralyticsCli {
    type Model = UltralyticsModel;

    fn name(&self) -> &'static str {
        "ultralytics"
    }

    fn load(&self, checkpoint: &Path) -> Result<Self::Model> {
        if !checkpoint.exists() {
            // The framework downloads released weights by name.
            warn!(checkpoint = %checkpoint.display(), "checkpoint not found locally");
        }
        Ok(UltralyticsModel {
            cli: self.clone(),
            checkpoint: checkpoint.to_path_buf(),
            trained_with: None,
        })
    }
}

pub struct UltralyticsModel {
    cli: UltralyticsCli,
    checkpoint: PathBuf,
    trained_with: Option<TrainConfig>,
}

impl FrameworkModel for UltralyticsModel {
    fn checkpoint(&self) -> &Path {
        &self.checkpoint
    }

    fn train(&mut self, config: &TrainConfig) -> Result<TrainSummary> {
        let mut args = vec![
            "detect".to_string(),
            "train".to_string(),
            format!("model={}", self.checkpoint.display()),
        ];
        args.extend(config.to_cli_args());
        self.cli.run(Stage::Train, args)?;

        let summary = TrainSummary {
            run_dir: config.run_dir(),
            best: config.best_weights(),
            last: config.last_weights(),
        };
        if !summary.best.exists() {
            return Err(FrameworkError::MissingArtifact {
                stage: Stage::Train,
                path: summary.best,
            }
            .into());
        }
        info!(best = %summary.best.display(), "training finished");
        self.checkpoint = summary.best.clone();
        self.trained_with = Some(config.clone());
        Ok(summary)
    }

    fn validate(&mut self) -> Result<DetectionMetrics> {
        let config = self.trained_with.as_ref().ok_or(FrameworkError::NotTrained)?;
        let mut args = vec![
            "detect".to_string(),
            "val".to_string(),
            format!("model={}", self.checkpoint.display()),
        ];
        for key in ["data", "imgsz", "batch", "device"] {
            if let Some(value) = config.get(key) {
                args.push(format!("{key}={value}"));
            }
        }

        let output = self.cli.run(Stage::Validate, args)?;
        let metrics = parse_val_summary(&output.stdout).ok_or(FrameworkError::MissingMetrics)?;
        info!(
            map50 = metrics.map50,
            map50_95 = metrics.map50_95,
            "validation finished"
        );
        Ok(metrics)
    }

    fn export(&mut self, options: &ExportOptions) -> Result<PathBuf> {
        let mut args = vec![
            "export".to_string(),
            format!("model={}", self.checkpoint.display()),
        ];
        args.extend(options.to_cli_args());
        self.cli.run(Stage::Export, args)?;

        let artifact = options.artifact_path(&self.checkpoint);
        if !artifact.exists() {
            return Err(FrameworkError::MissingArtifact {
                stage: Stage::Export,
                path: artifact,
            }
            .into());
        }
        info!(artifact = %artifact.display(), "export finished");
        Ok(artifact)
    }
}

/// The framework's `device=` spelling: `cpu`, or the bare CUDA ordinal.
pub fn device_arg(device: &Device) -> ParamValue {
    match device {
        Device::Cpu => ParamValue::from("cpu"),
        Device::Cuda { device_id } => ParamValue::Int(i64::from(*device_id)),
    }
}
