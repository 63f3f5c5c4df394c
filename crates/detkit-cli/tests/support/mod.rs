#![allow(dead_code)]

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{bail, Result};
use detkit_framework::{
    ComputeDevice, DetectionFramework, DetectionMetrics, DeviceProbe, ExportOptions,
    FrameworkError, FrameworkModel, Stage, TrainConfig, TrainSummary,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Load(PathBuf),
    Train(TrainConfig),
    Validate,
    Export(ExportOptions),
}

/// Framework double: records every call and writes a small artifact into `out_dir`.
#[derive(Clone)]
pub struct Recording {
    pub calls: Rc<RefCell<Vec<Call>>>,
    pub out_dir: PathBuf,
    pub fail_train: bool,
    pub fail_validate: bool,
    pub fail_export: bool,
}

impl Recording {
    pub fn new(out_dir: &Path) -> Self {
        Self {
            calls: Rc::default(),
            out_dir: out_dir.to_path_buf(),
            fail_train: false,
            fail_validate: false,
            fail_export: false,
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }
}

pub struct RecordingModel {
    rec: Recording,
    checkpoint: PathBuf,
}

impl DetectionFramework for Recording {
    type Model = RecordingModel;

    fn name(&self) -> &'static str {
        "recording"
    }

    fn load(&self, checkpoint: &Path) -> Result<RecordingModel> {
        self.calls.borrow_mut().push(Call::Load(checkpoint.to_path_buf()));
        Ok(RecordingModel {
            rec: self.clone(),
            checkpoint: checkpoint.to_path_buf(),
        })
    }
}

impl FrameworkModel for RecordingModel {
    fn checkpoint(&self) -> &Path {
        &self.checkpoint
    }

    fn train(&mut self, config: &TrainConfig) -> Result<TrainSummary> {
        self.rec.calls.borrow_mut().push(Call::Train(config.clone()));
        if self.rec.fail_train {
            return Err(FrameworkError::MissingArtifact {
                stage: Stage::Train,
                path: config.best_weights(),
            }
            .into());
        }
        self.checkpoint = config.best_weights();
        Ok(TrainSummary {
            run_dir: config.run_dir(),
            best: config.best_weights(),
            last: config.last_weights(),
        })
    }

    fn validate(&mut self) -> Result<DetectionMetrics> {
        self.rec.calls.borrow_mut().push(Call::Validate);
        if self.rec.fail_validate {
            return Err(FrameworkError::MissingMetrics.into());
        }
        Ok(DetectionMetrics {
            precision: 0.9,
            recall: 0.8,
            map50: 0.71234,
            map50_95: 0.45678,
        })
    }

    fn export(&mut self, options: &ExportOptions) -> Result<PathBuf> {
        self.rec.calls.borrow_mut().push(Call::Export(options.clone()));
        if self.rec.fail_export {
            bail!("converter crashed");
        }
        let path = self.rec.out_dir.join("best_float32.tflite");
        std::fs::write(&path, vec![0u8; 3 * 1024 * 1024 / 2])?;
        Ok(path)
    }
}

pub struct FixedProbe(pub ComputeDevice);

impl DeviceProbe for FixedProbe {
    fn probe(&self) -> ComputeDevice {
        self.0.clone()
    }
}
