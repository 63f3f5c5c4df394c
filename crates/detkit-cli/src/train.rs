use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use detkit_framework::{
    device_arg, DetectionFramework, DetectionMetrics, DeviceProbe, ExportOptions, FrameworkModel,
    TrainConfig, TrainSummary,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::export::{file_size_mib, write_next_steps};
use crate::RULE;

#[derive(Debug, Serialize)]
pub struct TrainOutcome {
    pub summary: TrainSummary,
    pub metrics: DetectionMetrics,
    pub artifact: PathBuf,
}

/// Probe, train, validate, export. Any failing step aborts the run.
///
/// The probed device always replaces whatever `device` the config carries.
pub fn run_training<F, W>(
    framework: &F,
    probe: &dyn DeviceProbe,
    base_model: &Path,
    mut config: TrainConfig,
    out: &mut W,
) -> Result<TrainOutcome>
where
    F: DetectionFramework,
    W: Write,
{
    writeln!(out, "{RULE}")?;
    writeln!(out, "YOLOV8e TRAINING - PRODUCT DETECTOR")?;
    writeln!(out, "{RULE}")?;

    let device = probe.probe();
    writeln!(out, "\nDevice: {}", device.device)?;
    if let Some(name) = &device.name {
        writeln!(out, "    GPU: {name}")?;
    }
    if let Some(requested) = config.get("device").filter(|v| v.as_str() != Some("cpu")) {
        warn!(%requested, probed = %device.device, "ignoring configured device");
    }
    config.set("device", device_arg(&device.device));

    writeln!(out, "\nLoading pretrained model {}...", base_model.display())?;
    let mut model = framework
        .load(base_model)
        .with_context(|| format!("failed to load base model {}", base_model.display()))?;

    writeln!(out, "\nTraining configuration:")?;
    for (key, value) in config.iter() {
        writeln!(out, "    {key}: {value}")?;
    }

    writeln!(out, "\nStarting training...\n")?;
    out.flush()?;
    let summary = model.train(&config).context("training failed")?;
    writeln!(out, "\nTraining complete!")?;
    writeln!(out, "Best weights: {}", summary.best.display())?;

    writeln!(out, "\nValidating model...")?;
    out.flush()?;
    let metrics = model.validate().context("validation failed")?;
    writeln!(out, "\nFinal metrics:")?;
    writeln!(out, "    mAP50: {:.4}", metrics.map50)?;
    writeln!(out, "    mAP50-95: {:.4}", metrics.map50_95)?;

    writeln!(out, "\nExporting to TFLite...")?;
    out.flush()?;
    let options = ExportOptions::mobile_float32();
    let artifact = model.export(&options).context("export failed")?;
    writeln!(out, "TFLite model exported: {}", artifact.display())?;
    writeln!(out, "File size: {:.2} MiB", file_size_mib(&artifact)?)?;
    write_next_steps(out, &artifact, options.format)?;

    info!(
        best = %summary.best.display(),
        map50 = metrics.map50,
        artifact = %artifact.display(),
        "training run finished"
    );
    Ok(TrainOutcome {
        summary,
        metrics,
        artifact,
    })
}
