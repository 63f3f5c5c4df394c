use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use detkit_framework::{DetectionFramework, ExportFormat, ExportOptions, FrameworkModel};
use tracing::info;

use crate::RULE;

const MIB: f64 = 1024.0 * 1024.0;

/// Size of `path` in MiB.
pub fn file_size_mib(path: &Path) -> Result<f64> {
    let meta = std::fs::metadata(path)
        .with_context(|| format!("failed to stat exported model {}", path.display()))?;
    Ok(meta.len() as f64 / MIB)
}

/// Loads `checkpoint` and exports it, reporting progress to `out`.
pub fn run_export<F, W>(
    framework: &F,
    checkpoint: &Path,
    options: &ExportOptions,
    out: &mut W,
) -> Result<PathBuf>
where
    F: DetectionFramework,
    W: Write,
{
    writeln!(out, "{RULE}")?;
    writeln!(out, "EXPORTING MODEL TO {}", options.format.as_str().to_uppercase())?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "\nLoading checkpoint: {}", checkpoint.display())?;
    let mut model = framework
        .load(checkpoint)
        .with_context(|| format!("failed to load checkpoint {}", checkpoint.display()))?;

    writeln!(out, "\nExporting with {}...", framework.name())?;
    writeln!(
        out,
        "    - Format: {} ({})",
        options.format,
        options.precision_label()
    )?;
    writeln!(out, "    - Input size: {0}x{0}", options.imgsz)?;
    writeln!(
        out,
        "    - Optimization: {}",
        if options.optimize { "on" } else { "off" }
    )?;
    out.flush()?;

    let artifact = model
        .export(options)
        .with_context(|| format!("export of {} failed", checkpoint.display()))?;
    let size = file_size_mib(&artifact)?;
    info!(artifact = %artifact.display(), size_mib = size, "exported model");

    writeln!(out, "\nExport complete: {}", artifact.display())?;
    writeln!(out, "File size: {size:.2} MiB")?;
    write_next_steps(out, &artifact, options.format)?;
    Ok(artifact)
}

/// Hints printed after every successful export.
pub fn write_next_steps<W: Write>(out: &mut W, artifact: &Path, format: ExportFormat) -> Result<()> {
    writeln!(out, "\n{RULE}")?;
    writeln!(out, "NEXT STEPS:")?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "1. Inspect the model:")?;
    writeln!(out, "   inspect_model {}", artifact.display())?;
    if format == ExportFormat::TfLite {
        writeln!(out, "\n2. Copy it into the Android app:")?;
        writeln!(
            out,
            "   cp {} app/src/main/assets/best_float32.tflite",
            artifact.display()
        )?;
    }
    writeln!(out, "{RULE}")?;
    Ok(())
}
