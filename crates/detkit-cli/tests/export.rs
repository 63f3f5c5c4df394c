mod support;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use detkit_cli::cli::ExportArgs;
use detkit_cli::export::run_export;
use detkit_framework::{ExportFormat, ExportOptions};
use support::{Call, Recording};

#[test]
fn exporter_defaults_to_trained_weights_and_mobile_settings() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let framework = Recording::new(dir.path());
    let args = ExportArgs::try_parse_from(["export_tflite"])?;
    let options = ExportOptions::mobile_float32().with_format(args.format.into());

    let mut out = Vec::new();
    let artifact = run_export(&framework, &args.checkpoint_or_default(), &options, &mut out)?;

    let calls = framework.calls();
    assert_eq!(
        calls[0],
        Call::Load(PathBuf::from("runs/detect/pepsico_yolov8e/weights/best.pt"))
    );
    let Call::Export(recorded) = &calls[1] else {
        panic!("expected an export call, got {calls:?}");
    };
    assert_eq!(recorded.format, ExportFormat::TfLite);
    assert_eq!(recorded.imgsz, 640);
    assert!(!recorded.int8);
    assert!(!recorded.half);
    assert!(recorded.optimize);

    let text = String::from_utf8(out)?;
    assert!(text.contains(&format!("Export complete: {}", artifact.display())));
    assert!(text.contains("File size: 1.50 MiB"));
    assert!(text.contains("app/src/main/assets/best_float32.tflite"));
    Ok(())
}

#[test]
fn explicit_checkpoint_is_used() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let framework = Recording::new(dir.path());
    let args = ExportArgs::try_parse_from(["export_tflite", "weights/last.pt"])?;
    run_export(
        &framework,
        &args.checkpoint_or_default(),
        &ExportOptions::default(),
        &mut Vec::new(),
    )?;
    assert_eq!(framework.calls()[0], Call::Load(PathBuf::from("weights/last.pt")));
    Ok(())
}

#[test]
fn export_failure_is_fatal() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut framework = Recording::new(dir.path());
    framework.fail_export = true;
    let err = run_export(
        &framework,
        &PathBuf::from("best.pt"),
        &ExportOptions::default(),
        &mut Vec::new(),
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("converter crashed"));
    Ok(())
}
