mod support;

use std::path::Path;

use anyhow::Result;
use detkit_cli::train::run_training;
use detkit_core::Device;
use detkit_framework::{ComputeDevice, FrameworkError, ParamValue, TrainConfig};
use support::{Call, FixedProbe, Recording};

#[test]
fn full_cycle_on_gpu() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let framework = Recording::new(dir.path());
    let probe = FixedProbe(ComputeDevice {
        device: Device::Cuda { device_id: 0 },
        name: Some("NVIDIA GeForce RTX 3090".to_string()),
    });

    let mut out = Vec::new();
    let outcome = run_training(
        &framework,
        &probe,
        Path::new("yolov8e.pt"),
        TrainConfig::defaults().with("epochs", 3),
        &mut out,
    )?;

    let calls = framework.calls();
    assert_eq!(calls.len(), 4);
    assert_eq!(calls[0], Call::Load("yolov8e.pt".into()));
    let Call::Train(config) = &calls[1] else {
        panic!("expected a train call, got {calls:?}");
    };
    assert_eq!(config.get("device"), Some(&ParamValue::Int(0)));
    assert_eq!(config.get("epochs"), Some(&ParamValue::Int(3)));
    assert_eq!(calls[2], Call::Validate);
    assert!(matches!(&calls[3], Call::Export(opts) if opts.imgsz == 640 && !opts.int8));

    let text = String::from_utf8(out)?;
    assert!(text.contains("Device: cuda:0"));
    assert!(text.contains("GPU: NVIDIA GeForce RTX 3090"));
    assert!(text.contains("    save_period: 10"));
    assert!(text.contains("mAP50: 0.7123"));
    assert!(text.contains("mAP50-95: 0.4568"));
    assert!(text.contains("runs/detect/pepsico_yolov8e/weights/best.pt"));
    assert_eq!(outcome.artifact, dir.path().join("best_float32.tflite"));
    Ok(())
}

#[test]
fn cpu_run_prints_no_gpu_and_overrides_device() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let framework = Recording::new(dir.path());
    let probe = FixedProbe(ComputeDevice::cpu());

    let mut out = Vec::new();
    run_training(
        &framework,
        &probe,
        Path::new("yolov8e.pt"),
        TrainConfig::defaults().with("device", 1),
        &mut out,
    )?;

    let Call::Train(config) = &framework.calls()[1] else {
        panic!("expected a train call");
    };
    assert_eq!(config.get("device"), Some(&ParamValue::Str("cpu".into())));
    let text = String::from_utf8(out)?;
    assert!(text.contains("Device: cpu"));
    assert!(!text.contains("GPU:"));
    Ok(())
}

#[test]
fn export_failure_aborts_training_run() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut framework = Recording::new(dir.path());
    framework.fail_export = true;
    let err = run_training(
        &framework,
        &FixedProbe(ComputeDevice::cpu()),
        Path::new("yolov8e.pt"),
        TrainConfig::defaults(),
        &mut Vec::new(),
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("export failed"));
    Ok(())
}

#[test]
fn training_failure_skips_validation_and_export() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut framework = Recording::new(dir.path());
    framework.fail_train = true;
    let err = run_training(
        &framework,
        &FixedProbe(ComputeDevice::cpu()),
        Path::new("yolov8e.pt"),
        TrainConfig::defaults(),
        &mut Vec::new(),
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("training failed"));

    let calls = framework.calls();
    assert_eq!(calls.len(), 2);
    assert!(matches!(calls[1], Call::Train(_)));
    assert!(!calls.iter().any(|c| matches!(c, Call::Validate | Call::Export(_))));
    Ok(())
}

#[test]
fn missing_metrics_skip_export() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut framework = Recording::new(dir.path());
    framework.fail_validate = true;
    let err = run_training(
        &framework,
        &FixedProbe(ComputeDevice::cpu()),
        Path::new("yolov8e.pt"),
        TrainConfig::defaults(),
        &mut Vec::new(),
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<FrameworkError>(),
        Some(FrameworkError::MissingMetrics)
    ));
    assert!(format!("{err:#}").contains("validation failed"));

    let calls = framework.calls();
    assert_eq!(calls.last(), Some(&Call::Validate));
    assert!(!calls.iter().any(|c| matches!(c, Call::Export(_))));
    Ok(())
}
