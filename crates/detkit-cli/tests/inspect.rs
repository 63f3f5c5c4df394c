use std::path::Path;
use std::process::Command;

use anyhow::Result;
use detkit_backend_tflite::fixture::{ModelBuilder, TensorDef};
use detkit_backend_tflite::parse_model_spec;
use detkit_cli::inspect::InspectReport;
use detkit_core::OutputLayout;

fn report(builder: ModelBuilder, layout: OutputLayout) -> Result<InspectReport> {
    let spec = parse_model_spec(&builder.build())?;
    Ok(InspectReport::new(Path::new("best_float32.tflite"), spec, layout))
}

fn yolov8(output: &[i32]) -> ModelBuilder {
    ModelBuilder::new()
        .input(TensorDef::new("serving_default_images:0", &[1, 640, 640, 3]))
        .output(TensorDef::new("PartitionedCall:0", output))
}

#[test]
fn yolov8_report_lists_constants() -> Result<()> {
    let text = report(yolov8(&[1, 84, 8400]), OutputLayout::default())?.render_text();
    assert!(text.contains("TFLITE MODEL INFO"));
    assert!(text.contains("  [0] Name: serving_default_images:0"));
    assert!(text.contains("      Shape: [1, 640, 640, 3]"));
    assert!(text.contains("      Dtype: float32"));
    assert!(text.contains("   INPUT_SIZE = 640\n"));
    assert!(text.contains("   MAX_DETECTION = 8400\n"));
    assert!(text.contains("   OUTPUT_FEATURES = 84\n"));
    assert!(text.contains("   OUTPUT_CLASSES = 80  // features - 4 (bbox coords)\n"));
    assert!(text.contains("NEXT STEPS"));
    Ok(())
}

#[test]
fn detections_first_output_gives_same_constants() -> Result<()> {
    let a = report(yolov8(&[1, 84, 8400]), OutputLayout::Auto)?;
    let b = report(yolov8(&[1, 8400, 84]), OutputLayout::Auto)?;
    assert_eq!(a.constants, b.constants);
    assert!(b.render_text().contains("   OUTPUT_CLASSES = 80"));
    Ok(())
}

#[test]
fn default_layout_reads_features_then_detections() -> Result<()> {
    let builder = ModelBuilder::new()
        .input(TensorDef::new("images", &[1, 160, 160, 3]))
        .output(TensorDef::new("output0", &[1, 605, 525]));
    let report = report(builder, OutputLayout::default())?;
    let c = report.constants.expect("constants");
    assert_eq!(c.input_size, 160);
    assert_eq!(c.output_features, 605);
    assert_eq!(c.max_detection, 525);
    assert_eq!(c.output_classes, 601);
    assert_eq!(report.layout, "features-first");
    Ok(())
}

#[test]
fn missing_input_is_named_as_the_reason() -> Result<()> {
    let builder =
        ModelBuilder::new().output(TensorDef::new("PartitionedCall:0", &[1, 84, 8400]));
    let report = report(builder, OutputLayout::default())?;
    let text = report.render_text();
    assert!(report.constants.is_none());
    assert!(text.contains("no detector constants: input size is missing or dynamic"));
    assert!(!text.contains("expected [1, features, detections]"));
    Ok(())
}

#[test]
fn channels_first_input_is_flagged_but_reads_axis_one() -> Result<()> {
    let builder = ModelBuilder::new()
        .input(TensorDef::new("images", &[1, 3, 640, 640]))
        .output(TensorDef::new("output0", &[1, 84, 8400]));
    let report = report(builder, OutputLayout::default())?;
    assert!(report.channels_first);
    assert_eq!(report.input_size, Some(3));
    assert!(report
        .render_text()
        .contains("INPUT_SIZE = 3  // input looks [1, C, H, W]"));
    Ok(())
}

#[test]
fn rank_two_output_prints_only_input_size() -> Result<()> {
    let text = report(yolov8(&[1, 1000]), OutputLayout::default())?.render_text();
    assert!(text.contains("   INPUT_SIZE = 640"));
    assert!(text.contains("      Shape: [1, 1000]"));
    assert!(!text.contains("MAX_DETECTION"));
    assert!(!text.contains("OUTPUT_FEATURES"));
    assert!(!text.contains("OUTPUT_CLASSES"));
    assert!(text.contains("output has rank 2 (shape [1, 1000])"));
    Ok(())
}

#[test]
fn model_without_outputs_has_no_constants() -> Result<()> {
    let builder = ModelBuilder::new().input(TensorDef::new("images", &[1, 640, 640, 3]));
    let report = report(builder, OutputLayout::default())?;
    let text = report.render_text();
    assert!(text.contains("OUTPUTS:\n  (none)"));
    assert!(!text.contains("INPUT_SIZE"));
    assert!(report.input_size.is_none());
    assert!(report.constants.is_none());
    Ok(())
}

#[test]
fn json_report_carries_spec_and_constants() -> Result<()> {
    let json = report(yolov8(&[1, 84, 8400]), OutputLayout::FeaturesFirst)?.to_json()?;
    let value: serde_json::Value = serde_json::from_str(&json)?;
    assert_eq!(value["layout"], "features-first");
    assert_eq!(value["constants"]["output_classes"], 80);
    assert_eq!(value["constants"]["input_size"], 640);
    assert_eq!(value["model"]["outputs"][0]["dims"][2], 8400);
    assert_eq!(value["model"]["inputs"][0]["dtype"], "float32");
    Ok(())
}

#[test]
fn binary_without_arguments_prints_usage() -> Result<()> {
    let output = Command::new(env!("CARGO_BIN_EXE_inspect_model")).output()?;
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage: inspect_model"));
    assert!(output.stdout.is_empty());
    Ok(())
}

#[test]
fn binary_inspects_a_model_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("best_float32.tflite");
    std::fs::write(&path, yolov8(&[1, 84, 8400]).build())?;

    let output = Command::new(env!("CARGO_BIN_EXE_inspect_model"))
        .arg(&path)
        .env("RUST_LOG", "off")
        .output()?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("INPUT_SIZE = 640"));
    assert!(stdout.contains("OUTPUT_CLASSES = 80"));
    Ok(())
}

#[test]
fn binary_fails_on_unreadable_model() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("broken.tflite");
    std::fs::write(&path, b"definitely not a flatbuffer")?;

    let output = Command::new(env!("CARGO_BIN_EXE_inspect_model"))
        .arg(&path)
        .env("RUST_LOG", "off")
        .output()?;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("broken.tflite"));
    Ok(())
}

#[test]
fn binary_inspects_a_model_without_extension() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("best_float32");
    std::fs::write(&path, yolov8(&[1, 84, 8400]).build())?;

    let output = Command::new(env!("CARGO_BIN_EXE_inspect_model"))
        .arg(&path)
        .env("RUST_LOG", "off")
        .output()?;
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("MAX_DETECTION = 8400"));
    Ok(())
}
