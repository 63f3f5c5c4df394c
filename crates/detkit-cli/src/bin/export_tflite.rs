use anyhow::Result;
use detkit_cli::cli::{parse_or_exit, ExportArgs};
use detkit_cli::config::ToolConfig;
use detkit_cli::export::run_export;
use detkit_cli::logging;
use detkit_framework::ExportOptions;

#[tokio::main]
async fn main() -> Result<()> {
    let args: ExportArgs = parse_or_exit();
    logging::init(&args.log);

    let config = ToolConfig::load(None)?;
    let framework = config.framework(args.yolo_bin.as_deref());
    let options = ExportOptions::mobile_float32().with_format(args.format.into());

    run_export(
        &framework,
        &args.checkpoint_or_default(),
        &options,
        &mut std::io::stdout(),
    )?;
    Ok(())
}
