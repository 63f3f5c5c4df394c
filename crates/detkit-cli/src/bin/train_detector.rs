use anyhow::Result;
use detkit_cli::cli::{parse_or_exit, TrainArgs};
use detkit_cli::config::ToolConfig;
use detkit_cli::logging;
use detkit_cli::train::run_training;
use detkit_framework::{platform_probe, TrainConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let args: TrainArgs = parse_or_exit();
    logging::init(&args.log);

    let file = ToolConfig::load(args.config.as_deref())?;
    let mut config = TrainConfig::defaults();
    file.apply(&mut config);
    for (key, value) in args.overrides {
        config.set(&key, value);
    }

    let framework = file.framework(args.yolo_bin.as_deref());
    let probe = platform_probe();
    run_training(
        &framework,
        probe.as_ref(),
        &args.base_model,
        config,
        &mut std::io::stdout(),
    )?;
    Ok(())
}
