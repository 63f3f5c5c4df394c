use anyhow::Result;
use detkit_cli::cli::{parse_or_exit, InspectArgs, ReportFormat};
use detkit_cli::inspect::InspectReport;
use detkit_cli::{logging, registry};

fn main() -> Result<()> {
    let args: InspectArgs = parse_or_exit();
    logging::init(&args.log);

    let spec = registry::load_spec(&args.model)?;
    let report = InspectReport::new(&args.model, spec, args.layout.into());
    match args.format {
        ReportFormat::Text => print!("{}", report.render_text()),
        ReportFormat::Json => println!("{}", report.to_json()?),
    }
    Ok(())
}
