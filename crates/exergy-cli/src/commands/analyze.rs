use crate::cli::{AnalyzeArgs, OutputFormat};
use crate::config::{build_engine_config, resolve_config_path};
use crate::error::{CliError, Result};
use crate::output;
use crate::utils::progress::CliProgressHandler;
use exergy::{
    core::{io::observations::ObservationSet, models::region::Region},
    engine::{context::Engine, progress::ProgressReporter},
    workflows::{self, analyze::AnalysisOptions},
};
use tracing::{info, warn};

pub fn run(args: AnalyzeArgs, quiet: bool) -> Result<()> {
    let config_path = resolve_config_path(args.config.as_deref())?;
    let config = build_engine_config(config_path.as_deref(), args.rebound, &args.set_values)?;
    let engine = Engine::new(config);

    info!("Loading observations from {:?}", &args.input);
    let mut observations =
        ObservationSet::load(&args.input).map_err(|e| CliError::FileParsing {
            path: args.input.clone(),
            source: e.into(),
        })?;

    if !args.regions.is_empty() {
        let regions: Vec<Region> = args.regions.iter().map(Region::new).collect();
        observations.retain_regions(&regions);
        if observations.is_empty() {
            return Err(CliError::Argument(format!(
                "No observations match the requested region(s): {}",
                args.regions.join(", ")
            )));
        }
    }
    info!(
        "Loaded {} observation(s) across {} region(s).",
        observations.len(),
        observations.regions().len()
    );

    let options = AnalysisOptions {
        tiers: args.tier.tiers(),
        reconcile: !args.no_reconcile,
        ..AnalysisOptions::default()
    };

    let progress_handler = CliProgressHandler::new(quiet);
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Invoking the core analysis workflow...");
    let report = workflows::analyze::run(&engine, &observations, &options, &reporter)?;

    if !report.issues.is_empty() {
        warn!(
            "Analysis completed with {} consistency issue(s).",
            report.issues.len()
        );
    }

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| CliError::Other(e.into()))?;
            println!("{}", json);
        }
        OutputFormat::Table => print!("{}", output::render_report(&report)),
    }

    Ok(())
}
