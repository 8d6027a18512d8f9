use crate::cli::{OutputFormat, ValidateArgs};
use crate::config::{build_engine_config, resolve_config_path};
use crate::error::{CliError, Result};
use exergy::{
    core::models::{region::Region, source::EnergySource},
    engine::context::Engine,
};
use serde::Serialize;
use std::fmt::Write;
use tracing::{error, info};

/// Coefficients applied to one unit of primary energy for a single source.
#[derive(Debug, Serialize)]
struct SourceCoefficients {
    source: EnergySource,
    efficiency: f64,
    rebound_rate: f64,
    exergy_factor: f64,
    useful_per_primary: f64,
    services_per_primary: f64,
}

pub fn run(args: ValidateArgs) -> Result<()> {
    let config_path = resolve_config_path(args.config.as_deref())?;
    let config = build_engine_config(config_path.as_deref(), None, &[])?;
    let engine = Engine::new(config);
    let region = Region::new(args.region.as_str());
    info!(
        "Coefficient tables are valid. Resolving every source for {}/{}.",
        region, args.year
    );

    let (rows, failures) = resolve_all(&engine, &region, args.year);

    match args.format {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&rows).map_err(|e| CliError::Other(e.into()))?;
            println!("{}", json);
        }
        OutputFormat::Table => print!("{}", render(&rows)),
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(CliError::Config(format!(
            "{} source(s) could not be resolved: {}",
            failures.len(),
            failures.join("; ")
        )))
    }
}

fn resolve_all(
    engine: &Engine,
    region: &Region,
    year: i32,
) -> (Vec<SourceCoefficients>, Vec<String>) {
    let calculator = engine.tiers();
    let mut rows = Vec::with_capacity(EnergySource::ALL.len());
    let mut failures = Vec::new();

    for source in EnergySource::ALL {
        match calculator.compute_tiers(region, year, source, 1.0) {
            Ok(record) => rows.push(SourceCoefficients {
                source,
                efficiency: record.efficiency,
                rebound_rate: record.rebound_rate,
                exergy_factor: record.exergy_factor,
                useful_per_primary: record.useful,
                services_per_primary: record.services,
            }),
            Err(e) => {
                error!("Failed to resolve coefficients for {}: {}", source, e);
                failures.push(format!("{}: {}", source, e));
            }
        }
    }
    (rows, failures)
}

fn render(rows: &[SourceCoefficients]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<10} {:>10} {:>8} {:>8} {:>8} {:>9}",
        "Source", "Efficiency", "Rebound", "Exergy", "Useful", "Services"
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:<10} {:>10.3} {:>8.3} {:>8.3} {:>8.3} {:>9.3}",
            row.source.as_str(),
            row.efficiency,
            row.rebound_rate,
            row.exergy_factor,
            row.useful_per_primary,
            row.services_per_primary,
        );
    }
    out
}
