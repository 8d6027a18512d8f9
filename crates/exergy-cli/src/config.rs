use crate::error::{CliError, Result};
use directories::ProjectDirs;
use exergy::engine::config::{EngineConfig, EngineConfigBuilder, EngineConfigFile};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CONFIG_FILE_NAME: &str = "config.toml";

/// Values set with repeated `-S key=value` flags.
#[derive(Debug, Default, Clone, PartialEq)]
struct SetOverrides {
    rebound_rate: Option<f64>,
    allocation_tolerance: Option<f64>,
    split_tolerance: Option<f64>,
    reconciliation_tolerance: Option<f64>,
}

impl SetOverrides {
    fn parse(set_values: &[String]) -> Result<Self> {
        let mut overrides = Self::default();
        for kv_pair in set_values {
            let (key, value_str) = kv_pair.split_once('=').ok_or_else(|| {
                CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                ))
            })?;
            let key = key.trim();
            let value: f64 = value_str.trim().parse().map_err(|_| {
                CliError::Config(format!("Invalid float value for {}: {}", key, value_str))
            })?;

            let slot = match key {
                "rebound.global-rate" => &mut overrides.rebound_rate,
                "validation.allocation-tolerance" => &mut overrides.allocation_tolerance,
                "validation.split-tolerance" => &mut overrides.split_tolerance,
                "reconciliation.tolerance" => &mut overrides.reconciliation_tolerance,
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            };
            *slot = Some(value);
        }
        Ok(overrides)
    }

    fn apply(&self, mut builder: EngineConfigBuilder) -> EngineConfigBuilder {
        if let Some(rate) = self.rebound_rate {
            builder = builder.rebound_rate(rate);
        }
        if let Some(tolerance) = self.allocation_tolerance {
            builder = builder.allocation_tolerance(tolerance);
        }
        if let Some(tolerance) = self.split_tolerance {
            builder = builder.split_tolerance(tolerance);
        }
        if let Some(tolerance) = self.reconciliation_tolerance {
            builder = builder.reconciliation_tolerance(tolerance);
        }
        builder
    }
}

pub fn default_config_path() -> Result<PathBuf> {
    ProjectDirs::from("org", "global-energy-tracker", "exergy")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
        .ok_or_else(|| CliError::Config("Could not determine config directory path.".to_string()))
}

/// An explicit path must exist. Without one, the default location is used when a
/// file is present there, otherwise `None` selects the built-in tables.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(CliError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Provided config path does not exist: {}", path.display()),
            )));
        }
        return Ok(Some(path.to_path_buf()));
    }
    match default_config_path() {
        Ok(path) if path.exists() => Ok(Some(path)),
        _ => Ok(None),
    }
}

fn builder_from(config_path: Option<&Path>) -> Result<EngineConfigBuilder> {
    match config_path {
        Some(path) => {
            info!("Loading engine configuration from {:?}", path);
            let file = EngineConfigFile::load(path).map_err(|e| CliError::FileParsing {
                path: path.to_path_buf(),
                source: e.into(),
            })?;
            Ok(file.into_builder())
        }
        None => {
            info!("No configuration file found; using the built-in coefficient tables.");
            Ok(EngineConfigBuilder::new().builtin_tables())
        }
    }
}

/// Precedence, highest first: CLI flags, `-S` values, the config file, built-in defaults.
pub fn build_engine_config(
    config_path: Option<&Path>,
    rebound: Option<f64>,
    set_values: &[String],
) -> Result<EngineConfig> {
    let overrides = SetOverrides::parse(set_values)?;
    debug!("Parsed --set overrides: {:?}", overrides);

    let mut builder = overrides.apply(builder_from(config_path)?);
    if let Some(rate) = rebound {
        builder = builder.rebound_rate(rate);
    }
    builder.build().map_err(|e| CliError::Config(e.to_string()))
}
