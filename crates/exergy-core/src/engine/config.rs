use crate::core::coefficients::exergy::ALLOCATION_TOLERANCE;
use crate::core::coefficients::params::{
    CoefficientTables, EfficiencyProfile, ExergyTable, ParamLoadError, ReboundConfig, RegionEntry,
    TableError,
};
use crate::core::models::region::Region;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Default relative tolerance for `|total - (fossil + clean)| / total`.
pub const CATEGORY_SPLIT_TOLERANCE: f64 = 0.01;
/// Default relative tolerance between the world total and the sum of its regions.
pub const RECONCILIATION_TOLERANCE: f64 = 0.05;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid coefficient tables: {0}")]
    InvalidTables(#[from] TableError),

    #[error("Tolerance '{name}' must be finite and non-negative, found {value}")]
    InvalidTolerance { name: &'static str, value: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub allocation: f64,
    pub category_split: f64,
    pub reconciliation: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            allocation: ALLOCATION_TOLERANCE,
            category_split: CATEGORY_SPLIT_TOLERANCE,
            reconciliation: RECONCILIATION_TOLERANCE,
        }
    }
}

/// A validated engine configuration. Immutable once built; a different
/// configuration means a new [`Engine`](super::context::Engine).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineConfig {
    pub tables: CoefficientTables,
    pub tolerances: Tolerances,
}

#[derive(Default)]
pub struct EngineConfigBuilder {
    tables: Option<CoefficientTables>,
    rebound_rate: Option<f64>,
    allocation_tolerance: Option<f64>,
    split_tolerance: Option<f64>,
    reconciliation_tolerance: Option<f64>,
}

impl EngineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tables(mut self, tables: CoefficientTables) -> Self {
        self.tables = Some(tables);
        self
    }
    pub fn builtin_tables(self) -> Self {
        self.tables(CoefficientTables::default())
    }
    /// Overrides the global rebound rate of the tables.
    pub fn rebound_rate(mut self, rate: f64) -> Self {
        self.rebound_rate = Some(rate);
        self
    }
    pub fn allocation_tolerance(mut self, tolerance: f64) -> Self {
        self.allocation_tolerance = Some(tolerance);
        self
    }
    pub fn split_tolerance(mut self, tolerance: f64) -> Self {
        self.split_tolerance = Some(tolerance);
        self
    }
    pub fn reconciliation_tolerance(mut self, tolerance: f64) -> Self {
        self.reconciliation_tolerance = Some(tolerance);
        self
    }

    pub fn build(self) -> Result<EngineConfig, ConfigError> {
        let mut tables = self
            .tables
            .ok_or(ConfigError::MissingParameter("tables"))?;
        if let Some(rate) = self.rebound_rate {
            tables.rebound.global_rate = rate;
        }
        tables.validate()?;

        let defaults = Tolerances::default();
        let tolerances = Tolerances {
            allocation: check_tolerance(
                "allocation-tolerance",
                self.allocation_tolerance.unwrap_or(defaults.allocation),
            )?,
            category_split: check_tolerance(
                "split-tolerance",
                self.split_tolerance.unwrap_or(defaults.category_split),
            )?,
            reconciliation: check_tolerance(
                "reconciliation.tolerance",
                self.reconciliation_tolerance
                    .unwrap_or(defaults.reconciliation),
            )?,
        };

        Ok(EngineConfig { tables, tolerances })
    }
}

fn check_tolerance(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidTolerance { name, value })
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ValidationSection {
    pub allocation_tolerance: Option<f64>,
    pub split_tolerance: Option<f64>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ReconciliationSection {
    pub tolerance: Option<f64>,
}

/// On-disk TOML form of an [`EngineConfig`].
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct EngineConfigFile {
    pub efficiency: EfficiencyProfile,
    pub exergy: ExergyTable,
    #[serde(default)]
    pub rebound: ReboundConfig,
    #[serde(default)]
    pub regions: HashMap<Region, RegionEntry>,
    #[serde(default)]
    pub validation: ValidationSection,
    #[serde(default)]
    pub reconciliation: ReconciliationSection,
}

impl EngineConfigFile {
    pub fn load(path: &Path) -> Result<Self, ParamLoadError> {
        debug!("Loading engine configuration from {:?}", path);
        let content = std::fs::read_to_string(path).map_err(|e| ParamLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_toml(&content).map_err(|e| ParamLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn into_builder(self) -> EngineConfigBuilder {
        let mut builder = EngineConfigBuilder::new().tables(CoefficientTables {
            efficiency: self.efficiency,
            exergy: self.exergy,
            rebound: self.rebound,
            regions: self.regions,
        });
        if let Some(tolerance) = self.validation.allocation_tolerance {
            builder = builder.allocation_tolerance(tolerance);
        }
        if let Some(tolerance) = self.validation.split_tolerance {
            builder = builder.split_tolerance(tolerance);
        }
        if let Some(tolerance) = self.reconciliation.tolerance {
            builder = builder.reconciliation_tolerance(tolerance);
        }
        builder
    }
}
