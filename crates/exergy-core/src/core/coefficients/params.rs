use crate::core::models::region::{Region, RegionClass, RegionInfo, RegionRegistry};
use crate::core::models::source::EnergySource;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum Sector {
    Electricity,
    Mechanical,
    HighTempHeat,
    MediumTempHeat,
    LowTempHeat,
}

impl Sector {
    pub const ALL: [Sector; 5] = [
        Sector::Electricity,
        Sector::Mechanical,
        Sector::HighTempHeat,
        Sector::MediumTempHeat,
        Sector::LowTempHeat,
    ];
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Sector::Electricity => "electricity",
                Sector::Mechanical => "mechanical",
                Sector::HighTempHeat => "high-temp-heat",
                Sector::MediumTempHeat => "medium-temp-heat",
                Sector::LowTempHeat => "low-temp-heat",
            }
        )
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TemporalParam {
    /// Efficiency at the profile's base year.
    pub base: f64,
    pub annual_rate: f64,
    /// Realistic ceiling; the compounded value is clamped to it.
    pub max: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TemporalTable {
    pub base_year: i32,
    #[serde(default)]
    pub sources: HashMap<EnergySource, TemporalParam>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct EfficiencyProfile {
    #[serde(default)]
    pub baseline: HashMap<EnergySource, f64>,
    pub temporal: Option<TemporalTable>,
    #[serde(default)]
    pub regional: HashMap<Region, HashMap<EnergySource, f64>>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ExergyTable {
    #[serde(default)]
    pub quality: HashMap<Sector, f64>,
    #[serde(default)]
    pub allocation: HashMap<EnergySource, HashMap<Sector, f64>>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ReboundConfig {
    pub global_rate: f64,
    pub developed: Option<f64>,
    pub developing: Option<f64>,
}

impl Default for ReboundConfig {
    fn default() -> Self {
        Self {
            global_rate: 0.07,
            developed: None,
            developing: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RegionEntry {
    pub class: Option<RegionClass>,
    #[serde(default)]
    pub reconcile: bool,
}

/// The complete set of read-only coefficient tables driving a computation run.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientTables {
    pub efficiency: EfficiencyProfile,
    pub exergy: ExergyTable,
    pub rebound: ReboundConfig,
    pub regions: HashMap<Region, RegionEntry>,
}

#[derive(Debug, Error)]
pub enum ParamLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

#[derive(Debug, Error, PartialEq, Clone)]
pub enum TableError {
    #[error("Efficiency '{table}' for {key} must lie in (0, 1], found {value}")]
    EfficiencyOutOfRange {
        table: &'static str,
        key: String,
        value: f64,
    },
    #[error("Annual improvement rate for {energy_source} must be greater than -1, found {value}")]
    InvalidAnnualRate {
        energy_source: EnergySource,
        value: f64,
    },
    #[error("Temporal base efficiency for {energy_source} ({base}) exceeds its ceiling ({max})")]
    BaseAboveCeiling {
        energy_source: EnergySource,
        base: f64,
        max: f64,
    },
    #[error("Exergy quality factor for sector '{sector}' must lie in (0, 1], found {value}")]
    QualityOutOfRange { sector: Sector, value: f64 },
    #[error("Sector '{sector}' has no exergy quality factor")]
    MissingQuality { sector: Sector },
    #[error(
        "Low-temperature heat must carry the lowest exergy quality factor, but '{sector}' is lower ({value})"
    )]
    QualityOrdering { sector: Sector, value: f64 },
    #[error("Rebound rate '{name}' must lie in [0, 1), found {value}")]
    ReboundOutOfRange { name: &'static str, value: f64 },
}

impl CoefficientTables {
    /// Checks every coefficient against its admissible range. Sector allocation
    /// closure is checked per source by the exergy weighter.
    pub fn validate(&self) -> Result<(), TableError> {
        self.validate_efficiency()?;
        self.validate_exergy()?;
        self.validate_rebound()
    }

    pub fn region_registry(&self) -> RegionRegistry {
        let mut registry = RegionRegistry::new();
        for (region, entry) in &self.regions {
            registry.insert(
                region.clone(),
                RegionInfo {
                    class: entry.class,
                    reconcile: entry.reconcile,
                },
            );
        }
        registry
    }

    fn validate_efficiency(&self) -> Result<(), TableError> {
        let in_unit_interval = |v: f64| v.is_finite() && v > 0.0 && v <= 1.0;

        for (source, &value) in &self.efficiency.baseline {
            if !in_unit_interval(value) {
                return Err(TableError::EfficiencyOutOfRange {
                    table: "baseline",
                    key: source.to_string(),
                    value,
                });
            }
        }

        if let Some(temporal) = &self.efficiency.temporal {
            for (&source, param) in &temporal.sources {
                if !in_unit_interval(param.base) {
                    return Err(TableError::EfficiencyOutOfRange {
                        table: "temporal.base",
                        key: source.to_string(),
                        value: param.base,
                    });
                }
                if !in_unit_interval(param.max) {
                    return Err(TableError::EfficiencyOutOfRange {
                        table: "temporal.max",
                        key: source.to_string(),
                        value: param.max,
                    });
                }
                if !param.annual_rate.is_finite() || param.annual_rate <= -1.0 {
                    return Err(TableError::InvalidAnnualRate {
                        energy_source: source,
                        value: param.annual_rate,
                    });
                }
                if param.base > param.max {
                    return Err(TableError::BaseAboveCeiling {
                        energy_source: source,
                        base: param.base,
                        max: param.max,
                    });
                }
            }
        }

        for (region, overrides) in &self.efficiency.regional {
            for (source, &value) in overrides {
                if !in_unit_interval(value) {
                    return Err(TableError::EfficiencyOutOfRange {
                        table: "regional",
                        key: format!("{}/{}", region, source),
                        value,
                    });
                }
            }
        }
        Ok(())
    }

    fn validate_exergy(&self) -> Result<(), TableError> {
        for sector in Sector::ALL {
            let value = *self
                .exergy
                .quality
                .get(&sector)
                .ok_or(TableError::MissingQuality { sector })?;
            if !(value.is_finite() && value > 0.0 && value <= 1.0) {
                return Err(TableError::QualityOutOfRange { sector, value });
            }
        }

        let low_temp = self.exergy.quality[&Sector::LowTempHeat];
        if let Some((&sector, &value)) = self
            .exergy
            .quality
            .iter()
            .find(|(s, v)| **s != Sector::LowTempHeat && **v < low_temp)
        {
            return Err(TableError::QualityOrdering { sector, value });
        }
        Ok(())
    }

    fn validate_rebound(&self) -> Result<(), TableError> {
        let rates = [
            ("global-rate", Some(self.rebound.global_rate)),
            ("developed", self.rebound.developed),
            ("developing", self.rebound.developing),
        ];
        for (name, rate) in rates {
            if let Some(value) = rate {
                if !(value.is_finite() && (0.0..1.0).contains(&value)) {
                    return Err(TableError::ReboundOutOfRange { name, value });
                }
            }
        }
        Ok(())
    }
}

impl Default for CoefficientTables {
    /// Built-in tables calibrated to the 2024 global system: base-year 1965
    /// temporal profiles for combustion sources, delivered-electricity efficiencies
    /// for non-combustion sources, and the standard sector exergy ladder.
    fn default() -> Self {
        use EnergySource::*;
        use Sector::*;

        let baseline = HashMap::from([
            (Coal, 0.32),
            (Oil, 0.30),
            (Gas, 0.45),
            (Nuclear, 0.90),
            (Hydro, 0.90),
            (Wind, 0.90),
            (Solar, 0.90),
            (Biofuels, 0.28),
            (Geothermal, 0.90),
        ]);

        let temporal = TemporalTable {
            base_year: 1965,
            sources: HashMap::from([
                (
                    Coal,
                    TemporalParam {
                        base: 0.25,
                        annual_rate: 0.005,
                        max: 0.40,
                    },
                ),
                (
                    Oil,
                    TemporalParam {
                        base: 0.22,
                        annual_rate: 0.006,
                        max: 0.38,
                    },
                ),
                (
                    Gas,
                    TemporalParam {
                        base: 0.35,
                        annual_rate: 0.005,
                        max: 0.55,
                    },
                ),
                (
                    Biofuels,
                    TemporalParam {
                        base: 0.20,
                        annual_rate: 0.006,
                        max: 0.35,
                    },
                ),
            ]),
        };

        let quality = HashMap::from([
            (Electricity, 1.0),
            (Mechanical, 1.0),
            (HighTempHeat, 0.6),
            (MediumTempHeat, 0.4),
            (LowTempHeat, 0.15),
        ]);

        let electricity_only = || HashMap::from([(Electricity, 1.0)]);
        let allocation = HashMap::from([
            (
                Coal,
                HashMap::from([(Electricity, 0.65), (HighTempHeat, 0.30), (LowTempHeat, 0.05)]),
            ),
            (
                Oil,
                HashMap::from([(Mechanical, 0.80), (HighTempHeat, 0.10), (LowTempHeat, 0.10)]),
            ),
            (
                Gas,
                HashMap::from([
                    (Electricity, 0.40),
                    (HighTempHeat, 0.25),
                    (MediumTempHeat, 0.10),
                    (LowTempHeat, 0.25),
                ]),
            ),
            (Nuclear, electricity_only()),
            (Hydro, electricity_only()),
            (Wind, electricity_only()),
            (Solar, electricity_only()),
            (
                Biofuels,
                HashMap::from([(Mechanical, 0.20), (HighTempHeat, 0.20), (LowTempHeat, 0.60)]),
            ),
            (
                Geothermal,
                HashMap::from([(Electricity, 0.70), (LowTempHeat, 0.30)]),
            ),
        ]);

        Self {
            efficiency: EfficiencyProfile {
                baseline,
                temporal: Some(temporal),
                regional: HashMap::new(),
            },
            exergy: ExergyTable {
                quality,
                allocation,
            },
            rebound: ReboundConfig::default(),
            regions: HashMap::new(),
        }
    }
}
