use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Petajoules per exajoule. Global series are reported in EJ, regional series in PJ.
pub const PJ_PER_EJ: f64 = 1000.0;
/// Exajoules per terawatt-hour, used when ingesting electricity-denominated series.
pub const EJ_PER_TWH: f64 = 0.0036;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnergyUnit {
    #[serde(rename = "EJ")]
    Exajoules,
    #[serde(rename = "PJ")]
    Petajoules,
    #[serde(rename = "TWh")]
    TerawattHours,
}

impl EnergyUnit {
    #[inline]
    fn petajoules_per_unit(self) -> f64 {
        match self {
            EnergyUnit::Exajoules => PJ_PER_EJ,
            EnergyUnit::Petajoules => 1.0,
            EnergyUnit::TerawattHours => EJ_PER_TWH * PJ_PER_EJ,
        }
    }

    /// Converts `value` expressed in `self` into `target`.
    #[inline]
    pub fn convert(self, value: f64, target: EnergyUnit) -> f64 {
        if self == target {
            return value;
        }
        value * self.petajoules_per_unit() / target.petajoules_per_unit()
    }

    #[inline]
    pub fn to_exajoules(self, value: f64) -> f64 {
        self.convert(value, EnergyUnit::Exajoules)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            EnergyUnit::Exajoules => "EJ",
            EnergyUnit::Petajoules => "PJ",
            EnergyUnit::TerawattHours => "TWh",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("Unrecognized energy unit: '{0}' (expected EJ, PJ or TWh)")]
pub struct ParseEnergyUnitError(pub String);

impl FromStr for EnergyUnit {
    type Err = ParseEnergyUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ej" | "exajoule" | "exajoules" => Ok(EnergyUnit::Exajoules),
            "pj" | "petajoule" | "petajoules" => Ok(EnergyUnit::Petajoules),
            "twh" | "terawatt-hours" => Ok(EnergyUnit::TerawattHours),
            _ => Err(ParseEnergyUnitError(s.to_string())),
        }
    }
}

impl fmt::Display for EnergyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
