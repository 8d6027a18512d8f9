use phf::{Map, phf_map};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum EnergySource {
    // --- Fossil ---
    Coal,
    Oil,
    Gas,

    // --- Clean ---
    Nuclear,
    Hydro,
    Wind,
    Solar,
    Biofuels,   // Modern biofuels plus traditional biomass
    Geothermal, // Geothermal and other non-combustion renewables
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceClass {
    Fossil,
    Clean,
}

static SOURCE_ALIASES: Map<&'static str, EnergySource> = phf_map! {
    "coal" => EnergySource::Coal,
    "oil" => EnergySource::Oil,
    "petroleum" => EnergySource::Oil,
    "gas" => EnergySource::Gas,
    "natural-gas" => EnergySource::Gas,
    "nuclear" => EnergySource::Nuclear,
    "hydro" => EnergySource::Hydro,
    "hydropower" => EnergySource::Hydro,
    "wind" => EnergySource::Wind,
    "solar" => EnergySource::Solar,
    "biofuels" => EnergySource::Biofuels,
    "biofuel" => EnergySource::Biofuels,
    "biomass" => EnergySource::Biofuels,
    "geothermal" => EnergySource::Geothermal,
    "other-renewables" => EnergySource::Geothermal,
};

impl EnergySource {
    pub const ALL: [EnergySource; 9] = [
        EnergySource::Coal,
        EnergySource::Oil,
        EnergySource::Gas,
        EnergySource::Nuclear,
        EnergySource::Hydro,
        EnergySource::Wind,
        EnergySource::Solar,
        EnergySource::Biofuels,
        EnergySource::Geothermal,
    ];

    pub fn class(self) -> SourceClass {
        match self {
            EnergySource::Coal | EnergySource::Oil | EnergySource::Gas => SourceClass::Fossil,
            _ => SourceClass::Clean,
        }
    }

    #[inline]
    pub fn is_fossil(self) -> bool {
        self.class() == SourceClass::Fossil
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EnergySource::Coal => "coal",
            EnergySource::Oil => "oil",
            EnergySource::Gas => "gas",
            EnergySource::Nuclear => "nuclear",
            EnergySource::Hydro => "hydro",
            EnergySource::Wind => "wind",
            EnergySource::Solar => "solar",
            EnergySource::Biofuels => "biofuels",
            EnergySource::Geothermal => "geothermal",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("Unrecognized energy source name: '{0}'")]
pub struct ParseEnergySourceError(pub String);

impl FromStr for EnergySource {
    type Err = ParseEnergySourceError;

    /// Parses a source name case-insensitively, accepting the common aliases used
    /// by upstream datasets (e.g. `biomass`, `natural gas`, `natural_gas`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace([' ', '_'], "-");
        SOURCE_ALIASES
            .get(key.as_str())
            .copied()
            .ok_or_else(|| ParseEnergySourceError(s.to_string()))
    }
}

impl fmt::Display for EnergySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for SourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                SourceClass::Fossil => "fossil",
                SourceClass::Clean => "clean",
            }
        )
    }
}
