use super::units::EnergyUnit;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const WORLD_REGION: &str = "World";

const WORLD_ALIASES: [&str; 2] = [WORLD_REGION, "global"];

/// Region name, trimmed. Any spelling of a world alias is stored as [`WORLD_REGION`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Region(String);

impl Region {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let trimmed = name.trim();
        if WORLD_ALIASES
            .iter()
            .any(|alias| trimmed.eq_ignore_ascii_case(alias))
        {
            Self::world()
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn world() -> Self {
        Self(WORLD_REGION.to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn is_world(&self) -> bool {
        self.0 == WORLD_REGION
    }

    /// Global series are reported in exajoules, regional series in petajoules.
    pub fn reporting_unit(&self) -> EnergyUnit {
        if self.is_world() {
            EnergyUnit::Exajoules
        } else {
            EnergyUnit::Petajoules
        }
    }
}

impl From<&str> for Region {
    fn from(name: &str) -> Self {
        Region::new(name)
    }
}

impl<'de> Deserialize<'de> for Region {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Region::new)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Economic grouping used to select a rebound rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegionClass {
    Developed,
    Developing,
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("Invalid region class '{0}' (expected 'developed' or 'developing')")]
pub struct ParseRegionClassError(pub String);

impl FromStr for RegionClass {
    type Err = ParseRegionClassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "developed" | "advanced" => Ok(RegionClass::Developed),
            "developing" | "emerging" => Ok(RegionClass::Developing),
            _ => Err(ParseRegionClassError(s.to_string())),
        }
    }
}

impl fmt::Display for RegionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                RegionClass::Developed => "developed",
                RegionClass::Developing => "developing",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegionInfo {
    pub class: Option<RegionClass>,
    /// Whether this region's totals are summed when reconciling against the world total.
    pub reconcile: bool,
}

/// Lookup of per-region metadata. Regions absent from the registry have no class
/// and do not take part in cross-region reconciliation.
#[derive(Debug, Clone, Default)]
pub struct RegionRegistry {
    regions: HashMap<Region, RegionInfo>,
}

impl RegionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, region: Region, info: RegionInfo) {
        self.regions.insert(region, info);
    }

    pub fn get(&self, region: &Region) -> Option<&RegionInfo> {
        self.regions.get(region)
    }

    pub fn class_of(&self, region: &Region) -> Option<RegionClass> {
        if region.is_world() {
            return None;
        }
        self.regions.get(region).and_then(|info| info.class)
    }

    pub fn reconciliation_members(&self) -> impl Iterator<Item = &Region> {
        self.regions
            .iter()
            .filter(|(region, info)| info.reconcile && !region.is_world())
            .map(|(region, _)| region)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
