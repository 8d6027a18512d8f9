use super::params::{EfficiencyProfile, TemporalTable};
use crate::core::models::region::Region;
use crate::core::models::source::EnergySource;
use std::collections::HashMap;
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum CoefficientError {
    #[error("No efficiency coefficient is configured for source '{energy_source}'")]
    UnknownSource { energy_source: EnergySource },
}

/// One link of the efficiency resolution chain.
pub trait EfficiencyResolver: Send + Sync {
    fn name(&self) -> &'static str;

    fn try_resolve(&self, source: EnergySource, year: i32, region: &Region) -> Option<f64>;
}

/// Empirical per-region values. Ignores the year entirely.
#[derive(Debug, Clone, Default)]
pub struct RegionalOverrides {
    overrides: HashMap<Region, HashMap<EnergySource, f64>>,
}

impl RegionalOverrides {
    pub fn new(overrides: HashMap<Region, HashMap<EnergySource, f64>>) -> Self {
        Self { overrides }
    }
}

impl EfficiencyResolver for RegionalOverrides {
    fn name(&self) -> &'static str {
        "regional"
    }

    fn try_resolve(&self, source: EnergySource, _year: i32, region: &Region) -> Option<f64> {
        self.overrides
            .get(region)
            .and_then(|values| values.get(&source))
            .copied()
    }
}

/// `base * (1 + rate)^(year - base_year)`, clamped to the per-source ceiling.
/// Years whose projection is not a positive finite number are unresolved.
#[derive(Debug, Clone)]
pub struct TemporalProfile {
    table: TemporalTable,
}

impl TemporalProfile {
    pub fn new(table: TemporalTable) -> Self {
        Self { table }
    }

    pub fn max_efficiency(&self, source: EnergySource) -> Option<f64> {
        self.table.sources.get(&source).map(|p| p.max)
    }
}

impl EfficiencyResolver for TemporalProfile {
    fn name(&self) -> &'static str {
        "temporal"
    }

    fn try_resolve(&self, source: EnergySource, year: i32, _region: &Region) -> Option<f64> {
        let param = self.table.sources.get(&source)?;
        let elapsed = year.checked_sub(self.table.base_year)?;
        let compounded = param.base * (1.0 + param.annual_rate).powi(elapsed);
        // Overflow or decay to zero leaves the year to the next resolver.
        if !compounded.is_finite() || compounded <= 0.0 {
            return None;
        }
        Some(compounded.min(param.max))
    }
}

#[derive(Debug, Clone, Default)]
pub struct GlobalBaseline {
    values: HashMap<EnergySource, f64>,
}

impl GlobalBaseline {
    pub fn new(values: HashMap<EnergySource, f64>) -> Self {
        Self { values }
    }
}

impl EfficiencyResolver for GlobalBaseline {
    fn name(&self) -> &'static str {
        "baseline"
    }

    fn try_resolve(&self, source: EnergySource, _year: i32, _region: &Region) -> Option<f64> {
        self.values.get(&source).copied()
    }
}

/// Ordered resolver chain; the first link returning a value wins.
pub struct CoefficientResolver {
    chain: Vec<Box<dyn EfficiencyResolver>>,
}

impl CoefficientResolver {
    pub fn new(chain: Vec<Box<dyn EfficiencyResolver>>) -> Self {
        Self { chain }
    }

    /// Builds the standard chain: regional override, then temporal profile, then
    /// global baseline.
    pub fn from_profile(profile: &EfficiencyProfile) -> Self {
        let mut chain: Vec<Box<dyn EfficiencyResolver>> = Vec::with_capacity(3);
        chain.push(Box::new(RegionalOverrides::new(profile.regional.clone())));
        if let Some(temporal) = &profile.temporal {
            chain.push(Box::new(TemporalProfile::new(temporal.clone())));
        }
        chain.push(Box::new(GlobalBaseline::new(profile.baseline.clone())));
        Self::new(chain)
    }

    pub fn resolve_efficiency(
        &self,
        source: EnergySource,
        year: i32,
        region: &Region,
    ) -> Result<f64, CoefficientError> {
        for resolver in &self.chain {
            if let Some(value) = resolver.try_resolve(source, year, region) {
                trace!(
                    "Resolved efficiency {:.4} for {}/{}/{} via '{}'",
                    value,
                    region,
                    year,
                    source,
                    resolver.name()
                );
                return Ok(value);
            }
        }
        Err(CoefficientError::UnknownSource {
            energy_source: source,
        })
    }

    pub fn links(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.chain.iter().map(|r| r.name())
    }
}

impl std::fmt::Debug for CoefficientResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoefficientResolver")
            .field("chain", &self.links().collect::<Vec<_>>())
            .finish()
    }
}
