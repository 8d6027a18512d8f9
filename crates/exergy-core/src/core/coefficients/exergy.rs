use super::params::{ExergyTable, Sector};
use crate::core::models::source::EnergySource;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Maximum deviation from 1.0 tolerated in a source's sector fractions.
pub const ALLOCATION_TOLERANCE: f64 = 1e-3;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ExergyError {
    #[error(
        "Sector allocation for '{energy_source}' sums to {sum:.6}, expected 1.0 within {tolerance}"
    )]
    Allocation {
        energy_source: EnergySource,
        sum: f64,
        tolerance: f64,
    },
    #[error("Sector allocation for '{energy_source}' has a negative fraction for '{sector}': {value}")]
    NegativeFraction {
        energy_source: EnergySource,
        sector: Sector,
        value: f64,
    },
    #[error("No sector allocation is configured for source '{energy_source}'")]
    UnknownSource { energy_source: EnergySource },
    #[error("Sector '{sector}' used by '{energy_source}' has no exergy quality factor")]
    MissingQuality {
        energy_source: EnergySource,
        sector: Sector,
    },
}

#[derive(Debug, Clone)]
pub struct ExergyWeighter {
    quality: HashMap<Sector, f64>,
    allocation: HashMap<EnergySource, HashMap<Sector, f64>>,
    tolerance: f64,
}

impl ExergyWeighter {
    pub fn new(table: &ExergyTable) -> Self {
        Self::with_tolerance(table, ALLOCATION_TOLERANCE)
    }

    pub fn with_tolerance(table: &ExergyTable, tolerance: f64) -> Self {
        Self {
            quality: table.quality.clone(),
            allocation: table.allocation.clone(),
            tolerance,
        }
    }

    pub fn quality_factor(&self, sector: Sector) -> Option<f64> {
        self.quality.get(&sector).copied()
    }

    /// `sum(allocation[source][sector] * quality[sector])`.
    ///
    /// Fractions are never renormalized: a sum outside `1 ± tolerance` is an
    /// [`ExergyError::Allocation`].
    pub fn weighted_exergy(&self, source: EnergySource) -> Result<f64, ExergyError> {
        Ok(self.sector_weights(source)?.values().sum())
    }

    /// Per-sector `allocation * quality` for `source`. One unit of useful energy
    /// delivers `weights[sector]` units of services in each end-use sector.
    pub fn sector_weights(
        &self,
        source: EnergySource,
    ) -> Result<BTreeMap<Sector, f64>, ExergyError> {
        let fractions = self
            .allocation
            .get(&source)
            .ok_or(ExergyError::UnknownSource {
                energy_source: source,
            })?;

        let mut sum = 0.0;
        let mut weights = BTreeMap::new();
        for (&sector, &fraction) in fractions {
            if fraction < 0.0 {
                return Err(ExergyError::NegativeFraction {
                    energy_source: source,
                    sector,
                    value: fraction,
                });
            }
            let quality = self
                .quality_factor(sector)
                .ok_or(ExergyError::MissingQuality {
                    energy_source: source,
                    sector,
                })?;
            sum += fraction;
            weights.insert(sector, fraction * quality);
        }

        if !sum.is_finite() || (sum - 1.0).abs() > self.tolerance {
            return Err(ExergyError::Allocation {
                energy_source: source,
                sum,
                tolerance: self.tolerance,
            });
        }
        Ok(weights)
    }
}
