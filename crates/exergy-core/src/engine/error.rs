use serde::Serialize;
use thiserror::Error;

use super::config::ConfigError;
use super::records::Tier;
use crate::core::coefficients::exergy::ExergyError;
use crate::core::coefficients::resolver::CoefficientError;
use crate::core::models::region::Region;
use crate::core::models::source::EnergySource;
use crate::core::models::units::EnergyUnit;

/// A violated accounting identity or a break in a yearly series. Identity
/// variants carry the relative or absolute divergence that triggered them.
#[derive(Debug, Error, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ConsistencyError {
    #[error(
        "{tier} total for {region}/{year} diverges from fossil + clean by {:.3}% (total {total}, parts {parts})",
        divergence * 100.0
    )]
    CategorySplit {
        region: Region,
        year: i32,
        tier: Tier,
        total: f64,
        parts: f64,
        divergence: f64,
    },

    #[error(
        "{tier} world total for {year} ({world:.3} EJ) diverges from the regional sum ({regional_sum:.3} EJ) by {:.2}%, tolerance {:.2}%",
        divergence * 100.0,
        tolerance * 100.0
    )]
    RegionalReconciliation {
        year: i32,
        tier: Tier,
        world: f64,
        regional_sum: f64,
        divergence: f64,
        tolerance: f64,
    },

    #[error(
        "{tier} deltas for {region} {from_year}->{to_year} do not add up: delta total {delta_total}, delta fossil + delta clean {delta_sum}"
    )]
    DeltaMismatch {
        region: Region,
        from_year: i32,
        to_year: i32,
        tier: Tier,
        delta_total: f64,
        delta_sum: f64,
        divergence: f64,
    },

    #[error(
        "{region} has no data between {from_year} and {to_year}; year-over-year metrics skip the gap"
    )]
    SeriesGap {
        region: Region,
        from_year: i32,
        to_year: i32,
    },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Coefficient resolution failed: {source}")]
    Coefficient {
        #[from]
        source: CoefficientError,
    },

    #[error("Exergy weighting failed: {source}")]
    Exergy {
        #[from]
        source: ExergyError,
    },

    #[error("Consistency check failed: {source}")]
    Consistency {
        #[from]
        source: ConsistencyError,
    },

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Unit mismatch for {region}/{year}: expected {expected}, found {found}")]
    UnitMismatch {
        region: Region,
        year: i32,
        expected: EnergyUnit,
        found: EnergyUnit,
    },

    #[error(
        "Record for {found_region}/{found_year} passed to the aggregation of {expected_region}/{expected_year}"
    )]
    RecordMismatch {
        expected_region: Region,
        expected_year: i32,
        found_region: Region,
        found_year: i32,
    },

    #[error("Invalid record pair: {reason}")]
    InvalidPair { reason: String },

    #[error(
        "Primary quantity for {region}/{year}/{energy_source} must be finite and non-negative, found {value}"
    )]
    InvalidQuantity {
        region: Region,
        year: i32,
        energy_source: EnergySource,
        value: f64,
    },
}
