use super::metric::Metric;
use crate::core::coefficients::params::Sector;
use crate::core::models::region::Region;
use crate::core::models::source::{EnergySource, SourceClass};
use crate::core::models::units::EnergyUnit;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    Primary,
    Useful,
    Services,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Primary, Tier::Useful, Tier::Services];
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
#[error("Invalid tier '{0}' (expected 'primary', 'useful' or 'services')")]
pub struct ParseTierError(pub String);

impl FromStr for Tier {
    type Err = ParseTierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" => Ok(Tier::Primary),
            "useful" => Ok(Tier::Useful),
            "services" | "service" | "exergy" => Ok(Tier::Services),
            _ => Err(ParseTierError(s.to_string())),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Tier::Primary => "primary",
                Tier::Useful => "useful",
                Tier::Services => "services",
            }
        )
    }
}

/// Primary, useful and services quantities for one `(region, year, source)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierRecord {
    pub region: Region,
    pub year: i32,
    pub source: EnergySource,
    pub unit: EnergyUnit,
    pub primary: f64,
    pub useful: f64,
    pub services: f64,
    pub efficiency: f64,
    pub rebound_rate: f64,
    pub exergy_factor: f64,
    /// `services` split by end-use sector; the values sum to `services`.
    pub services_by_sector: BTreeMap<Sector, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CategoryTotals {
    pub fossil: f64,
    pub clean: f64,
    pub total: f64,
}

impl CategoryTotals {
    pub fn new(fossil: f64, clean: f64, total: f64) -> Self {
        Self {
            fossil,
            clean,
            total,
        }
    }

    pub fn add_classified(&mut self, class: SourceClass, value: f64) {
        match class {
            SourceClass::Fossil => self.fossil += value,
            SourceClass::Clean => self.clean += value,
        }
    }

    #[inline]
    pub fn clean_share(&self) -> Metric {
        Metric::ratio(self.clean, self.total)
    }

    #[inline]
    pub fn fossil_share(&self) -> Metric {
        Metric::ratio(self.fossil, self.total)
    }

    /// Relative gap `|total - (fossil + clean)| / total`. Zero when all three are
    /// zero, infinite when only the total is.
    pub fn split_divergence(&self) -> f64 {
        let gap = (self.total - (self.fossil + self.clean)).abs();
        if gap == 0.0 {
            0.0
        } else if self.total == 0.0 {
            f64::INFINITY
        } else {
            gap / self.total.abs()
        }
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.fossil * factor, self.clean * factor, self.total * factor)
    }
}

impl Add for CategoryTotals {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            fossil: self.fossil + rhs.fossil,
            clean: self.clean + rhs.clean,
            total: self.total + rhs.total,
        }
    }
}

impl AddAssign for CategoryTotals {
    fn add_assign(&mut self, rhs: Self) {
        self.fossil += rhs.fossil;
        self.clean += rhs.clean;
        self.total += rhs.total;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SourceTiers {
    pub primary: f64,
    pub useful: f64,
    pub services: f64,
}

/// Immutable per `(region, year)` snapshot of all tiers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRecord {
    pub region: Region,
    pub year: i32,
    pub unit: EnergyUnit,
    pub primary: CategoryTotals,
    pub useful: CategoryTotals,
    pub services: CategoryTotals,
    pub clean_share_useful: Metric,
    pub clean_share_services: Metric,
    /// Clean share of services over clean share of useful energy.
    pub leverage: Metric,
    /// `useful.total / primary.total`.
    pub overall_efficiency: Metric,
    /// `services.total / primary.total`.
    pub exergy_efficiency: Metric,
    pub by_source: BTreeMap<EnergySource, SourceTiers>,
    /// Energy services per end-use sector, split into fossil and clean.
    pub by_sector: BTreeMap<Sector, CategoryTotals>,
}

impl AggregateRecord {
    pub fn tier(&self, tier: Tier) -> &CategoryTotals {
        match tier {
            Tier::Primary => &self.primary,
            Tier::Useful => &self.useful,
            Tier::Services => &self.services,
        }
    }

    /// Services delivered to `sector`, zero when no source serves it.
    pub fn sector(&self, sector: Sector) -> CategoryTotals {
        self.by_sector.get(&sector).copied().unwrap_or_default()
    }

    pub fn clean_share(&self, tier: Tier) -> Metric {
        match tier {
            Tier::Primary => self.primary.clean_share(),
            Tier::Useful => self.clean_share_useful,
            Tier::Services => self.clean_share_services,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_classified_routes_by_class() {
        let mut totals = CategoryTotals::default();
        totals.add_classified(SourceClass::Fossil, 3.0);
        totals.add_classified(SourceClass::Clean, 1.0);
        totals.add_classified(SourceClass::Fossil, 2.0);
        assert_eq!(totals.fossil, 5.0);
        assert_eq!(totals.clean, 1.0);
        assert_eq!(totals.total, 0.0);
    }

    #[test]
    fn shares_are_undefined_for_zero_total() {
        let totals = CategoryTotals::default();
        assert_eq!(totals.clean_share(), Metric::Undefined);
        assert_eq!(totals.fossil_share(), Metric::Undefined);
    }

    #[test]
    fn split_divergence_is_relative_to_total() {
        let totals = CategoryTotals::new(90.0, 9.0, 100.0);
        assert!((totals.split_divergence() - 0.01).abs() < 1e-12);
        assert_eq!(CategoryTotals::default().split_divergence(), 0.0);
        assert_eq!(
            CategoryTotals::new(1.0, 0.0, 0.0).split_divergence(),
            f64::INFINITY
        );
    }

    #[test]
    fn add_sums_each_field() {
        let a = CategoryTotals::new(1.0, 2.0, 3.0);
        let mut b = CategoryTotals::new(4.0, 5.0, 9.0);
        assert_eq!(a + b, CategoryTotals::new(5.0, 7.0, 12.0));
        b += a;
        assert_eq!(b, CategoryTotals::new(5.0, 7.0, 12.0));
    }

    #[test]
    fn tier_parses_aliases() {
        assert_eq!("Useful".parse::<Tier>(), Ok(Tier::Useful));
        assert_eq!("exergy".parse::<Tier>(), Ok(Tier::Services));
        assert_eq!(" primary ".parse::<Tier>(), Ok(Tier::Primary));
        assert!("final".parse::<Tier>().is_err());
    }
}
