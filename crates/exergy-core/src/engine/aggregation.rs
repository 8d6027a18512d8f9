use super::config::CATEGORY_SPLIT_TOLERANCE;
use super::error::{ConsistencyError, EngineError};
use super::metric::Metric;
use super::records::{AggregateRecord, CategoryTotals, SourceTiers, Tier, TierRecord};
use crate::core::coefficients::params::Sector;
use crate::core::models::region::Region;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// An aggregate together with the accounting issues found while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub record: AggregateRecord,
    pub issues: Vec<ConsistencyError>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierReconciliation {
    pub tier: Tier,
    pub world: f64,
    pub regional_sum: f64,
    pub divergence: f64,
}

/// World totals compared against the sum of member regions, in the world's unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconciliation {
    pub year: i32,
    pub members: Vec<Region>,
    pub tiers: Vec<TierReconciliation>,
}

#[derive(Debug, Clone, Copy)]
pub struct AggregationEngine {
    split_tolerance: f64,
}

impl Default for AggregationEngine {
    fn default() -> Self {
        Self::new(CATEGORY_SPLIT_TOLERANCE)
    }
}

impl AggregationEngine {
    pub fn new(split_tolerance: f64) -> Self {
        Self { split_tolerance }
    }

    /// Reduces the tier records of one `(region, year)` to fossil, clean and total
    /// per tier. Split inconsistencies are reported in [`Aggregation::issues`]
    /// and never abort the aggregation.
    pub fn aggregate(
        &self,
        region: &Region,
        year: i32,
        records: &[TierRecord],
    ) -> Result<Aggregation, EngineError> {
        let unit = records
            .first()
            .map(|r| r.unit)
            .unwrap_or_else(|| region.reporting_unit());

        let mut primary = CategoryTotals::default();
        let mut useful = CategoryTotals::default();
        let mut services = CategoryTotals::default();
        let mut by_source: BTreeMap<_, SourceTiers> = BTreeMap::new();
        let mut by_sector: BTreeMap<Sector, CategoryTotals> = BTreeMap::new();

        for record in records {
            if record.region != *region || record.year != year {
                return Err(EngineError::RecordMismatch {
                    expected_region: region.clone(),
                    expected_year: year,
                    found_region: record.region.clone(),
                    found_year: record.year,
                });
            }
            if record.unit != unit {
                return Err(EngineError::UnitMismatch {
                    region: region.clone(),
                    year,
                    expected: unit,
                    found: record.unit,
                });
            }

            let class = record.source.class();
            primary.add_classified(class, record.primary);
            useful.add_classified(class, record.useful);
            services.add_classified(class, record.services);
            primary.total += record.primary;
            useful.total += record.useful;
            services.total += record.services;

            let entry = by_source.entry(record.source).or_default();
            entry.primary += record.primary;
            entry.useful += record.useful;
            entry.services += record.services;

            for (&sector, &value) in &record.services_by_sector {
                let totals = by_sector.entry(sector).or_default();
                totals.add_classified(class, value);
                totals.total += value;
            }
        }

        let mut issues = Vec::new();
        for (tier, totals) in [
            (Tier::Primary, &primary),
            (Tier::Useful, &useful),
            (Tier::Services, &services),
        ] {
            let divergence = totals.split_divergence();
            if divergence > self.split_tolerance {
                let issue = ConsistencyError::CategorySplit {
                    region: region.clone(),
                    year,
                    tier,
                    total: totals.total,
                    parts: totals.fossil + totals.clean,
                    divergence,
                };
                warn!("{}", issue);
                issues.push(issue);
            }
        }

        let clean_share_useful = useful.clean_share();
        let clean_share_services = services.clean_share();
        let leverage = match (clean_share_services, clean_share_useful) {
            (Metric::Defined(services_share), Metric::Defined(useful_share)) => {
                Metric::ratio(services_share, useful_share)
            }
            _ => Metric::Undefined,
        };

        debug!(
            %region,
            year,
            sources = by_source.len(),
            useful_total = useful.total,
            "Aggregated tier records."
        );

        Ok(Aggregation {
            record: AggregateRecord {
                region: region.clone(),
                year,
                unit,
                overall_efficiency: Metric::ratio(useful.total, primary.total),
                exergy_efficiency: Metric::ratio(services.total, primary.total),
                primary,
                useful,
                services,
                clean_share_useful,
                clean_share_services,
                leverage,
                by_source,
                by_sector,
            },
            issues,
        })
    }

    /// Compares the world aggregate against the sum of `members` for every tier.
    /// Member totals are converted into the world record's unit first.
    pub fn reconcile_regions(
        &self,
        world: &AggregateRecord,
        members: &[AggregateRecord],
        tolerance: f64,
    ) -> Result<Reconciliation, EngineError> {
        if let Some(other) = members.iter().find(|m| m.year != world.year) {
            return Err(EngineError::RecordMismatch {
                expected_region: world.region.clone(),
                expected_year: world.year,
                found_region: other.region.clone(),
                found_year: other.year,
            });
        }

        let mut tiers = Vec::with_capacity(Tier::ALL.len());
        for tier in Tier::ALL {
            let world_total = world.tier(tier).total;
            let regional_sum: f64 = members
                .iter()
                .map(|m| m.unit.convert(m.tier(tier).total, world.unit))
                .sum();
            let divergence = relative_divergence(world_total, regional_sum);
            if divergence > tolerance {
                return Err(ConsistencyError::RegionalReconciliation {
                    year: world.year,
                    tier,
                    world: world_total,
                    regional_sum,
                    divergence,
                    tolerance,
                }
                .into());
            }
            tiers.push(TierReconciliation {
                tier,
                world: world_total,
                regional_sum,
                divergence,
            });
        }

        Ok(Reconciliation {
            year: world.year,
            members: members.iter().map(|m| m.region.clone()).collect(),
            tiers,
        })
    }
}

fn relative_divergence(reference: f64, value: f64) -> f64 {
    let gap = (reference - value).abs();
    if gap == 0.0 {
        0.0
    } else if reference == 0.0 {
        f64::INFINITY
    } else {
        gap / reference.abs()
    }
}
