use super::error::{ConsistencyError, EngineError};
use super::metric::Metric;
use super::records::{AggregateRecord, CategoryTotals, Tier};
use crate::core::coefficients::params::Sector;
use crate::core::models::region::Region;
use crate::core::models::units::EnergyUnit;
use serde::Serialize;
use std::collections::BTreeSet;

/// Relative slack allowed in `delta_total == delta_fossil + delta_clean`, scaled by
/// the larger of the two totals.
pub const DELTA_TOLERANCE: f64 = 1e-9;

/// Year-over-year change for one region and tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplacementMetrics {
    pub region: Region,
    pub from_year: i32,
    pub to_year: i32,
    pub tier: Tier,
    pub unit: EnergyUnit,
    pub delta_fossil: f64,
    pub delta_clean: f64,
    pub delta_total: f64,
    /// Clean growth actually available to displace fossil use, `max(0, delta_clean)`.
    pub displacement: f64,
    /// Share of total growth captured by fossil, in percent. Undefined when total
    /// demand did not grow.
    pub ff_growth: Metric,
    pub net_change: f64,
    /// Clean growth relative to fossil growth, in percent.
    pub displacement_rate: f64,
}

/// Growth and fossil-share shift of one fossil/clean/total series between two years.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodChange {
    pub start_total: f64,
    pub end_total: f64,
    pub total_growth: f64,
    pub fossil_change: f64,
    pub clean_growth: f64,
    /// Compound annual growth of the total, in percent.
    pub cagr: Metric,
    pub fossil_share_start: Metric,
    pub fossil_share_end: Metric,
    pub fossil_share_change: Metric,
}

impl PeriodChange {
    fn between(start: &CategoryTotals, end: &CategoryTotals, years: i32) -> Self {
        let cagr = if start.total > 0.0 && years > 0 {
            Metric::from_value(
                ((end.total / start.total).powf(1.0 / f64::from(years)) - 1.0) * 100.0,
            )
        } else {
            Metric::Undefined
        };

        let fossil_share_start = start.fossil_share();
        let fossil_share_end = end.fossil_share();
        let fossil_share_change = match (fossil_share_start, fossil_share_end) {
            (Metric::Defined(a), Metric::Defined(b)) => Metric::Defined(b - a),
            _ => Metric::Undefined,
        };

        Self {
            start_total: start.total,
            end_total: end.total,
            total_growth: end.total - start.total,
            fossil_change: end.fossil - start.fossil,
            clean_growth: end.clean - start.clean,
            cagr,
            fossil_share_start,
            fossil_share_end,
            fossil_share_change,
        }
    }
}

/// Multi-year change between the first and last year of a series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub region: Region,
    pub tier: Tier,
    pub from_year: i32,
    pub to_year: i32,
    pub unit: EnergyUnit,
    #[serde(flatten)]
    pub change: PeriodChange,
}

/// Multi-year change of the energy services delivered to one end-use sector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorSummary {
    pub region: Region,
    pub sector: Sector,
    pub from_year: i32,
    pub to_year: i32,
    pub unit: EnergyUnit,
    #[serde(flatten)]
    pub change: PeriodChange,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DisplacementCalculator;

impl DisplacementCalculator {
    pub fn new() -> Self {
        Self
    }

    pub fn compute_displacement(
        &self,
        prev: &AggregateRecord,
        curr: &AggregateRecord,
        tier: Tier,
    ) -> Result<DisplacementMetrics, EngineError> {
        validate_pair(prev, curr)?;
        if curr.year - prev.year != 1 {
            return Err(EngineError::InvalidPair {
                reason: format!(
                    "years {} and {} for {} are not consecutive",
                    prev.year, curr.year, curr.region
                ),
            });
        }

        let before = prev.tier(tier);
        let after = curr.tier(tier);
        let delta_fossil = after.fossil - before.fossil;
        let delta_clean = after.clean - before.clean;
        let delta_total = after.total - before.total;

        let delta_sum = delta_fossil + delta_clean;
        let divergence = (delta_total - delta_sum).abs();
        let scale = 1.0_f64.max(before.total.abs()).max(after.total.abs());
        if divergence > DELTA_TOLERANCE * scale {
            return Err(ConsistencyError::DeltaMismatch {
                region: curr.region.clone(),
                from_year: prev.year,
                to_year: curr.year,
                tier,
                delta_total,
                delta_sum,
                divergence,
            }
            .into());
        }

        let ff_growth = if delta_total > 0.0 {
            Metric::from_value(delta_fossil / delta_total * 100.0)
        } else {
            Metric::Undefined
        };

        let displacement_rate = if delta_clean > 0.0 && delta_fossil > 0.0 {
            delta_clean / delta_fossil * 100.0
        } else if delta_clean > 0.0 {
            100.0
        } else {
            0.0
        };

        Ok(DisplacementMetrics {
            region: curr.region.clone(),
            from_year: prev.year,
            to_year: curr.year,
            tier,
            unit: curr.unit,
            delta_fossil,
            delta_clean,
            delta_total,
            displacement: delta_clean.max(0.0),
            ff_growth,
            net_change: delta_fossil,
            displacement_rate,
        })
    }

    pub fn summarize_period(
        &self,
        first: &AggregateRecord,
        last: &AggregateRecord,
        tier: Tier,
    ) -> Result<PeriodSummary, EngineError> {
        validate_pair(first, last)?;

        Ok(PeriodSummary {
            region: last.region.clone(),
            tier,
            from_year: first.year,
            to_year: last.year,
            unit: last.unit,
            change: PeriodChange::between(first.tier(tier), last.tier(tier), last.year - first.year),
        })
    }

    /// Per-sector energy services change between `first` and `last`, one entry per
    /// sector served in either year.
    pub fn summarize_sectors(
        &self,
        first: &AggregateRecord,
        last: &AggregateRecord,
    ) -> Result<Vec<SectorSummary>, EngineError> {
        validate_pair(first, last)?;

        let sectors: BTreeSet<Sector> = first
            .by_sector
            .keys()
            .chain(last.by_sector.keys())
            .copied()
            .collect();

        Ok(sectors
            .into_iter()
            .map(|sector| SectorSummary {
                region: last.region.clone(),
                sector,
                from_year: first.year,
                to_year: last.year,
                unit: last.unit,
                change: PeriodChange::between(
                    &first.sector(sector),
                    &last.sector(sector),
                    last.year - first.year,
                ),
            })
            .collect())
    }
}

fn validate_pair(prev: &AggregateRecord, curr: &AggregateRecord) -> Result<(), EngineError> {
    if prev.region != curr.region {
        return Err(EngineError::InvalidPair {
            reason: format!("regions differ ({} vs {})", prev.region, curr.region),
        });
    }
    if prev.unit != curr.unit {
        return Err(EngineError::InvalidPair {
            reason: format!(
                "units differ for {} ({} vs {})",
                curr.region, prev.unit, curr.unit
            ),
        });
    }
    if curr.year <= prev.year {
        return Err(EngineError::InvalidPair {
            reason: format!(
                "year {} does not follow year {} for {}",
                curr.year, prev.year, curr.region
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn aggregate(year: i32, fossil: f64, clean: f64, total: f64) -> AggregateRecord {
        let useful = CategoryTotals::new(fossil, clean, total);
        AggregateRecord {
            region: Region::world(),
            year,
            unit: EnergyUnit::Exajoules,
            primary: useful.scaled(2.0),
            useful,
            services: useful.scaled(0.5),
            clean_share_useful: useful.clean_share(),
            clean_share_services: useful.clean_share(),
            leverage: Metric::Defined(1.0),
            overall_efficiency: Metric::Defined(0.5),
            exergy_efficiency: Metric::Defined(0.25),
            by_source: BTreeMap::new(),
            by_sector: BTreeMap::new(),
        }
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn contraction_year_has_undefined_fossil_growth_share() {
        let prev = aggregate(2019, 200.0, 37.0, 237.0);
        let curr = aggregate(2020, 192.0, 38.0, 230.0);
        let m = DisplacementCalculator::new()
            .compute_displacement(&prev, &curr, Tier::Useful)
            .unwrap();

        assert_close(m.delta_total, -7.0);
        assert_close(m.displacement, 1.0);
        assert_eq!(m.ff_growth, Metric::Undefined);
        assert_close(m.net_change, -8.0);
        assert_close(m.displacement_rate, 100.0);
    }

    #[test]
    fn ideal_case_clean_growth_exceeds_demand_growth() {
        let prev = aggregate(2030, 180.0, 80.0, 260.0);
        let curr = aggregate(2031, 175.0, 90.0, 265.0);
        let m = DisplacementCalculator::new()
            .compute_displacement(&prev, &curr, Tier::Useful)
            .unwrap();

        assert_close(m.displacement, 10.0);
        assert_close(m.ff_growth.value().unwrap(), -100.0);
        assert_close(m.net_change, -5.0);
        assert_close(m.displacement_rate, 100.0);
    }

    #[test]
    fn normal_growth_is_mostly_fossil() {
        let prev = aggregate(2023, 180.0, 35.0, 215.0);
        let curr = aggregate(2024, 185.0, 37.0, 222.0);
        let m = DisplacementCalculator::new()
            .compute_displacement(&prev, &curr, Tier::Useful)
            .unwrap();

        assert_close(m.displacement, 2.0);
        assert_eq!(format!("{:.1}", m.ff_growth), "71.4");
        assert_close(m.net_change, 5.0);
        assert_close(m.displacement_rate, 40.0);
    }

    #[test]
    fn shrinking_clean_is_never_negative_displacement() {
        let prev = aggregate(2023, 180.0, 40.0, 220.0);
        let curr = aggregate(2024, 190.0, 35.0, 225.0);
        let m = DisplacementCalculator::new()
            .compute_displacement(&prev, &curr, Tier::Useful)
            .unwrap();
        assert_eq!(m.displacement, 0.0);
        assert_eq!(m.displacement_rate, 0.0);
    }

    #[test]
    fn flat_demand_has_undefined_fossil_growth_share() {
        let prev = aggregate(2023, 180.0, 40.0, 220.0);
        let curr = aggregate(2024, 180.0, 40.0, 220.0);
        let m = DisplacementCalculator::new()
            .compute_displacement(&prev, &curr, Tier::Useful)
            .unwrap();
        assert_eq!(m.ff_growth, Metric::Undefined);
        assert_eq!(m.displacement_rate, 0.0);
    }

    #[test]
    fn tier_selects_the_totals_compared() {
        let prev = aggregate(2023, 180.0, 35.0, 215.0);
        let curr = aggregate(2024, 185.0, 37.0, 222.0);
        let m = DisplacementCalculator::new()
            .compute_displacement(&prev, &curr, Tier::Services)
            .unwrap();
        assert_close(m.delta_total, 3.5);
        assert_close(m.displacement, 1.0);
    }

    #[test]
    fn inconsistent_deltas_are_rejected() {
        let prev = aggregate(2023, 180.0, 35.0, 215.0);
        let curr = aggregate(2024, 185.0, 37.0, 230.0);
        let result = DisplacementCalculator::new().compute_displacement(&prev, &curr, Tier::Useful);
        assert!(matches!(
            result,
            Err(EngineError::Consistency {
                source: ConsistencyError::DeltaMismatch { .. }
            })
        ));
    }

    #[test]
    fn pair_must_be_in_increasing_year_order() {
        let prev = aggregate(2024, 180.0, 35.0, 215.0);
        let curr = aggregate(2024, 185.0, 37.0, 222.0);
        let result = DisplacementCalculator::new().compute_displacement(&prev, &curr, Tier::Useful);
        assert!(matches!(result, Err(EngineError::InvalidPair { .. })));
    }

    #[test]
    fn pair_must_be_consecutive_years() {
        let prev = aggregate(2019, 100.0, 0.0, 100.0);
        let curr = aggregate(2024, 120.0, 0.0, 120.0);
        let result = DisplacementCalculator::new().compute_displacement(&prev, &curr, Tier::Useful);
        assert!(matches!(result, Err(EngineError::InvalidPair { .. })));
    }

    #[test]
    fn pair_must_share_region_and_unit() {
        let prev = aggregate(2023, 180.0, 35.0, 215.0);
        let mut curr = aggregate(2024, 185.0, 37.0, 222.0);
        curr.region = Region::new("China");
        let calculator = DisplacementCalculator::new();
        assert!(matches!(
            calculator.compute_displacement(&prev, &curr, Tier::Useful),
            Err(EngineError::InvalidPair { .. })
        ));

        let mut curr = aggregate(2024, 185.0, 37.0, 222.0);
        curr.unit = EnergyUnit::Petajoules;
        assert!(matches!(
            calculator.compute_displacement(&prev, &curr, Tier::Useful),
            Err(EngineError::InvalidPair { .. })
        ));
    }

    #[test]
    fn period_summary_reports_growth_and_share_shift() {
        let first = aggregate(2004, 90.0, 10.0, 100.0);
        let last = aggregate(2024, 120.0, 40.0, 160.0);
        let summary = DisplacementCalculator::new()
            .summarize_period(&first, &last, Tier::Useful)
            .unwrap();

        assert_close(summary.change.total_growth, 60.0);
        assert_close(summary.change.fossil_change, 30.0);
        assert_close(summary.change.clean_growth, 30.0);
        let expected_cagr = ((160.0_f64 / 100.0).powf(1.0 / 20.0) - 1.0) * 100.0;
        assert_close(summary.change.cagr.value().unwrap(), expected_cagr);
        assert_close(summary.change.fossil_share_start.value().unwrap(), 0.9);
        assert_close(summary.change.fossil_share_end.value().unwrap(), 0.75);
        assert_close(summary.change.fossil_share_change.value().unwrap(), -0.15);
    }

    #[test]
    fn period_summary_from_zero_has_undefined_cagr() {
        let first = aggregate(2004, 0.0, 0.0, 0.0);
        let last = aggregate(2024, 10.0, 5.0, 15.0);
        let summary = DisplacementCalculator::new()
            .summarize_period(&first, &last, Tier::Useful)
            .unwrap();
        assert_eq!(summary.change.cagr, Metric::Undefined);
        assert_eq!(summary.change.fossil_share_start, Metric::Undefined);
        assert_eq!(summary.change.fossil_share_change, Metric::Undefined);
    }

    #[test]
    fn sector_summaries_cover_every_sector_served() {
        let mut first = aggregate(2004, 90.0, 10.0, 100.0);
        first.by_sector = BTreeMap::from([
            (Sector::Electricity, CategoryTotals::new(8.0, 2.0, 10.0)),
            (Sector::Mechanical, CategoryTotals::new(5.0, 0.0, 5.0)),
        ]);
        let mut last = aggregate(2024, 120.0, 40.0, 160.0);
        last.by_sector = BTreeMap::from([
            (Sector::Electricity, CategoryTotals::new(8.0, 12.0, 20.0)),
            (Sector::LowTempHeat, CategoryTotals::new(1.0, 1.0, 2.0)),
        ]);

        let summaries = DisplacementCalculator::new()
            .summarize_sectors(&first, &last)
            .unwrap();
        let sectors: Vec<Sector> = summaries.iter().map(|s| s.sector).collect();
        assert_eq!(
            sectors,
            vec![Sector::Electricity, Sector::LowTempHeat, Sector::Mechanical]
        );

        let electricity = &summaries[0];
        assert_close(electricity.change.total_growth, 10.0);
        assert_close(electricity.change.clean_growth, 10.0);
        let expected_cagr = (2.0_f64.powf(1.0 / 20.0) - 1.0) * 100.0;
        assert_close(electricity.change.cagr.value().unwrap(), expected_cagr);
        assert_close(electricity.change.fossil_share_change.value().unwrap(), -0.4);

        assert_eq!(summaries[1].change.cagr, Metric::Undefined);
        assert_close(summaries[2].change.end_total, 0.0);
        assert_close(summaries[2].change.cagr.value().unwrap(), -100.0);
    }
}
