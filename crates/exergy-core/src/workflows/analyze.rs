use crate::core::io::observations::ObservationSet;
use crate::core::models::region::Region;
use crate::engine::aggregation::{Aggregation, Reconciliation};
use crate::engine::context::Engine;
use crate::engine::displacement::{DisplacementMetrics, PeriodSummary, SectorSummary};
use crate::engine::error::{ConsistencyError, EngineError};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::records::{AggregateRecord, Tier, TierRecord};
use itertools::Itertools;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOptions {
    /// Tiers for which displacement metrics and period summaries are derived.
    pub tiers: Vec<Tier>,
    pub reconcile: bool,
    pub summarize: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            tiers: vec![Tier::Useful, Tier::Services],
            reconcile: true,
            summarize: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// One record per `(region, year)`, ordered by region then year.
    pub aggregates: Vec<AggregateRecord>,
    pub displacement: Vec<DisplacementMetrics>,
    pub reconciliation: Vec<Reconciliation>,
    pub summaries: Vec<PeriodSummary>,
    /// Energy services change per end-use sector over each region's full series.
    pub sector_summaries: Vec<SectorSummary>,
    pub issues: Vec<ConsistencyError>,
}

impl AnalysisReport {
    pub fn aggregate(&self, region: &Region, year: i32) -> Option<&AggregateRecord> {
        self.aggregates
            .iter()
            .find(|a| &a.region == region && a.year == year)
    }

    pub fn displacement_for(
        &self,
        region: &Region,
        tier: Tier,
    ) -> impl Iterator<Item = &DisplacementMetrics> + '_ {
        let region = region.clone();
        self.displacement
            .iter()
            .filter(move |d| d.region == region && d.tier == tier)
    }
}

#[instrument(skip_all, name = "analysis_workflow")]
pub fn run(
    engine: &Engine,
    observations: &ObservationSet,
    options: &AnalysisOptions,
    reporter: &ProgressReporter,
) -> Result<AnalysisReport, EngineError> {
    info!(
        observations = observations.len(),
        regions = observations.regions().len(),
        "Starting analysis."
    );

    // === Phase 1: Primary -> Useful -> Services per data point ===
    let tier_records = reporter.phase("Computing Tiers", || {
        compute_tiers(engine, observations, reporter)
    })?;

    // === Phase 2: Per (region, year) aggregation ===
    let (aggregates, mut issues) =
        reporter.phase("Aggregating", || aggregate_all(engine, tier_records))?;

    // === Phase 3: World versus regions ===
    let reconciliation = if options.reconcile {
        reporter.phase("Reconciling Regions", || {
            reconcile_all(engine, &aggregates, &mut issues)
        })?
    } else {
        Vec::new()
    };

    // === Phase 4: Year-over-year displacement ===
    let (displacement, gaps) = reporter.phase("Computing Displacement", || {
        displacement_all(engine, &aggregates, &options.tiers)
    })?;
    issues.extend(gaps);

    // === Phase 5: Whole-period summaries ===
    let (summaries, sector_summaries) = if options.summarize {
        summarize_all(engine, &aggregates, &options.tiers)?
    } else {
        (Vec::new(), Vec::new())
    };

    info!(
        aggregates = aggregates.len(),
        displacement = displacement.len(),
        issues = issues.len(),
        "Analysis complete."
    );

    Ok(AnalysisReport {
        aggregates,
        displacement,
        reconciliation,
        summaries,
        sector_summaries,
        issues,
    })
}

fn compute_tiers(
    engine: &Engine,
    observations: &ObservationSet,
    reporter: &ProgressReporter,
) -> Result<Vec<TierRecord>, EngineError> {
    let points = observations.points();
    reporter.report(Progress::TaskStart {
        total_steps: points.len() as u64,
    });

    let calculator = engine.tiers();

    #[cfg(not(feature = "parallel"))]
    let iterator = points.iter();

    #[cfg(feature = "parallel")]
    let iterator = points.par_iter();

    let results: Vec<Result<TierRecord, EngineError>> = iterator
        .map(|point| {
            let result = calculator.compute_observation(point);
            reporter.report(Progress::TaskIncrement);
            result
        })
        .collect();

    reporter.report(Progress::TaskFinish);
    results.into_iter().collect()
}

fn aggregate_all(
    engine: &Engine,
    tier_records: Vec<TierRecord>,
) -> Result<(Vec<AggregateRecord>, Vec<ConsistencyError>), EngineError> {
    let mut groups: BTreeMap<(Region, i32), Vec<TierRecord>> = BTreeMap::new();
    for record in tier_records {
        groups
            .entry((record.region.clone(), record.year))
            .or_default()
            .push(record);
    }
    let groups: Vec<_> = groups.into_iter().collect();
    debug!("Aggregating {} (region, year) group(s).", groups.len());

    let aggregation = engine.aggregation();

    #[cfg(not(feature = "parallel"))]
    let iterator = groups.iter();

    #[cfg(feature = "parallel")]
    let iterator = groups.par_iter();

    let results: Vec<Result<Aggregation, EngineError>> = iterator
        .map(|((region, year), records)| aggregation.aggregate(region, *year, records))
        .collect();

    let mut aggregates = Vec::with_capacity(results.len());
    let mut issues = Vec::new();
    for result in results {
        let Aggregation {
            record,
            issues: found,
        } = result?;
        aggregates.push(record);
        issues.extend(found);
    }
    Ok((aggregates, issues))
}

fn reconcile_all(
    engine: &Engine,
    aggregates: &[AggregateRecord],
    issues: &mut Vec<ConsistencyError>,
) -> Result<Vec<Reconciliation>, EngineError> {
    let members: HashSet<&Region> = engine.registry().reconciliation_members().collect();
    if members.is_empty() {
        debug!("No regions are marked for reconciliation; skipping.");
        return Ok(Vec::new());
    }

    let aggregation = engine.aggregation();
    let tolerance = engine.config().tolerances.reconciliation;
    let mut reconciled = Vec::new();

    for world in aggregates.iter().filter(|a| a.region.is_world()) {
        let regional: Vec<AggregateRecord> = aggregates
            .iter()
            .filter(|a| a.year == world.year && members.contains(&a.region))
            .cloned()
            .collect();
        if regional.is_empty() {
            continue;
        }

        match aggregation.reconcile_regions(world, &regional, tolerance) {
            Ok(reconciliation) => reconciled.push(reconciliation),
            Err(EngineError::Consistency { source }) => {
                warn!("{}", source);
                issues.push(source);
            }
            Err(other) => return Err(other),
        }
    }
    Ok(reconciled)
}

/// Aggregates of each region as contiguous, year-ordered slices.
fn by_region(aggregates: &[AggregateRecord]) -> Vec<&[AggregateRecord]> {
    aggregates
        .chunk_by(|a, b| a.region == b.region)
        .collect()
}

/// Displacement for every consecutive year pair. A missing year splits the series
/// and is returned as a `SeriesGap` issue instead of a metric.
fn displacement_all(
    engine: &Engine,
    aggregates: &[AggregateRecord],
    tiers: &[Tier],
) -> Result<(Vec<DisplacementMetrics>, Vec<ConsistencyError>), EngineError> {
    let series = by_region(aggregates);
    let calculator = engine.displacement();

    #[cfg(not(feature = "parallel"))]
    let iterator = series.iter();

    #[cfg(feature = "parallel")]
    let iterator = series.par_iter();

    type Series = (Vec<DisplacementMetrics>, Vec<ConsistencyError>);
    let results: Vec<Result<Series, EngineError>> = iterator
        .map(|records| -> Result<Series, EngineError> {
            let mut metrics = Vec::new();
            let mut gaps = Vec::new();
            for (prev, curr) in records.iter().tuple_windows() {
                if curr.year - prev.year != 1 {
                    let gap = ConsistencyError::SeriesGap {
                        region: curr.region.clone(),
                        from_year: prev.year,
                        to_year: curr.year,
                    };
                    warn!("{}", gap);
                    gaps.push(gap);
                    continue;
                }
                for &tier in tiers {
                    metrics.push(calculator.compute_displacement(prev, curr, tier)?);
                }
            }
            Ok((metrics, gaps))
        })
        .collect();

    let mut displacement = Vec::new();
    let mut issues = Vec::new();
    for result in results {
        let (metrics, gaps) = result?;
        displacement.extend(metrics);
        issues.extend(gaps);
    }
    Ok((displacement, issues))
}

fn summarize_all(
    engine: &Engine,
    aggregates: &[AggregateRecord],
    tiers: &[Tier],
) -> Result<(Vec<PeriodSummary>, Vec<SectorSummary>), EngineError> {
    let calculator = engine.displacement();
    let mut summaries = Vec::new();
    let mut sectors = Vec::new();
    for records in by_region(aggregates) {
        if let (Some(first), Some(last)) = (records.first(), records.last()) {
            if first.year == last.year {
                continue;
            }
            for &tier in tiers {
                summaries.push(calculator.summarize_period(first, last, tier)?);
            }
            sectors.extend(calculator.summarize_sectors(first, last)?);
        }
    }
    debug!(
        "Summarized {} tier series and {} sector series.",
        summaries.len(),
        sectors.len()
    );
    Ok((summaries, sectors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::coefficients::params::{CoefficientTables, RegionEntry};
    use crate::core::models::observation::ObservationPoint;
    use crate::core::models::source::EnergySource;
    use crate::core::models::units::EnergyUnit;
    use crate::engine::config::EngineConfigBuilder;
    use crate::engine::metric::Metric;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    fn series() -> ObservationSet {
        let mut points = Vec::new();
        for (year, coal, solar) in [(2022, 160.0, 6.0), (2023, 164.0, 8.0), (2024, 165.0, 11.0)] {
            points.push(ObservationPoint::new(
                "World",
                year,
                EnergySource::Coal,
                coal,
                EnergyUnit::Exajoules,
            ));
            points.push(ObservationPoint::new(
                "World",
                year,
                EnergySource::Solar,
                solar,
                EnergyUnit::Exajoules,
            ));
            points.push(ObservationPoint::new(
                "China",
                year,
                EnergySource::Coal,
                coal * 1000.0 * 0.55,
                EnergyUnit::Petajoules,
            ));
            points.push(ObservationPoint::new(
                "Rest of World",
                year,
                EnergySource::Coal,
                coal * 1000.0 * 0.45,
                EnergyUnit::Petajoules,
            ));
            points.push(ObservationPoint::new(
                "China",
                year,
                EnergySource::Solar,
                solar * 1000.0 * 0.4,
                EnergyUnit::Petajoules,
            ));
            points.push(ObservationPoint::new(
                "Rest of World",
                year,
                EnergySource::Solar,
                solar * 1000.0 * 0.6,
                EnergyUnit::Petajoules,
            ));
        }
        ObservationSet::from_points(points).unwrap()
    }

    fn engine(reconciled: &[&str]) -> Engine {
        let mut tables = CoefficientTables::default();
        for name in reconciled {
            tables.regions.insert(
                Region::new(*name),
                RegionEntry {
                    class: None,
                    reconcile: true,
                },
            );
        }
        Engine::new(EngineConfigBuilder::new().tables(tables).build().unwrap())
    }

    #[test]
    fn run_produces_aggregates_per_region_and_year() {
        let report = run(
            &engine(&[]),
            &series(),
            &AnalysisOptions::default(),
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(report.aggregates.len(), 9);
        let world = report.aggregate(&Region::world(), 2024).unwrap();
        assert_eq!(world.unit, EnergyUnit::Exajoules);
        assert!((world.primary.total - 176.0).abs() < 1e-9);
        let china = report.aggregate(&Region::new("China"), 2024).unwrap();
        assert_eq!(china.unit, EnergyUnit::Petajoules);
        assert!(report.issues.is_empty());
        assert!(report.reconciliation.is_empty());
    }

    #[test]
    fn run_walks_consecutive_years_per_region_and_tier() {
        let report = run(
            &engine(&[]),
            &series(),
            &AnalysisOptions::default(),
            &ProgressReporter::new(),
        )
        .unwrap();

        // 3 regions x 2 year pairs x 2 tiers
        assert_eq!(report.displacement.len(), 12);
        let world_useful: Vec<_> = report
            .displacement_for(&Region::world(), Tier::Useful)
            .collect();
        assert_eq!(world_useful.len(), 2);
        assert_eq!(world_useful[0].from_year, 2022);
        assert_eq!(world_useful[1].to_year, 2024);
        for metrics in &report.displacement {
            assert!(metrics.displacement >= 0.0);
            assert!(metrics.displacement_rate >= 0.0);
        }
    }

    #[test]
    fn run_summarizes_first_to_last_year() {
        let report = run(
            &engine(&[]),
            &series(),
            &AnalysisOptions {
                tiers: vec![Tier::Primary],
                reconcile: false,
                summarize: true,
            },
            &ProgressReporter::new(),
        )
        .unwrap();

        let world = report
            .summaries
            .iter()
            .find(|s| s.region.is_world())
            .unwrap();
        assert_eq!((world.from_year, world.to_year), (2022, 2024));
        assert!((world.change.total_growth - 10.0).abs() < 1e-9);
        assert!((world.change.clean_growth - 5.0).abs() < 1e-9);
        assert!(world.change.cagr.is_defined());
        assert_eq!(report.summaries.len(), 3);
    }

    #[test]
    fn sector_totals_add_up_to_services() {
        let report = run(
            &engine(&[]),
            &series(),
            &AnalysisOptions::default(),
            &ProgressReporter::new(),
        )
        .unwrap();

        for aggregate in &report.aggregates {
            let fossil: f64 = aggregate.by_sector.values().map(|t| t.fossil).sum();
            let clean: f64 = aggregate.by_sector.values().map(|t| t.clean).sum();
            let total: f64 = aggregate.by_sector.values().map(|t| t.total).sum();
            let scale = aggregate.services.total.max(1.0);
            assert!((fossil - aggregate.services.fossil).abs() < 1e-9 * scale);
            assert!((clean - aggregate.services.clean).abs() < 1e-9 * scale);
            assert!((total - aggregate.services.total).abs() < 1e-9 * scale);
        }

        let world_sectors: Vec<_> = report
            .sector_summaries
            .iter()
            .filter(|s| s.region.is_world())
            .collect();
        assert!(!world_sectors.is_empty());
        let world = report.aggregate(&Region::world(), 2024).unwrap();
        assert_eq!(world_sectors.len(), world.by_sector.len());
        assert!(world_sectors
            .iter()
            .all(|s| (s.from_year, s.to_year) == (2022, 2024)));
    }

    #[test]
    fn missing_years_split_the_displacement_series() {
        let points = [(2019, 100.0), (2024, 120.0), (2025, 125.0)]
            .into_iter()
            .map(|(year, coal)| {
                ObservationPoint::new("World", year, EnergySource::Coal, coal, EnergyUnit::Exajoules)
            })
            .collect();
        let set = ObservationSet::from_points(points).unwrap();
        let report = run(
            &engine(&[]),
            &set,
            &AnalysisOptions::default(),
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(report.displacement.len(), 2);
        assert!(report
            .displacement
            .iter()
            .all(|d| (d.from_year, d.to_year) == (2024, 2025)));
        assert_eq!(
            report.issues,
            vec![ConsistencyError::SeriesGap {
                region: Region::world(),
                from_year: 2019,
                to_year: 2024,
            }]
        );

        let spans: Vec<_> = report.summaries.iter().map(|s| (s.from_year, s.to_year)).collect();
        assert!(!spans.is_empty() && spans.iter().all(|&span| span == (2019, 2025)));
    }

    #[test]
    fn reconciliation_passes_when_regions_cover_the_world() {
        let report = run(
            &engine(&["China", "Rest of World"]),
            &series(),
            &AnalysisOptions::default(),
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(report.reconciliation.len(), 3);
        assert!(report.issues.is_empty());
        let first = &report.reconciliation[0];
        assert_eq!(first.members.len(), 2);
        assert!(first.tiers.iter().all(|t| t.divergence < 1e-9));
    }

    #[test]
    fn reconciliation_failures_are_collected_as_issues() {
        let report = run(
            &engine(&["China"]),
            &series(),
            &AnalysisOptions::default(),
            &ProgressReporter::new(),
        )
        .unwrap();

        assert!(report.reconciliation.is_empty());
        assert_eq!(report.issues.len(), 3);
        assert!(report
            .issues
            .iter()
            .all(|i| matches!(i, ConsistencyError::RegionalReconciliation { .. })));
    }

    #[test]
    fn single_year_series_has_no_displacement() {
        let points = vec![ObservationPoint::new(
            "World",
            2024,
            EnergySource::Gas,
            140.0,
            EnergyUnit::Exajoules,
        )];
        let set = ObservationSet::from_points(points).unwrap();
        let report = run(
            &engine(&[]),
            &set,
            &AnalysisOptions::default(),
            &ProgressReporter::new(),
        )
        .unwrap();
        assert_eq!(report.aggregates.len(), 1);
        assert_eq!(report.aggregates[0].clean_share_useful, Metric::Defined(0.0));
        assert!(report.displacement.is_empty());
        assert!(report.summaries.is_empty());
    }

    #[test]
    fn missing_coefficient_aborts_the_run() {
        let mut tables = CoefficientTables::default();
        tables.efficiency.baseline.remove(&EnergySource::Solar);
        let engine = Engine::new(EngineConfigBuilder::new().tables(tables).build().unwrap());
        let result = run(
            &engine,
            &series(),
            &AnalysisOptions::default(),
            &ProgressReporter::new(),
        );
        assert!(matches!(result, Err(EngineError::Coefficient { .. })));
    }

    #[test]
    fn progress_counts_every_observation() {
        let increments = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&increments);
        let reporter = ProgressReporter::with_callback(Box::new(move |event| {
            if matches!(event, Progress::TaskIncrement) {
                counter.fetch_add(1, Ordering::Relaxed);
            }
        }));
        let observations = series();
        run(
            &engine(&[]),
            &observations,
            &AnalysisOptions::default(),
            &reporter,
        )
        .unwrap();
        assert_eq!(increments.load(Ordering::Relaxed), observations.len() as u64);
    }

    #[test]
    fn report_serializes_undefined_metrics_as_null() {
        let points = vec![ObservationPoint::new(
            "World",
            2024,
            EnergySource::Coal,
            0.0,
            EnergyUnit::Exajoules,
        )];
        let set = ObservationSet::from_points(points).unwrap();
        let report = run(
            &engine(&[]),
            &set,
            &AnalysisOptions::default(),
            &ProgressReporter::new(),
        )
        .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["aggregates"][0]["leverage"].is_null());
        assert!(json["aggregates"][0]["overall_efficiency"].is_null());
        assert_eq!(json["aggregates"][0]["useful"]["total"], 0.0);
    }
}
