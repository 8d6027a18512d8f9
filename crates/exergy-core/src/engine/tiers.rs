use super::error::EngineError;
use super::records::TierRecord;
use crate::core::coefficients::exergy::ExergyWeighter;
use crate::core::coefficients::rebound::ReboundAdjuster;
use crate::core::coefficients::resolver::CoefficientResolver;
use crate::core::models::observation::ObservationPoint;
use crate::core::models::region::{Region, RegionRegistry};
use crate::core::models::source::EnergySource;
use tracing::trace;

/// Converts one primary-energy data point into its useful and services tiers.
///
/// Stateless; borrows the read-only tables owned by an [`Engine`](super::context::Engine).
#[derive(Clone, Copy)]
pub struct TierCalculator<'a> {
    resolver: &'a CoefficientResolver,
    weighter: &'a ExergyWeighter,
    rebound: &'a ReboundAdjuster,
    registry: &'a RegionRegistry,
}

impl<'a> TierCalculator<'a> {
    pub fn new(
        resolver: &'a CoefficientResolver,
        weighter: &'a ExergyWeighter,
        rebound: &'a ReboundAdjuster,
        registry: &'a RegionRegistry,
    ) -> Self {
        Self {
            resolver,
            weighter,
            rebound,
            registry,
        }
    }

    /// `useful = primary * efficiency * (1 - rebound)`, `services = useful * exergy`,
    /// with `services` also split across the source's end-use sectors.
    ///
    /// `primary_qty` is taken to be in the region's reporting unit.
    pub fn compute_tiers(
        &self,
        region: &Region,
        year: i32,
        source: EnergySource,
        primary_qty: f64,
    ) -> Result<TierRecord, EngineError> {
        if !(primary_qty.is_finite() && primary_qty >= 0.0) {
            return Err(EngineError::InvalidQuantity {
                region: region.clone(),
                year,
                energy_source: source,
                value: primary_qty,
            });
        }

        let efficiency = self.resolver.resolve_efficiency(source, year, region)?;
        let sector_weights = self.weighter.sector_weights(source)?;
        let exergy_factor: f64 = sector_weights.values().sum();
        let region_class = self.registry.class_of(region);
        let rebound_rate = self.rebound.rate_for(region_class);

        let useful_gross = primary_qty * efficiency;
        let useful = self.rebound.apply_rebound(useful_gross, region_class);
        let services = useful * exergy_factor;
        let services_by_sector = sector_weights
            .into_iter()
            .map(|(sector, weight)| (sector, useful * weight))
            .collect();

        trace!(
            %region,
            year,
            %source,
            efficiency,
            rebound_rate,
            exergy_factor,
            "Computed tiers."
        );

        Ok(TierRecord {
            region: region.clone(),
            year,
            source,
            unit: region.reporting_unit(),
            primary: primary_qty,
            useful,
            services,
            efficiency,
            rebound_rate,
            exergy_factor,
            services_by_sector,
        })
    }

    /// Like [`compute_tiers`](Self::compute_tiers), converting the observation
    /// into the region's reporting unit first.
    pub fn compute_observation(&self, point: &ObservationPoint) -> Result<TierRecord, EngineError> {
        let target = point.region.reporting_unit();
        let primary = point.unit.convert(point.quantity, target);
        self.compute_tiers(&point.region, point.year, point.source, primary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::coefficients::exergy::ExergyError;
    use crate::core::coefficients::params::{CoefficientTables, ReboundConfig};
    use crate::core::coefficients::resolver::CoefficientError;
    use crate::core::models::region::{RegionClass, RegionInfo};
    use crate::core::models::units::EnergyUnit;

    struct Fixture {
        resolver: CoefficientResolver,
        weighter: ExergyWeighter,
        rebound: ReboundAdjuster,
        registry: RegionRegistry,
    }

    impl Fixture {
        fn new(tables: &CoefficientTables) -> Self {
            let mut registry = tables.region_registry();
            registry.insert(
                Region::new("India"),
                RegionInfo {
                    class: Some(RegionClass::Developing),
                    reconcile: true,
                },
            );
            Self {
                resolver: CoefficientResolver::from_profile(&tables.efficiency),
                weighter: ExergyWeighter::new(&tables.exergy),
                rebound: ReboundAdjuster::new(tables.rebound),
                registry,
            }
        }

        fn calculator(&self) -> TierCalculator<'_> {
            TierCalculator::new(&self.resolver, &self.weighter, &self.rebound, &self.registry)
        }
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn solar_follows_the_tier_algorithm() {
        let fixture = Fixture::new(&CoefficientTables::default());
        let record = fixture
            .calculator()
            .compute_tiers(&Region::world(), 2024, EnergySource::Solar, 10.0)
            .unwrap();

        assert_eq!(record.unit, EnergyUnit::Exajoules);
        assert_close(record.efficiency, 0.90);
        assert_close(record.rebound_rate, 0.07);
        assert_close(record.useful, 10.0 * 0.90 * 0.93);
        assert_close(record.exergy_factor, 1.0);
        assert_close(record.services, record.useful);
    }

    #[test]
    fn services_split_by_sector_sums_to_services() {
        let fixture = Fixture::new(&CoefficientTables::default());
        let calculator = fixture.calculator();
        for source in EnergySource::ALL {
            let record = calculator
                .compute_tiers(&Region::world(), 2024, source, 50.0)
                .unwrap();
            assert!(!record.services_by_sector.is_empty(), "{source}");
            let sum: f64 = record.services_by_sector.values().sum();
            assert_close(sum, record.services);
            assert!(record.services_by_sector.values().all(|&v| v >= 0.0));
        }
    }

    #[test]
    fn tiers_are_monotonically_bounded() {
        let fixture = Fixture::new(&CoefficientTables::default());
        let calculator = fixture.calculator();
        for source in EnergySource::ALL {
            for year in [1965, 1990, 2024] {
                let record = calculator
                    .compute_tiers(&Region::world(), year, source, 123.4)
                    .unwrap();
                assert!(record.services <= record.useful, "{source} {year}");
                assert!(record.useful <= record.primary, "{source} {year}");
                assert!(record.services >= 0.0);
            }
        }
    }

    #[test]
    fn zero_primary_yields_zero_tiers() {
        let fixture = Fixture::new(&CoefficientTables::default());
        let record = fixture
            .calculator()
            .compute_tiers(&Region::world(), 2024, EnergySource::Coal, 0.0)
            .unwrap();
        assert_eq!(record.useful, 0.0);
        assert_eq!(record.services, 0.0);
    }

    #[test]
    fn negative_primary_is_rejected() {
        let fixture = Fixture::new(&CoefficientTables::default());
        let result =
            fixture
                .calculator()
                .compute_tiers(&Region::world(), 2024, EnergySource::Coal, -1.0);
        assert!(matches!(result, Err(EngineError::InvalidQuantity { .. })));
    }

    #[test]
    fn region_class_selects_rebound_rate() {
        let mut tables = CoefficientTables::default();
        tables.rebound = ReboundConfig {
            global_rate: 0.07,
            developed: None,
            developing: Some(0.1),
        };
        let fixture = Fixture::new(&tables);
        let record = fixture
            .calculator()
            .compute_tiers(&Region::new("India"), 2024, EnergySource::Wind, 1000.0)
            .unwrap();
        assert_close(record.rebound_rate, 0.1);
        assert_close(record.useful, 1000.0 * 0.9 * 0.9);
        assert_eq!(record.unit, EnergyUnit::Petajoules);
    }

    #[test]
    fn missing_efficiency_propagates_unknown_source() {
        let mut tables = CoefficientTables::default();
        tables.efficiency.baseline.remove(&EnergySource::Hydro);
        let fixture = Fixture::new(&tables);
        let result =
            fixture
                .calculator()
                .compute_tiers(&Region::world(), 2024, EnergySource::Hydro, 1.0);
        assert!(matches!(
            result,
            Err(EngineError::Coefficient {
                source: CoefficientError::UnknownSource {
                    energy_source: EnergySource::Hydro
                }
            })
        ));
    }

    #[test]
    fn broken_allocation_propagates_allocation_error() {
        let mut tables = CoefficientTables::default();
        tables
            .exergy
            .allocation
            .get_mut(&EnergySource::Wind)
            .unwrap()
            .insert(crate::core::coefficients::params::Sector::LowTempHeat, 0.2);
        let fixture = Fixture::new(&tables);
        let result =
            fixture
                .calculator()
                .compute_tiers(&Region::world(), 2024, EnergySource::Wind, 1.0);
        assert!(matches!(
            result,
            Err(EngineError::Exergy {
                source: ExergyError::Allocation { .. }
            })
        ));
    }

    #[test]
    fn observation_is_converted_to_reporting_unit() {
        let fixture = Fixture::new(&CoefficientTables::default());
        let point = ObservationPoint::new(
            "World",
            2024,
            EnergySource::Nuclear,
            1000.0,
            EnergyUnit::Petajoules,
        );
        let record = fixture.calculator().compute_observation(&point).unwrap();
        assert_eq!(record.unit, EnergyUnit::Exajoules);
        assert_close(record.primary, 1.0);
    }
}
