use super::aggregation::AggregationEngine;
use super::config::EngineConfig;
use super::displacement::DisplacementCalculator;
use super::tiers::TierCalculator;
use crate::core::coefficients::exergy::ExergyWeighter;
use crate::core::coefficients::rebound::ReboundAdjuster;
use crate::core::coefficients::resolver::CoefficientResolver;
use crate::core::models::region::RegionRegistry;
use tracing::debug;

/// Owns the calculators built from one validated [`EngineConfig`]. Every
/// accessor hands out a borrowed, stateless view, so a single `Engine` can be
/// shared across worker threads.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    resolver: CoefficientResolver,
    weighter: ExergyWeighter,
    rebound: ReboundAdjuster,
    registry: RegionRegistry,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let tables = &config.tables;
        let resolver = CoefficientResolver::from_profile(&tables.efficiency);
        let weighter = ExergyWeighter::with_tolerance(&tables.exergy, config.tolerances.allocation);
        let rebound = ReboundAdjuster::new(tables.rebound);
        let registry = tables.region_registry();
        debug!(
            chain = ?resolver.links().collect::<Vec<_>>(),
            regions = registry.len(),
            "Engine initialized."
        );
        Self {
            config,
            resolver,
            weighter,
            rebound,
            registry,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &RegionRegistry {
        &self.registry
    }

    pub fn resolver(&self) -> &CoefficientResolver {
        &self.resolver
    }

    pub fn weighter(&self) -> &ExergyWeighter {
        &self.weighter
    }

    pub fn tiers(&self) -> TierCalculator<'_> {
        TierCalculator::new(&self.resolver, &self.weighter, &self.rebound, &self.registry)
    }

    pub fn aggregation(&self) -> AggregationEngine {
        AggregationEngine::new(self.config.tolerances.category_split)
    }

    pub fn displacement(&self) -> DisplacementCalculator {
        DisplacementCalculator::new()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::region::Region;
    use crate::core::models::source::EnergySource;
    use crate::engine::config::EngineConfigBuilder;

    #[test]
    fn engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
    }

    #[test]
    fn default_engine_resolves_every_source() {
        let engine = Engine::default();
        for source in EnergySource::ALL {
            let record = engine
                .tiers()
                .compute_tiers(&Region::world(), 2024, source, 1.0)
                .unwrap();
            assert!(record.useful > 0.0, "{source}");
        }
    }

    #[test]
    fn aggregation_uses_configured_split_tolerance() {
        let config = EngineConfigBuilder::new()
            .builtin_tables()
            .split_tolerance(0.0)
            .build()
            .unwrap();
        let engine = Engine::new(config);
        assert_eq!(engine.config().tolerances.category_split, 0.0);
        assert_eq!(
            engine.resolver().links().collect::<Vec<_>>(),
            vec!["regional", "temporal", "baseline"]
        );
    }
}
