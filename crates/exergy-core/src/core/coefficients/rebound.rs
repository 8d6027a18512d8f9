use super::params::ReboundConfig;
use crate::core::models::region::RegionClass;

/// Applies the net behavioral (Jevons) response to gross useful energy.
#[derive(Debug, Clone, Copy)]
pub struct ReboundAdjuster {
    config: ReboundConfig,
}

impl ReboundAdjuster {
    pub fn new(config: ReboundConfig) -> Self {
        Self { config }
    }

    pub fn rate_for(&self, region_class: Option<RegionClass>) -> f64 {
        let class_rate = match region_class {
            Some(RegionClass::Developed) => self.config.developed,
            Some(RegionClass::Developing) => self.config.developing,
            None => None,
        };
        class_rate.unwrap_or(self.config.global_rate)
    }

    #[inline]
    pub fn apply_rebound(&self, useful_gross: f64, region_class: Option<RegionClass>) -> f64 {
        useful_gross * (1.0 - self.rate_for(region_class))
    }
}
