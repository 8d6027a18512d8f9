use super::region::Region;
use super::source::EnergySource;
use super::units::EnergyUnit;
use serde::Serialize;

/// A single `(region, year, source) -> primary energy` data point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationPoint {
    pub region: Region,
    pub year: i32,
    pub source: EnergySource,
    pub quantity: f64,
    pub unit: EnergyUnit,
}

impl ObservationPoint {
    pub fn new(
        region: impl Into<Region>,
        year: i32,
        source: EnergySource,
        quantity: f64,
        unit: EnergyUnit,
    ) -> Self {
        Self {
            region: region.into(),
            year,
            source,
            quantity,
            unit,
        }
    }

    #[inline]
    pub fn is_valid_quantity(&self) -> bool {
        self.quantity.is_finite() && self.quantity >= 0.0
    }
}
