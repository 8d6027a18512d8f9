use crate::core::models::observation::ObservationPoint;
use crate::core::models::region::Region;
use crate::core::models::source::EnergySource;
use crate::core::models::units::EnergyUnit;
use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ObservationLoadError {
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("Invalid observation in '{path}' at record {record}: {message}")]
    InvalidRecord {
        path: String,
        record: usize,
        message: String,
    },
    #[error("Duplicate observation in '{path}' for {region}/{year}/{energy_source}")]
    Duplicate {
        path: String,
        region: Region,
        year: i32,
        energy_source: EnergySource,
    },
}

#[derive(Debug, Deserialize)]
struct RawObservation {
    region: String,
    year: i32,
    source: String,
    quantity: f64,
    unit: String,
}

/// A validated primary-energy series. Every point has a finite, non-negative
/// quantity and `(region, year, source)` keys are unique.
#[derive(Debug, Clone, Default)]
pub struct ObservationSet {
    points: Vec<ObservationPoint>,
}

impl ObservationSet {
    pub fn load(path: &Path) -> Result<Self, ObservationLoadError> {
        let label = path.to_string_lossy().to_string();
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| ObservationLoadError::Csv {
                path: label.clone(),
                source: e,
            })?;
        Self::from_csv_reader(reader, &label)
    }

    pub fn from_reader<R: Read>(rdr: R, label: &str) -> Result<Self, ObservationLoadError> {
        let reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
        Self::from_csv_reader(reader, label)
    }

    fn from_csv_reader<R: Read>(
        mut reader: csv::Reader<R>,
        label: &str,
    ) -> Result<Self, ObservationLoadError> {
        let mut points = Vec::new();
        for (idx, result) in reader.deserialize::<RawObservation>().enumerate() {
            let raw = result.map_err(|e| ObservationLoadError::Csv {
                path: label.to_string(),
                source: e,
            })?;
            let invalid = |message: String| ObservationLoadError::InvalidRecord {
                path: label.to_string(),
                record: idx + 1,
                message,
            };

            let source = raw
                .source
                .parse::<EnergySource>()
                .map_err(|e| invalid(e.to_string()))?;
            let unit = raw
                .unit
                .parse::<EnergyUnit>()
                .map_err(|e| invalid(e.to_string()))?;
            if raw.region.trim().is_empty() {
                return Err(invalid("empty region name".to_string()));
            }

            let point = ObservationPoint::new(
                Region::new(raw.region),
                raw.year,
                source,
                raw.quantity,
                unit,
            );
            if !point.is_valid_quantity() {
                return Err(invalid(format!(
                    "quantity must be finite and non-negative, found {}",
                    raw.quantity
                )));
            }
            points.push(point);
        }

        let set = Self::from_points(points).map_err(|dup| ObservationLoadError::Duplicate {
            path: label.to_string(),
            region: dup.region,
            year: dup.year,
            energy_source: dup.source,
        })?;
        debug!("Loaded {} observation(s) from '{}'.", set.len(), label);
        Ok(set)
    }

    /// Builds a set from in-memory points, returning the first duplicated key on failure.
    pub fn from_points(points: Vec<ObservationPoint>) -> Result<Self, ObservationPoint> {
        let mut seen = HashSet::with_capacity(points.len());
        for point in &points {
            if !seen.insert((point.region.clone(), point.year, point.source)) {
                return Err(point.clone());
            }
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[ObservationPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn regions(&self) -> BTreeSet<&Region> {
        self.points.iter().map(|p| &p.region).collect()
    }

    pub fn years(&self) -> BTreeSet<i32> {
        self.points.iter().map(|p| p.year).collect()
    }

    /// Keeps only points whose region is in `regions`.
    pub fn retain_regions(&mut self, regions: &[Region]) {
        self.points.retain(|p| regions.contains(&p.region));
    }
}
