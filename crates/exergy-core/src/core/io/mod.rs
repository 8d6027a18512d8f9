//! # IO Module
//!
//! Reading the raw primary-energy series the engine consumes. Observations are
//! tabular `(region, year, source, quantity, unit)` rows; loading validates
//! source names, units, quantities and key uniqueness before any computation.

pub mod observations;
