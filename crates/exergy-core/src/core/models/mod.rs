//! # Models Module
//!
//! Value types shared by every layer of the engine: energy sources and their
//! fossil/clean classification, energy units with the fixed EJ/PJ scale, regions
//! with their economic class, and the raw observation point.

pub mod observation;
pub mod region;
pub mod source;
pub mod units;
