//! # Core Module
//!
//! Stateless building blocks of the energy-conversion engine.
//!
//! ## Architecture
//!
//! - **Value Types** ([`models`]) - Energy sources and their fossil/clean class, units, regions, observations
//! - **Coefficient Tables** ([`coefficients`]) - Efficiency, exergy and rebound tables and the
//!   pure lookups resolving them per source, year and region
//! - **Input** ([`io`]) - Loading and validating observation series
//!
//! Nothing in this module holds mutable state: tables are loaded once and read
//! concurrently by every calculation.

pub mod coefficients;
pub mod io;
pub mod models;
