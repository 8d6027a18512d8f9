//! # Coefficients Module
//!
//! The read-only coefficient tables that drive the Primary → Useful → Services
//! conversion, and the three pure lookups built on top of them.
//!
//! ## Key Components
//!
//! - [`params`] - Table structures, range validation and the built-in defaults
//! - [`resolver`] - Efficiency resolution as an ordered chain of resolvers
//!   (regional override, temporal profile, global baseline)
//! - [`exergy`] - Sector-weighted exergy quality factor per source
//! - [`rebound`] - Net behavioral correction applied to useful energy
//!
//! ## Usage
//!
//! ```ignore
//! use exergy::core::coefficients::{params::CoefficientTables, resolver::CoefficientResolver};
//!
//! let tables = CoefficientTables::default();
//! let resolver = CoefficientResolver::from_profile(&tables.efficiency);
//! let efficiency = resolver.resolve_efficiency(EnergySource::Coal, 2024, &Region::world())?;
//! ```

pub mod exergy;
pub mod params;
pub mod rebound;
pub mod resolver;
