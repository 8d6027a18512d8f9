//! # Exergy Core Library
//!
//! An analytics engine that traces energy from primary consumption through the
//! useful energy delivered by end-use devices to the thermodynamic energy
//! services (exergy) that energy actually provides, and measures how fast clean
//! sources displace fossil ones at each tier.
//!
//! ## Architectural Philosophy
//!
//! The library keeps the same three layers throughout:
//!
//! - **[`core`]: The Foundation.** Stateless value types (`EnergySource`, `Region`,
//!   `EnergyUnit`), the read-only coefficient tables with their resolvers, and
//!   observation loading.
//!
//! - **[`engine`]: The Logic Core.** Pure calculators for tiers, aggregation and
//!   displacement, the engine configuration, progress reporting and error types.
//!   An `Engine` is built once from a validated configuration and shared freely
//!   between threads.
//!
//! - **[`workflows`]: The Public API.** Complete runs over an observation series,
//!   producing a serializable `AnalysisReport`.

pub mod core;
pub mod engine;
pub mod workflows;
