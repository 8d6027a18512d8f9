//! # Engine Module
//!
//! The calculators that turn primary-energy observations into useful energy,
//! energy services and year-over-year displacement metrics.
//!
//! ## Overview
//!
//! An [`Engine`](context::Engine) is built once from a validated
//! [`EngineConfig`](config::EngineConfig) and hands out borrowed, stateless
//! calculators. None of them mutate shared state, so a single engine can serve
//! any number of worker threads.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Coefficient tables, tolerances, the TOML file form and its builder
//! - **Tier Calculation** ([`tiers`]) - Primary → Useful → Services for one data point
//! - **Aggregation** ([`aggregation`]) - Fossil/clean/total reduction per `(region, year)` and
//!   world-versus-regions reconciliation
//! - **Displacement** ([`displacement`]) - Year-over-year and whole-period change metrics
//! - **Records** ([`records`]) and **Metrics** ([`metric`]) - Immutable result values and the
//!   undefined-metric sentinel
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress reporting
//! - **Error Handling** ([`error`]) - Engine errors and accounting-identity violations
//!
//! ## Error Policy
//!
//! Configuration and coefficient errors abort. Category-split and reconciliation
//! divergences are collected as [`ConsistencyError`](error::ConsistencyError) values
//! next to the result. A delta mismatch between two aggregates aborts, since it can
//! only come from an inconsistent aggregation upstream.

pub mod aggregation;
pub mod config;
pub mod context;
pub mod displacement;
pub mod error;
pub mod metric;
pub mod progress;
pub mod records;
pub mod tiers;
