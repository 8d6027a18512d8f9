//! # Workflows Module
//!
//! End-to-end runs over a whole observation series.
//!
//! ## Overview
//!
//! A workflow ties an [`Engine`](crate::engine::context::Engine) to an
//! [`ObservationSet`](crate::core::io::observations::ObservationSet) and drives
//! every calculator in order, reporting progress as it goes.
//!
//! ## Architecture
//!
//! - **Analysis Workflow** ([`analyze`]) - Tier computation in parallel, per
//!   `(region, year)` aggregation, world-versus-regions reconciliation, the
//!   per-region year-over-year displacement walk and whole-period summaries.

pub mod analyze;
