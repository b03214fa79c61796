//! # aw_core - Balanced Match Selection for Werewolf Tournament Logs
//!
//! This library selects a fixed-size, statistically balanced subset of
//! played werewolf tournament matches from a JSON match catalog. Selection
//! is an integer linear program that evens out per-team participation and
//! per-role exposure while capping, per team, how many of its roles the
//! final slate may leave unplayed.
//!
//! ## Features
//! - Deterministic end to end (same catalog + parameters = same selection)
//! - Pure-Rust solver backend, no native library required
//! - Wall-clock budget with a greedy fallback selection
//! - Structured reports: distributions, spreads, infeasibility hints

pub mod catalog;
pub mod coverage;
pub mod error;
pub mod metrics;
pub mod models;
pub mod optimizer;
pub mod report;

// Re-export the main pipeline types
pub use catalog::PatternCatalog;
pub use coverage::CountingPolicy;
pub use error::{CatalogError, ParameterError};
pub use optimizer::{
    select_matches, InfeasibilityHint, SelectionOutcome, SelectionParams, SolveStatus,
};
pub use report::SelectionReport;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
