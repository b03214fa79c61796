//! ILP-based match selection.
//!
//! [`select_matches`] picks an exact-size subset of the catalog that spreads
//! participation evenly across teams and role exposure evenly within each
//! role, subject to a per-team cap on uncovered roles. The model is a pure
//! 0/1 program over one decision variable per match; participation and
//! slot counts are linear in those variables, so no quadratic terms appear.
//!
//! A greedy incumbent is computed up front. When a wall-clock budget is set
//! and expires, the incumbent (if any) is returned as `FEASIBLE` instead of
//! failing the run.

mod greedy;
mod model;
mod params;
mod solve;

#[cfg(test)]
mod tests;

pub use model::evaluate_objective;
pub use params::SelectionParams;
pub use solve::{select_matches, InfeasibilityHint, SelectionOutcome, SolveStatus};

pub use greedy::greedy_selection;
