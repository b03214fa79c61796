//! Selection run parameters and their validation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::PatternCatalog;
use crate::coverage::CountingPolicy;
use crate::error::ParameterError;
use crate::models::Role;

/// Tunable inputs of one selection run.
///
/// Parameter faults are caller mistakes and surface as
/// [`ParameterError`] before any model is built; an over-constrained but
/// well-formed run is *not* a parameter fault (it solves to `INFEASIBLE`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionParams {
    /// Exact number of matches to select.
    pub match_count: usize,
    /// Per-team cap on constrained roles left with zero occurrences in the
    /// selection.
    pub max_zero_count_roles: u32,
    /// Vocabulary the coverage cap is measured against.
    pub counting_policy: CountingPolicy,
    /// Require every mapped team to appear in at least one selected match.
    pub require_every_team: bool,
    /// Weight of the participation-balance objective term.
    pub team_balance_weight: f64,
    /// Per-role weights of the role-balance terms; absent roles weigh 1.0.
    pub role_weights: BTreeMap<Role, f64>,
}

impl SelectionParams {
    /// Parameters with the documented defaults for a given target size:
    /// strict coverage (cap 0, observed-only), participation floor on,
    /// uniform weights.
    pub fn new(match_count: usize) -> Self {
        SelectionParams {
            match_count,
            max_zero_count_roles: 0,
            counting_policy: CountingPolicy::ObservedOnly,
            require_every_team: true,
            team_balance_weight: 1.0,
            role_weights: BTreeMap::new(),
        }
    }

    /// Default run over a catalog: keep every match. Useful as a starting
    /// point that is feasible whenever the full catalog itself is.
    pub fn for_all_matches(catalog: &PatternCatalog) -> Self {
        Self::new(catalog.match_count())
    }

    /// Effective weight of a role's balance term.
    pub fn role_weight(&self, role: Role) -> f64 {
        self.role_weights.get(&role).copied().unwrap_or(1.0)
    }

    /// Fail-fast validation against a catalog.
    pub fn validate(&self, catalog: &PatternCatalog) -> Result<(), ParameterError> {
        let available = catalog.match_count();
        if self.match_count < 1 || self.match_count > available {
            return Err(ParameterError::MatchCountOutOfRange {
                requested: self.match_count,
                available,
            });
        }
        if !(self.team_balance_weight.is_finite() && self.team_balance_weight > 0.0) {
            return Err(ParameterError::NonPositiveWeight {
                name: "team balance weight",
                value: self.team_balance_weight,
            });
        }
        for (&role, &weight) in &self.role_weights {
            if !(weight.is_finite() && weight > 0.0) {
                return Err(ParameterError::NonPositiveWeight {
                    name: role.as_str(),
                    value: weight,
                });
            }
        }
        Ok(())
    }
}
