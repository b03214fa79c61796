//! Solve orchestration: greedy incumbent, worker thread, wall-clock budget,
//! status decoding and infeasibility hints.
//!
//! The exact solve runs on a named worker thread and the caller waits with
//! `recv_timeout`, so a budget expiry returns immediately instead of
//! blocking on the backend; the abandoned thread finishes on its own and
//! its late result is discarded.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{channel, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::PatternCatalog;
use crate::coverage::constrained_roles;
use crate::error::ParameterError;
use crate::models::MatchId;
use crate::models::TeamId;

use super::greedy::{greedy_selection, satisfies_hard_constraints};
use super::model::{evaluate_objective, solve_ilp, RawSolve, SelectionProblem};
use super::params::SelectionParams;

/// Outcome classification of one solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SolveStatus {
    /// Proven optimal selection.
    Optimal,
    /// A feasible selection is available but optimality was not proven
    /// (the budget expired while the exact solve was still running).
    Feasible,
    /// The constraints admit no selection at all.
    Infeasible,
    /// The budget expired with no feasible selection at hand.
    Timeout,
}

impl SolveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::Feasible => "FEASIBLE",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::Timeout => "TIMEOUT",
        }
    }

    /// Whether a selection accompanies this status.
    pub fn has_selection(&self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a solve likely came back infeasible. These are cheap
/// necessary-condition checks naming the suspected constraint, not proofs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InfeasibilityHint {
    /// The participation floor is on but the team has no catalog matches.
    TeamNeverAppears { team: TeamId, name: String },
    /// Too few selected matches to feature every team at least once.
    ParticipationPigeonhole {
        teams: usize,
        match_count: usize,
        max_teams_per_match: usize,
    },
    /// The coverage cap demands more roles than the catalog ever gives the
    /// team.
    CoverageBeyondCatalog {
        team: TeamId,
        name: String,
        required: usize,
        coverable: usize,
    },
    /// The coverage cap demands more roles than the selected matches can
    /// give the team.
    CoverageNeedsMoreMatches {
        team: TeamId,
        name: String,
        required: usize,
        match_count: usize,
        max_roles_per_match: usize,
    },
}

impl std::fmt::Display for InfeasibilityHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InfeasibilityHint::TeamNeverAppears { team, name } => write!(
                f,
                "team '{name}' (id {team}) appears in no catalog match; \
                 drop the participation floor or extend the catalog"
            ),
            InfeasibilityHint::ParticipationPigeonhole {
                teams,
                match_count,
                max_teams_per_match,
            } => write!(
                f,
                "{match_count} match(es) with at most {max_teams_per_match} teams each \
                 cannot feature all {teams} teams; raise the match count"
            ),
            InfeasibilityHint::CoverageBeyondCatalog {
                team,
                name,
                required,
                coverable,
            } => write!(
                f,
                "team '{name}' (id {team}) must cover {required} role(s) but the catalog \
                 only ever gives it {coverable}; raise the zero-count cap or use \
                 observed-only counting"
            ),
            InfeasibilityHint::CoverageNeedsMoreMatches {
                team,
                name,
                required,
                match_count,
                max_roles_per_match,
            } => write!(
                f,
                "team '{name}' (id {team}) must cover {required} role(s) but \
                 {match_count} pick(s) give it at most {max_roles_per_match} distinct \
                 role(s) each; raise the match count or the zero-count cap"
            ),
        }
    }
}

/// Result of [`select_matches`].
#[derive(Debug, Clone)]
pub struct SelectionOutcome {
    pub status: SolveStatus,
    /// Ascending catalog indices of the selected matches; present exactly
    /// when [`SolveStatus::has_selection`] holds.
    pub selected: Option<Vec<usize>>,
    /// Objective of the returned selection (the solver's value when proven
    /// optimal, recomputed for an incumbent).
    pub objective: Option<f64>,
    pub elapsed: Duration,
    /// True when the wall-clock budget expired before the exact solve
    /// finished.
    pub budget_exhausted: bool,
    pub hints: Vec<InfeasibilityHint>,
}

impl SelectionOutcome {
    /// Selected match ids in catalog order.
    pub fn selected_match_ids(&self, catalog: &PatternCatalog) -> Option<Vec<MatchId>> {
        self.selected.as_ref().map(|indices| {
            indices
                .iter()
                .map(|&m| catalog.matches()[m].match_id.clone())
                .collect()
        })
    }
}

/// Run one selection: validate parameters, compute a greedy incumbent,
/// solve the ILP (optionally under a wall-clock budget) and classify the
/// outcome.
pub fn select_matches(
    catalog: &PatternCatalog,
    params: &SelectionParams,
    budget: Option<Duration>,
) -> Result<SelectionOutcome, ParameterError> {
    params.validate(catalog)?;
    let started = Instant::now();

    let incumbent = greedy_selection(catalog, params);
    if let Some(picks) = &incumbent {
        debug!(len = picks.len(), "greedy incumbent ready");
    }

    let problem = SelectionProblem::build(catalog, params);

    let mut budget_exhausted = false;
    let raw: Option<RawSolve> = match budget {
        None => Some(
            catch_unwind(AssertUnwindSafe(|| solve_ilp(&problem)))
                .unwrap_or_else(|_| RawSolve::Failed("solver panicked".to_string())),
        ),
        Some(limit) => {
            let (tx, rx) = channel();
            thread::Builder::new()
                .name("selection-ilp".into())
                .spawn(move || {
                    let raw = catch_unwind(AssertUnwindSafe(|| solve_ilp(&problem)))
                        .unwrap_or_else(|_| RawSolve::Failed("solver panicked".to_string()));
                    let _ = tx.send(raw);
                })
                .expect("spawn selection-ilp worker");

            match rx.recv_timeout(limit) {
                Ok(raw) => Some(raw),
                Err(RecvTimeoutError::Timeout) => {
                    budget_exhausted = true;
                    warn!(
                        budget_ms = limit.as_millis() as u64,
                        "solve budget expired, abandoning exact solve"
                    );
                    None
                }
                Err(RecvTimeoutError::Disconnected) => {
                    Some(RawSolve::Failed("solver worker disconnected".to_string()))
                }
            }
        }
    };

    let elapsed = started.elapsed();
    let outcome = match raw {
        Some(RawSolve::Optimal { selection, objective }) => {
            debug_assert!(
                satisfies_hard_constraints(catalog, params, &selection),
                "solver returned a constraint-violating selection"
            );
            SelectionOutcome {
                status: SolveStatus::Optimal,
                selected: Some(selection),
                objective: Some(objective),
                elapsed,
                budget_exhausted,
                hints: Vec::new(),
            }
        }
        Some(RawSolve::Infeasible) => SelectionOutcome {
            status: SolveStatus::Infeasible,
            selected: None,
            objective: None,
            elapsed,
            budget_exhausted,
            hints: diagnose(catalog, params),
        },
        Some(RawSolve::Failed(message)) => {
            warn!(error = %message, "solver backend failed, degrading to best effort");
            best_effort(catalog, params, incumbent, elapsed, budget_exhausted)
        }
        None => best_effort(catalog, params, incumbent, elapsed, budget_exhausted),
    };

    info!(
        status = %outcome.status,
        objective = ?outcome.objective,
        elapsed_ms = outcome.elapsed.as_millis() as u64,
        "selection finished"
    );
    Ok(outcome)
}

/// No exact answer: hand back the incumbent as `FEASIBLE`, or `TIMEOUT`
/// when even the greedy found nothing.
fn best_effort(
    catalog: &PatternCatalog,
    params: &SelectionParams,
    incumbent: Option<Vec<usize>>,
    elapsed: Duration,
    budget_exhausted: bool,
) -> SelectionOutcome {
    match incumbent {
        Some(picks) => {
            let objective = evaluate_objective(catalog, params, &picks);
            SelectionOutcome {
                status: SolveStatus::Feasible,
                selected: Some(picks),
                objective: Some(objective),
                elapsed,
                budget_exhausted,
                hints: Vec::new(),
            }
        }
        None => SelectionOutcome {
            status: SolveStatus::Timeout,
            selected: None,
            objective: None,
            elapsed,
            budget_exhausted,
            hints: diagnose(catalog, params),
        },
    }
}

/// Necessary-condition screening for an over-constrained run.
pub(crate) fn diagnose(catalog: &PatternCatalog, params: &SelectionParams) -> Vec<InfeasibilityHint> {
    let mut hints = Vec::new();

    if params.require_every_team {
        for team in catalog.team_ids() {
            if catalog.appearance_count(team) == 0 {
                hints.push(InfeasibilityHint::TeamNeverAppears {
                    team,
                    name: catalog.team_name(team).unwrap_or_default().to_string(),
                });
            }
        }
        if params.match_count * catalog.max_teams_per_match() < catalog.team_count() {
            hints.push(InfeasibilityHint::ParticipationPigeonhole {
                teams: catalog.team_count(),
                match_count: params.match_count,
                max_teams_per_match: catalog.max_teams_per_match(),
            });
        }
    }

    for (team, roles) in constrained_roles(catalog, params.counting_policy) {
        if roles.len() <= params.max_zero_count_roles as usize {
            continue;
        }
        let required = roles.len() - params.max_zero_count_roles as usize;
        let coverable = roles
            .iter()
            .filter(|&&role| catalog.assignment_count(team, role) > 0)
            .count();
        let name = catalog.team_name(team).unwrap_or_default().to_string();

        if required > coverable {
            hints.push(InfeasibilityHint::CoverageBeyondCatalog {
                team,
                name,
                required,
                coverable,
            });
            continue;
        }

        // Per selected match the team gains at most as many new roles as it
        // holds distinct roles in that match.
        let max_roles_per_match = catalog
            .matches()
            .iter()
            .map(|record| {
                record
                    .assignment
                    .iter()
                    .filter(|slot| slot.team_id == team)
                    .map(|slot| slot.role)
                    .collect::<std::collections::BTreeSet<_>>()
                    .len()
            })
            .max()
            .unwrap_or(0);
        if required > params.match_count * max_roles_per_match {
            hints.push(InfeasibilityHint::CoverageNeedsMoreMatches {
                team,
                name,
                required,
                match_count: params.match_count,
                max_roles_per_match,
            });
        }
    }

    hints
}
