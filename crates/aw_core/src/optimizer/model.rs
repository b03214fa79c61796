//! ILP formulation of the selection problem.
//!
//! One binary variable per match. Per-team participation and per-team
//! per-role slot counts are linear expressions over those binaries, never
//! separate decision variables. The two dispersion terms are linearized as
//! ranges with continuous bound variables: every weight is strictly
//! positive, so each bound is tight at the optimum and the objective value
//! equals the true weighted range sum.
//!
//! Coverage uses one binary indicator per constrained (team, role) pair:
//! `w ≤ count` keeps an indicator honest, `count ≤ M·w` forces it on when
//! the pair is covered, with `M` the pair's whole-catalog slot total (a
//! team may hold several slots of one role in a single match, so the
//! selection size alone would be too small a bound).

use good_lp::{
    default_solver, variable, variables, Expression, ResolutionError, Solution, SolverModel,
    Variable,
};
use tracing::debug;

use crate::catalog::PatternCatalog;
use crate::coverage::constrained_roles;
use crate::metrics::spread;
use crate::models::{Role, TeamId};

use super::params::SelectionParams;

/// Dense, index-based description of one selection run. Built once from the
/// catalog in deterministic (BTree) order; owns plain vectors so it can move
/// onto the solver thread.
#[derive(Debug, Clone)]
pub(crate) struct SelectionProblem {
    pub match_count: usize,
    pub n_matches: usize,
    teams: Vec<TeamId>,
    roles: Vec<Role>,
    /// participation[t][m] = 1.0 when team t features in match m.
    participation: Vec<Vec<f64>>,
    /// slots[t][r][m] = number of r-slots team t holds in match m.
    slots: Vec<Vec<Vec<f64>>>,
    /// constrained[t][r]: the coverage cap counts this pair.
    constrained: Vec<Vec<bool>>,
    /// pair_totals[t][r]: whole-catalog slot total, the big-M per pair.
    pair_totals: Vec<Vec<f64>>,
    max_zero: usize,
    require_every_team: bool,
    team_weight: f64,
    role_weights: Vec<f64>,
}

impl SelectionProblem {
    pub fn build(catalog: &PatternCatalog, params: &SelectionParams) -> Self {
        let teams: Vec<TeamId> = catalog.team_ids().collect();
        let roles: Vec<Role> = catalog.active_roles().iter().copied().collect();
        let n = catalog.match_count();

        let team_index: std::collections::BTreeMap<TeamId, usize> =
            teams.iter().enumerate().map(|(i, &t)| (t, i)).collect();
        let role_index: std::collections::BTreeMap<Role, usize> =
            roles.iter().enumerate().map(|(i, &r)| (r, i)).collect();

        let mut participation = vec![vec![0.0; n]; teams.len()];
        let mut slots = vec![vec![vec![0.0; n]; roles.len()]; teams.len()];
        for (m, record) in catalog.matches().iter().enumerate() {
            for team in record.teams() {
                participation[team_index[&team]][m] = 1.0;
            }
            for slot in &record.assignment {
                // Assigned roles are always active (catalog validation).
                slots[team_index[&slot.team_id]][role_index[&slot.role]][m] += 1.0;
            }
        }

        let mut constrained = vec![vec![false; roles.len()]; teams.len()];
        for (team, constrained_set) in constrained_roles(catalog, params.counting_policy) {
            for role in constrained_set {
                constrained[team_index[&team]][role_index[&role]] = true;
            }
        }

        let pair_totals: Vec<Vec<f64>> = teams
            .iter()
            .map(|&team| {
                roles
                    .iter()
                    .map(|&role| f64::from(catalog.assignment_count(team, role)))
                    .collect()
            })
            .collect();

        let role_weights = roles.iter().map(|&role| params.role_weight(role)).collect();

        SelectionProblem {
            match_count: params.match_count,
            n_matches: n,
            teams,
            roles,
            participation,
            slots,
            constrained,
            pair_totals,
            max_zero: params.max_zero_count_roles as usize,
            require_every_team: params.require_every_team,
            team_weight: params.team_balance_weight,
            role_weights,
        }
    }

    pub fn team_count(&self) -> usize {
        self.teams.len()
    }

    pub fn role_count(&self) -> usize {
        self.roles.len()
    }
}

/// Raw backend outcome, before budget/incumbent bookkeeping.
#[derive(Debug, Clone)]
pub(crate) enum RawSolve {
    Optimal { selection: Vec<usize>, objective: f64 },
    Infeasible,
    Failed(String),
}

/// Assemble and solve the ILP. Blocking; the budget handling lives in the
/// caller.
pub(crate) fn solve_ilp(prob: &SelectionProblem) -> RawSolve {
    let n_teams = prob.team_count();
    let n_roles = prob.role_count();

    // A team with no catalog appearances makes the participation floor a
    // variable-free contradiction; settle it here instead of handing the
    // backend an empty row.
    if prob.require_every_team
        && (0..n_teams).any(|t| prob.participation[t].iter().all(|&p| p == 0.0))
    {
        return RawSolve::Infeasible;
    }

    let mut vars = variables!();
    let xs: Vec<Variable> = (0..prob.n_matches)
        .map(|m| vars.add(variable().binary().name(format!("x_{m}"))))
        .collect();

    // Range bound variables. Each is tight at the optimum because its
    // weight is positive, so it stays continuous.
    let max_part = vars.add(variable().min(0.0).name("max_participation"));
    let min_part = vars.add(variable().min(0.0).name("min_participation"));
    let role_bounds: Vec<(Variable, Variable)> = (0..n_roles)
        .map(|r| {
            (
                vars.add(variable().min(0.0).name(format!("max_count_{r}"))),
                vars.add(variable().min(0.0).name(format!("min_count_{r}"))),
            )
        })
        .collect();

    // Coverage indicators, only for teams whose cap can actually bind.
    let mut coverage_groups: Vec<(usize, Vec<(usize, Variable)>)> = Vec::new();
    for t in 0..n_teams {
        let constrained_of_t: Vec<usize> = (0..n_roles).filter(|&r| prob.constrained[t][r]).collect();
        if constrained_of_t.len() > prob.max_zero {
            let ws = constrained_of_t
                .into_iter()
                .map(|r| (r, vars.add(variable().binary().name(format!("w_{t}_{r}")))))
                .collect();
            coverage_groups.push((t, ws));
        }
    }

    let participation_exprs: Vec<Expression> = (0..n_teams)
        .map(|t| {
            (0..prob.n_matches)
                .filter(|&m| prob.participation[t][m] > 0.0)
                .fold(Expression::from(0.0), |acc, m| acc + xs[m])
        })
        .collect();
    let count_exprs: Vec<Vec<Expression>> = (0..n_teams)
        .map(|t| {
            (0..n_roles)
                .map(|r| {
                    (0..prob.n_matches).fold(Expression::from(0.0), |acc, m| {
                        let c = prob.slots[t][r][m];
                        if c > 0.0 {
                            acc + c * xs[m]
                        } else {
                            acc
                        }
                    })
                })
                .collect()
        })
        .collect();

    let mut objective = Expression::from(0.0);
    if n_teams > 0 {
        objective = objective + prob.team_weight * (Expression::from(max_part) - min_part);
    }
    for (r, &(max_count, min_count)) in role_bounds.iter().enumerate() {
        objective = objective + prob.role_weights[r] * (Expression::from(max_count) - min_count);
    }

    let mut model = vars.minimise(objective.clone()).using(default_solver);

    // Exact selection size.
    let total = xs.iter().fold(Expression::from(0.0), |acc, &x| acc + x);
    model.add_constraint(total.eq(prob.match_count as f64));

    for t in 0..n_teams {
        model.add_constraint((participation_exprs[t].clone() - max_part).leq(0.0));
        model.add_constraint((Expression::from(min_part) - participation_exprs[t].clone()).leq(0.0));
        if prob.require_every_team {
            model.add_constraint(participation_exprs[t].clone().geq(1.0));
        }
    }

    for (r, &(max_count, min_count)) in role_bounds.iter().enumerate() {
        for t in 0..n_teams {
            model.add_constraint((count_exprs[t][r].clone() - max_count).leq(0.0));
            model.add_constraint((Expression::from(min_count) - count_exprs[t][r].clone()).leq(0.0));
        }
    }

    for (t, ws) in &coverage_groups {
        let needed = ws.len() - prob.max_zero;
        let sum_w = ws
            .iter()
            .fold(Expression::from(0.0), |acc, &(_, w)| acc + w);
        model.add_constraint(sum_w.geq(needed as f64));
        for &(r, w) in ws {
            // Indicator may be 1 only when the pair is covered...
            model.add_constraint((Expression::from(w) - count_exprs[*t][r].clone()).leq(0.0));
            // ...and must be 1 when it is, so the cap cannot be dodged. A
            // pair the catalog never assigns has a constant zero count and
            // needs no upper link.
            if prob.pair_totals[*t][r] > 0.0 {
                model.add_constraint(
                    (count_exprs[*t][r].clone() - prob.pair_totals[*t][r] * w).leq(0.0),
                );
            }
        }
    }

    debug!(
        matches = prob.n_matches,
        teams = n_teams,
        roles = n_roles,
        coverage_groups = coverage_groups.len(),
        "solving selection model"
    );

    match model.solve() {
        Ok(solution) => {
            let selection: Vec<usize> = xs
                .iter()
                .enumerate()
                .filter(|(_, &x)| solution.value(x) >= 0.5)
                .map(|(m, _)| m)
                .collect();
            debug_assert_eq!(selection.len(), prob.match_count);
            RawSolve::Optimal {
                selection,
                objective: solution.eval(objective),
            }
        }
        Err(ResolutionError::Infeasible) => RawSolve::Infeasible,
        Err(other) => RawSolve::Failed(other.to_string()),
    }
}

/// Objective value of a concrete selection, recomputed from the catalog.
/// The report uses this instead of trusting solver auxiliary values; on an
/// optimal solve both must agree.
pub fn evaluate_objective(
    catalog: &PatternCatalog,
    params: &SelectionParams,
    selection: &[usize],
) -> f64 {
    let teams: Vec<TeamId> = catalog.team_ids().collect();

    let participation: Vec<u32> = teams
        .iter()
        .map(|&team| {
            selection
                .iter()
                .filter(|&&m| catalog.participants(m).contains(&team))
                .count() as u32
        })
        .collect();
    let mut objective =
        params.team_balance_weight * f64::from(spread(&participation).unwrap_or(0));

    for &role in catalog.active_roles() {
        let counts: Vec<u32> = teams
            .iter()
            .map(|&team| {
                selection
                    .iter()
                    .map(|&m| catalog.matches()[m].slot_count(team, role))
                    .sum()
            })
            .collect();
        objective += params.role_weight(role) * f64::from(spread(&counts).unwrap_or(0));
    }

    objective
}
