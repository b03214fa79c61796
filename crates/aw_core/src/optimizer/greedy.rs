//! Deterministic greedy incumbent.
//!
//! Runs before the exact solve so that a budget expiry can still hand back a
//! feasible selection. Two phases: first pick matches that satisfy
//! outstanding hard demands (team appearances, per-team role coverage), then
//! fill the remaining picks keeping the participation spread low. All ties
//! break on the lower catalog index, so the incumbent is reproducible.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::catalog::PatternCatalog;
use crate::coverage::constrained_roles;
use crate::metrics::spread;
use crate::models::{Role, TeamId};

use super::params::SelectionParams;

/// Build a feasible selection heuristically. Returns ascending catalog
/// indices, or `None` when the heuristic cannot satisfy the hard constraints
/// (which does not prove infeasibility).
pub fn greedy_selection(catalog: &PatternCatalog, params: &SelectionParams) -> Option<Vec<usize>> {
    let k = params.match_count;
    let n = catalog.match_count();
    debug_assert!(k >= 1 && k <= n, "parameters must be validated first");

    let mut selected: Vec<usize> = Vec::with_capacity(k);
    let mut in_selection = vec![false; n];
    let mut participation: BTreeMap<TeamId, u32> =
        catalog.team_ids().map(|team| (team, 0)).collect();

    // Outstanding demands. Aiming to cover every constrained pair is
    // stronger than the cap requires; the final verification applies the
    // real cap.
    let mut teams_needed: BTreeSet<TeamId> = if params.require_every_team {
        catalog.team_ids().collect()
    } else {
        BTreeSet::new()
    };
    let mut pairs_needed: BTreeSet<(TeamId, Role)> = constrained_roles(catalog, params.counting_policy)
        .into_iter()
        .flat_map(|(team, roles)| roles.into_iter().map(move |role| (team, role)))
        .collect();

    // Phase 1: satisfy demands, most-helpful match first.
    while selected.len() < k && (!teams_needed.is_empty() || !pairs_needed.is_empty()) {
        let mut best: Option<(usize, usize, usize)> = None;
        for m in 0..n {
            if in_selection[m] {
                continue;
            }
            let record = &catalog.matches()[m];
            let team_gain = record
                .teams()
                .iter()
                .filter(|team| teams_needed.contains(team))
                .count();
            let pair_gain = record
                .assignment
                .iter()
                .map(|slot| (slot.team_id, slot.role))
                .collect::<BTreeSet<_>>()
                .iter()
                .filter(|pair| pairs_needed.contains(pair))
                .count();
            // Team appearances first, then pair coverage; scanning in
            // ascending order keeps the lowest index on ties.
            let better = match best {
                None => true,
                Some((bt, bp, _)) => (team_gain, pair_gain) > (bt, bp),
            };
            if better {
                best = Some((team_gain, pair_gain, m));
            }
        }

        match best {
            Some((team_gain, pair_gain, m)) if team_gain + pair_gain > 0 => {
                pick(catalog, m, &mut selected, &mut in_selection, &mut participation);
                for team in catalog.participants(m) {
                    teams_needed.remove(team);
                }
                for slot in &catalog.matches()[m].assignment {
                    pairs_needed.remove(&(slot.team_id, slot.role));
                }
            }
            // No remaining match helps (e.g. a structurally uncoverable
            // pair); move on and let the verification decide.
            _ => break,
        }
    }

    // Phase 2: fill up to k, keeping participation counts close together.
    while selected.len() < k {
        let mut best: Option<(u32, usize)> = None;
        for m in 0..n {
            if in_selection[m] {
                continue;
            }
            let mut counts = participation.clone();
            for team in catalog.participants(m) {
                *counts.entry(*team).or_insert(0) += 1;
            }
            let values: Vec<u32> = counts.values().copied().collect();
            let resulting = spread(&values).unwrap_or(0);
            let better = match best {
                None => true,
                Some((bs, _)) => resulting < bs,
            };
            if better {
                best = Some((resulting, m));
            }
        }
        match best {
            Some((_, m)) => pick(catalog, m, &mut selected, &mut in_selection, &mut participation),
            None => break,
        }
    }

    selected.sort_unstable();
    if satisfies_hard_constraints(catalog, params, &selected) {
        debug!(picked = selected.len(), "greedy incumbent found");
        Some(selected)
    } else {
        debug!("greedy produced no feasible incumbent");
        None
    }
}

fn pick(
    catalog: &PatternCatalog,
    m: usize,
    selected: &mut Vec<usize>,
    in_selection: &mut [bool],
    participation: &mut BTreeMap<TeamId, u32>,
) {
    in_selection[m] = true;
    selected.push(m);
    for team in catalog.participants(m) {
        *participation.entry(*team).or_insert(0) += 1;
    }
}

/// Check a concrete selection against the hard constraints: exact size,
/// distinct valid indices, participation floor, per-team coverage cap.
pub(crate) fn satisfies_hard_constraints(
    catalog: &PatternCatalog,
    params: &SelectionParams,
    selection: &[usize],
) -> bool {
    if selection.len() != params.match_count {
        return false;
    }
    let distinct: BTreeSet<usize> = selection.iter().copied().collect();
    if distinct.len() != selection.len() || selection.iter().any(|&m| m >= catalog.match_count()) {
        return false;
    }

    if params.require_every_team {
        for team in catalog.team_ids() {
            if !selection.iter().any(|&m| catalog.participants(m).contains(&team)) {
                return false;
            }
        }
    }

    for (team, roles) in constrained_roles(catalog, params.counting_policy) {
        let uncovered = roles
            .iter()
            .filter(|&&role| {
                selection
                    .iter()
                    .all(|&m| catalog.matches()[m].slot_count(team, role) == 0)
            })
            .count();
        if uncovered > params.max_zero_count_roles as usize {
            return false;
        }
    }

    true
}
