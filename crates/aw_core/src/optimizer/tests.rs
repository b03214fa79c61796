//! Scenario tests for the full selection pipeline, from catalog to outcome.

use std::collections::BTreeSet;
use std::time::Duration;

use super::greedy::satisfies_hard_constraints;
use super::{evaluate_objective, select_matches, InfeasibilityHint, SelectionParams, SolveStatus};
use crate::catalog::PatternCatalog;
use crate::coverage::{zero_count_roles, CountingPolicy};
use crate::error::ParameterError;
use crate::models::{MatchRecord, PatternDocument, Role, RoleSlots, SlotAssignment, TeamId};

/// (seer, villager, werewolf) cast per match. Only {game1, game2, game3}
/// hands every team all three roles, so it is the unique feasible 3-subset
/// under a zero-count cap of 0.
const PERMUTATION_CASTS: [(TeamId, TeamId, TeamId); 5] =
    [(0, 1, 2), (2, 0, 1), (1, 2, 0), (0, 2, 1), (1, 0, 2)];

fn trio_document(n_teams: u32, casts: &[(TeamId, TeamId, TeamId)]) -> PatternDocument {
    let trio: RoleSlots = [(Role::Seer, 1), (Role::Villager, 1), (Role::Werewolf, 1)]
        .into_iter()
        .collect();
    PatternDocument {
        idx_team_map: (0..n_teams).map(|t| (t, format!("team{t}"))).collect(),
        role_num_map: [("trio".to_string(), trio)].into_iter().collect(),
        pattern_of_matches: casts
            .iter()
            .enumerate()
            .map(|(i, &(seer, villager, werewolf))| MatchRecord {
                match_id: format!("game{}", i + 1),
                config_id: "trio".into(),
                assignment: vec![
                    SlotAssignment { team_id: seer, role: Role::Seer },
                    SlotAssignment { team_id: villager, role: Role::Villager },
                    SlotAssignment { team_id: werewolf, role: Role::Werewolf },
                ],
            })
            .collect(),
    }
}

fn trio_catalog(n_teams: u32, casts: &[(TeamId, TeamId, TeamId)]) -> PatternCatalog {
    PatternCatalog::from_document(trio_document(n_teams, casts)).unwrap()
}

fn permutation_catalog() -> PatternCatalog {
    trio_catalog(3, &PERMUTATION_CASTS)
}

/// Three two-slot matches over teams alpha, beta, gamma. Gamma plays only
/// in game3 and only as SEER; alpha takes the leftover WEREWOLF slots.
fn uneven_duel_catalog() -> PatternCatalog {
    let duel: RoleSlots = [(Role::Seer, 1), (Role::Werewolf, 1)].into_iter().collect();
    let casts: [(TeamId, TeamId); 3] = [(0, 1), (1, 0), (2, 0)];
    let doc = PatternDocument {
        idx_team_map: [(0, "alpha".to_string()), (1, "beta".to_string()), (2, "gamma".to_string())]
            .into_iter()
            .collect(),
        role_num_map: [("duel".to_string(), duel)].into_iter().collect(),
        pattern_of_matches: casts
            .iter()
            .enumerate()
            .map(|(i, &(seer, werewolf))| MatchRecord {
                match_id: format!("game{}", i + 1),
                config_id: "duel".into(),
                assignment: vec![
                    SlotAssignment { team_id: seer, role: Role::Seer },
                    SlotAssignment { team_id: werewolf, role: Role::Werewolf },
                ],
            })
            .collect(),
    };
    PatternCatalog::from_document(doc).unwrap()
}

#[test]
fn test_unique_feasible_subset_is_found() {
    let catalog = permutation_catalog();
    let params = SelectionParams::new(3);

    // Brute force over all C(5, 3) subsets confirms the fixture admits
    // exactly one feasible selection.
    let mut feasible: Vec<Vec<usize>> = Vec::new();
    for a in 0..5 {
        for b in (a + 1)..5 {
            for c in (b + 1)..5 {
                let picks = vec![a, b, c];
                if satisfies_hard_constraints(&catalog, &params, &picks) {
                    feasible.push(picks);
                }
            }
        }
    }
    assert_eq!(feasible, vec![vec![0, 1, 2]]);

    let outcome = select_matches(&catalog, &params, None).unwrap();
    assert_eq!(outcome.status, SolveStatus::Optimal);
    assert_eq!(outcome.selected, Some(vec![0, 1, 2]));
    // Perfectly balanced: every team plays every role exactly once.
    assert!(outcome.objective.unwrap().abs() < 1e-6);
}

#[test]
fn test_selects_exact_count_of_distinct_matches() {
    let catalog = permutation_catalog();
    let mut params = SelectionParams::new(4);
    params.max_zero_count_roles = 6;

    let outcome = select_matches(&catalog, &params, None).unwrap();
    assert_eq!(outcome.status, SolveStatus::Optimal);
    let picks = outcome.selected.unwrap();
    assert_eq!(picks.len(), 4);
    let distinct: BTreeSet<usize> = picks.iter().copied().collect();
    assert_eq!(distinct.len(), 4);
    assert!(picks.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(picks.iter().all(|&m| m < catalog.match_count()));
}

#[test]
fn test_large_cap_never_binds() {
    let catalog = permutation_catalog();
    // A cap at the vocabulary size excuses every role, so any pair of
    // matches is acceptable.
    let mut params = SelectionParams::new(2);
    params.max_zero_count_roles = 6;
    params.require_every_team = false;

    let outcome = select_matches(&catalog, &params, None).unwrap();
    assert_eq!(outcome.status, SolveStatus::Optimal);
    assert_eq!(outcome.selected.as_ref().map(Vec::len), Some(2));
}

#[test]
fn test_participation_floor_forces_unique_provider() {
    let catalog = uneven_duel_catalog();
    // Only game3 features gamma, and beta is absent from it, so both
    // two-match solutions pair game3 with an earlier match. Seer and
    // werewolf ranges favour {game1, game3}.
    let mut params = SelectionParams::new(2);
    params.max_zero_count_roles = 6;

    let outcome = select_matches(&catalog, &params, None).unwrap();
    assert_eq!(outcome.status, SolveStatus::Optimal);
    let picks = outcome.selected.clone().unwrap();
    assert_eq!(picks, vec![0, 2]);
    let objective = outcome.objective.unwrap();
    assert!((objective - 3.0).abs() < 1e-6);
    assert!((objective - evaluate_objective(&catalog, &params, &picks)).abs() < 1e-6);
}

#[test]
fn test_pigeonhole_infeasible_with_hint() {
    let catalog = uneven_duel_catalog();
    // One two-team match cannot feature three teams.
    let mut params = SelectionParams::new(1);
    params.max_zero_count_roles = 6;

    let outcome = select_matches(&catalog, &params, None).unwrap();
    assert_eq!(outcome.status, SolveStatus::Infeasible);
    assert_eq!(outcome.selected, None);
    assert_eq!(
        outcome.hints,
        vec![InfeasibilityHint::ParticipationPigeonhole {
            teams: 3,
            match_count: 1,
            max_teams_per_match: 2,
        }]
    );
}

#[test]
fn test_unplaced_team_reported() {
    let mut doc = trio_document(3, &PERMUTATION_CASTS);
    doc.idx_team_map.insert(9, "ghost".to_string());
    let catalog = PatternCatalog::from_document(doc).unwrap();

    let outcome = select_matches(&catalog, &SelectionParams::new(3), None).unwrap();
    assert_eq!(outcome.status, SolveStatus::Infeasible);
    assert_eq!(
        outcome.hints,
        vec![InfeasibilityHint::TeamNeverAppears { team: 9, name: "ghost".to_string() }]
    );
}

#[test]
fn test_structural_gap_under_full_vocabulary() {
    let catalog = uneven_duel_catalog();

    // Observed-only counting holds gamma to the single role it ever plays,
    // so selecting the whole catalog works.
    let params = SelectionParams::new(3);
    let outcome = select_matches(&catalog, &params, None).unwrap();
    assert_eq!(outcome.status, SolveStatus::Optimal);
    assert_eq!(outcome.selected, Some(vec![0, 1, 2]));

    // Full vocabulary demands a WEREWOLF appearance gamma can never have.
    let mut params = SelectionParams::new(3);
    params.counting_policy = CountingPolicy::FullVocabulary;
    let outcome = select_matches(&catalog, &params, None).unwrap();
    assert_eq!(outcome.status, SolveStatus::Infeasible);
    assert_eq!(
        outcome.hints,
        vec![InfeasibilityHint::CoverageBeyondCatalog {
            team: 2,
            name: "gamma".to_string(),
            required: 2,
            coverable: 1,
        }]
    );
}

#[test]
fn test_catalog_gaps_stay_absent_from_selection() {
    let catalog = uneven_duel_catalog();
    let mut params = SelectionParams::new(2);
    params.max_zero_count_roles = 6;

    let outcome = select_matches(&catalog, &params, None).unwrap();
    let picks = outcome.selected.unwrap();

    // A role a team never plays anywhere in the catalog cannot occur in a
    // selection either, so the per-team cap holds for it with room to spare.
    for (team, gaps) in zero_count_roles(&catalog, CountingPolicy::ObservedOnly) {
        for role in gaps {
            let count: u32 = picks
                .iter()
                .map(|&m| catalog.matches()[m].slot_count(team, role))
                .sum();
            assert_eq!(count, 0);
        }
    }
}

#[test]
fn test_repeated_runs_identical() {
    let catalog = permutation_catalog();
    let params = SelectionParams::new(3);

    let first = select_matches(&catalog, &params, None).unwrap();
    let second = select_matches(&catalog, &params, None).unwrap();
    assert_eq!(first.status, second.status);
    assert_eq!(first.selected, second.selected);
    assert_eq!(first.objective, second.objective);
}

#[test]
fn test_selecting_every_match_is_optimal() {
    let catalog = permutation_catalog();
    let params = SelectionParams::for_all_matches(&catalog);

    let outcome = select_matches(&catalog, &params, None).unwrap();
    assert_eq!(outcome.status, SolveStatus::Optimal);
    assert_eq!(outcome.selected, Some(vec![0, 1, 2, 3, 4]));
    // Full participation leaves only the role ranges, one per role.
    assert!((outcome.objective.unwrap() - 3.0).abs() < 1e-6);
    assert_eq!(
        outcome.selected_match_ids(&catalog),
        Some(vec![
            "game1".to_string(),
            "game2".to_string(),
            "game3".to_string(),
            "game4".to_string(),
            "game5".to_string(),
        ])
    );
}

#[test]
fn test_zero_budget_falls_back_to_incumbent() {
    let catalog = permutation_catalog();
    let params = SelectionParams::new(3);

    // The worker almost never beats a zero budget; either way the greedy
    // incumbent equals the unique feasible subset, so the selection is
    // fixed even when the status is not.
    let outcome = select_matches(&catalog, &params, Some(Duration::ZERO)).unwrap();
    assert!(outcome.status.has_selection());
    assert_eq!(outcome.selected, Some(vec![0, 1, 2]));
    assert!(outcome.objective.unwrap().abs() < 1e-6);
    if outcome.status == SolveStatus::Feasible {
        assert!(outcome.budget_exhausted);
    }
}

#[test]
fn test_generous_budget_proves_optimality() {
    let catalog = uneven_duel_catalog();
    let mut params = SelectionParams::new(2);
    params.max_zero_count_roles = 6;

    let outcome = select_matches(&catalog, &params, Some(Duration::from_secs(30))).unwrap();
    assert_eq!(outcome.status, SolveStatus::Optimal);
    assert_eq!(outcome.selected, Some(vec![0, 2]));
    assert!(!outcome.budget_exhausted);
}

#[test]
fn test_invalid_match_count_rejected() {
    let catalog = permutation_catalog();
    let err = select_matches(&catalog, &SelectionParams::new(0), None).unwrap_err();
    assert!(matches!(
        err,
        ParameterError::MatchCountOutOfRange { requested: 0, available: 5 }
    ));
}

#[cfg(all(test, feature = "proptest"))]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_catalog() -> impl Strategy<Value = PatternCatalog> {
        (3u32..6, 3usize..9).prop_flat_map(|(n_teams, n_matches)| {
            prop::collection::vec((0..n_teams, 0..n_teams, 0..n_teams), n_matches)
                .prop_map(move |casts| trio_catalog(n_teams, &casts))
        })
    }

    proptest! {
        /// Lax parameters admit every subset, so every run must prove
        /// optimality and return the requested number of distinct matches
        /// in ascending order.
        #[test]
        fn prop_lax_runs_always_optimal(catalog in arb_catalog(), k in 1usize..4) {
            let mut params = SelectionParams::new(k);
            params.max_zero_count_roles = 6;
            params.require_every_team = false;

            let outcome = select_matches(&catalog, &params, None).unwrap();
            prop_assert_eq!(outcome.status, SolveStatus::Optimal);
            let picks = outcome.selected.unwrap();
            prop_assert_eq!(picks.len(), k);
            prop_assert!(picks.windows(2).all(|pair| pair[0] < pair[1]));
            prop_assert!(picks.iter().all(|&m| m < catalog.match_count()));
        }

        /// The solver's reported objective agrees with the value recomputed
        /// from the catalog counts.
        #[test]
        fn prop_objective_matches_recomputation(catalog in arb_catalog()) {
            let mut params = SelectionParams::new(2);
            params.max_zero_count_roles = 6;
            params.require_every_team = false;

            let outcome = select_matches(&catalog, &params, None).unwrap();
            prop_assert_eq!(outcome.status, SolveStatus::Optimal);
            let picks = outcome.selected.clone().unwrap();
            let recomputed = evaluate_objective(&catalog, &params, &picks);
            prop_assert!((outcome.objective.unwrap() - recomputed).abs() < 1e-6);
        }

        /// Widening the vocabulary never removes a gap: a role a team misses
        /// under observed-only counting is still missing under the full one.
        #[test]
        fn prop_full_vocabulary_gaps_superset(catalog in arb_catalog()) {
            let observed = zero_count_roles(&catalog, CountingPolicy::ObservedOnly);
            let full = zero_count_roles(&catalog, CountingPolicy::FullVocabulary);
            for (team, gaps) in &observed {
                prop_assert!(gaps.is_subset(&full[team]));
            }
        }
    }
}
