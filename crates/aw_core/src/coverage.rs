//! # Role Coverage Analysis
//!
//! Identifies, per team, the roles a team has never been assigned (its
//! "zero-count roles") under one of two counting policies.
//!
//! ## Background
//!
//! Tournament organizers care about gaps in the evidence: a team that never
//! played SEER tells you nothing about its SEER performance. When selecting a
//! subset of matches for analysis, the selection must not compound such gaps,
//! so the optimizer bounds how many roles each team may leave uncovered.
//! The two policies differ in what counts as a gap:
//!
//! - [`CountingPolicy::ObservedOnly`]: measure gaps against the roles
//!   actually observed somewhere in the catalog. Roles a team has never
//!   played anywhere are treated as structural (the catalog cannot fix
//!   them), not as selection gaps.
//! - [`CountingPolicy::FullVocabulary`]: measure gaps against the entire
//!   role vocabulary. Structural gaps count too, which makes tight caps
//!   honestly infeasible instead of silently ignored.
//!
//! Everything here is a pure function of the catalog; BTree containers keep
//! the iteration order stable across runs.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::catalog::PatternCatalog;
use crate::models::{Role, TeamId};

/// Which vocabulary zero-count roles are measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CountingPolicy {
    /// Gaps relative to the roles observed anywhere in the catalog.
    #[default]
    ObservedOnly,
    /// Gaps relative to the full role vocabulary.
    FullVocabulary,
}

impl CountingPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CountingPolicy::ObservedOnly => "observed-only",
            CountingPolicy::FullVocabulary => "full-vocabulary",
        }
    }
}

impl std::fmt::Display for CountingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Roles observed at least once anywhere in the catalog.
pub fn observed_roles(catalog: &PatternCatalog) -> BTreeSet<Role> {
    let mut observed = BTreeSet::new();
    for record in catalog.matches() {
        observed.extend(record.assignment.iter().map(|slot| slot.role));
    }
    observed
}

/// Per team, the roles it has been assigned at least once. Every team in the
/// catalog's team map gets an entry; a team with no matches gets an empty set.
pub fn played_roles(catalog: &PatternCatalog) -> BTreeMap<TeamId, BTreeSet<Role>> {
    let mut played: BTreeMap<TeamId, BTreeSet<Role>> =
        catalog.team_ids().map(|team| (team, BTreeSet::new())).collect();
    for record in catalog.matches() {
        for slot in &record.assignment {
            if let Some(set) = played.get_mut(&slot.team_id) {
                set.insert(slot.role);
            }
        }
    }
    played
}

/// Per team, the roles it has never been assigned under the given policy.
///
/// `FullVocabulary` output is a superset (per team) of `ObservedOnly` output:
/// widening the vocabulary can only add gaps, never remove them. A team with
/// zero matches gets the entire considered vocabulary.
pub fn zero_count_roles(
    catalog: &PatternCatalog,
    policy: CountingPolicy,
) -> BTreeMap<TeamId, BTreeSet<Role>> {
    let vocabulary: BTreeSet<Role> = match policy {
        CountingPolicy::ObservedOnly => observed_roles(catalog),
        CountingPolicy::FullVocabulary => Role::ALL.into_iter().collect(),
    };

    played_roles(catalog)
        .into_iter()
        .map(|(team, played)| {
            let zero: BTreeSet<Role> = vocabulary.difference(&played).copied().collect();
            (team, zero)
        })
        .collect()
}

/// Per team, the roles whose selection coverage the optimizer constrains.
///
/// Only active roles (slots in some used configuration) can ever be covered,
/// so the constrained set is capped there. Under `ObservedOnly` a team is
/// additionally only held to roles it has played somewhere in the catalog;
/// under `FullVocabulary` every team is held to the whole active set, so
/// structural gaps consume the per-team budget.
pub fn constrained_roles(
    catalog: &PatternCatalog,
    policy: CountingPolicy,
) -> BTreeMap<TeamId, BTreeSet<Role>> {
    let active = catalog.active_roles();
    match policy {
        CountingPolicy::ObservedOnly => played_roles(catalog)
            .into_iter()
            .map(|(team, played)| {
                let constrained: BTreeSet<Role> =
                    played.intersection(active).copied().collect();
                (team, constrained)
            })
            .collect(),
        CountingPolicy::FullVocabulary => catalog
            .team_ids()
            .map(|team| (team, active.clone()))
            .collect(),
    }
}
