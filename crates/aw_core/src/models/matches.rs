//! # Catalog Document Types
//!
//! Serde shapes of the `pattern_of_matches.json` document. These are the raw,
//! unvalidated structures: the extractor writes them, [`crate::catalog`]
//! validates them into a `PatternCatalog` before any optimization runs.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::role::Role;

/// Dense team index assigned in first-seen order by the extractor. The
/// document serializes these as string object keys; serde_json converts.
pub type TeamId = u32;

/// Game-configuration identifier, e.g. `"13player"`.
pub type ConfigId = String;

/// Raw log file reference, e.g. `"game17"`.
pub type MatchId = String;

/// One filled role slot of a match. A team holding several slots of the same
/// role in one match appears once per slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotAssignment {
    pub team_id: TeamId,
    pub role: Role,
}

/// One match record: which team filled which role slot, in slot order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub match_id: MatchId,
    pub config_id: ConfigId,
    pub assignment: Vec<SlotAssignment>,
}

impl MatchRecord {
    /// Distinct teams featured in the match.
    pub fn teams(&self) -> BTreeSet<TeamId> {
        self.assignment.iter().map(|slot| slot.team_id).collect()
    }

    /// Number of slots of `role` held by `team` in this match.
    pub fn slot_count(&self, team: TeamId, role: Role) -> u32 {
        self.assignment
            .iter()
            .filter(|slot| slot.team_id == team && slot.role == role)
            .count() as u32
    }

    pub fn features_team(&self, team: TeamId) -> bool {
        self.assignment.iter().any(|slot| slot.team_id == team)
    }
}

/// Slot counts per role for one game configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSlots {
    counts: BTreeMap<Role, u32>,
}

impl RoleSlots {
    /// Slot count for `role`; roles absent from the map have zero slots.
    pub fn slots(&self, role: Role) -> u32 {
        self.counts.get(&role).copied().unwrap_or(0)
    }

    /// Roles with at least one slot, in stable order.
    pub fn active_roles(&self) -> impl Iterator<Item = Role> + '_ {
        self.counts
            .iter()
            .filter(|(_, &n)| n > 0)
            .map(|(&role, _)| role)
    }

    pub fn total_slots(&self) -> u32 {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, u32)> + '_ {
        self.counts.iter().map(|(&role, &n)| (role, n))
    }
}

impl FromIterator<(Role, u32)> for RoleSlots {
    fn from_iter<I: IntoIterator<Item = (Role, u32)>>(iter: I) -> Self {
        RoleSlots {
            counts: iter.into_iter().collect(),
        }
    }
}

/// The three-field catalog document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternDocument {
    /// Team id → display name.
    pub idx_team_map: BTreeMap<TeamId, String>,
    /// Configuration id → role slot counts.
    pub role_num_map: BTreeMap<ConfigId, RoleSlots>,
    /// Ordered match records.
    pub pattern_of_matches: Vec<MatchRecord>,
}
