//! # Pattern Catalog
//!
//! Validated, immutable view over a `pattern_of_matches.json` document.
//! Loading happens once per run; every downstream computation (coverage,
//! model, report) is a pure function of this catalog plus parameters.
//!
//! Validation is strict: unknown team ids, undeclared configuration ids,
//! duplicate match ids and slot-count mismatches are all rejected here, so
//! the optimizer never has to defend against a malformed record.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

use crate::error::CatalogError;
use crate::models::{ConfigId, MatchId, MatchRecord, PatternDocument, Role, RoleSlots, TeamId};

/// The match catalog: ordered match records, team and configuration maps,
/// and precomputed per-team/per-role counts.
#[derive(Debug, Clone)]
pub struct PatternCatalog {
    teams: BTreeMap<TeamId, String>,
    configs: BTreeMap<ConfigId, RoleSlots>,
    matches: Vec<MatchRecord>,
    /// Union of roles with slots > 0 across the configurations that are
    /// actually referenced by at least one match.
    active_roles: BTreeSet<Role>,
    /// Whole-catalog slot counts per (team, role). Pairs with zero count are
    /// absent from the map.
    assignment_counts: BTreeMap<(TeamId, Role), u32>,
    /// Distinct teams per match, aligned with `matches`.
    participants: Vec<BTreeSet<TeamId>>,
}

impl PatternCatalog {
    /// Load and validate a catalog from a JSON file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path)?;
        let catalog = Self::from_str(&text)?;
        info!(
            path = %path.display(),
            matches = catalog.match_count(),
            teams = catalog.team_count(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    /// Parse and validate a catalog from a JSON string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str) -> Result<Self, CatalogError> {
        let doc: PatternDocument = serde_json::from_str(text)?;
        Self::from_document(doc)
    }

    /// Parse and validate a catalog from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let doc: PatternDocument = serde_json::from_reader(reader)?;
        Self::from_document(doc)
    }

    /// Validate a parsed document and build the catalog views.
    pub fn from_document(doc: PatternDocument) -> Result<Self, CatalogError> {
        let PatternDocument {
            idx_team_map: teams,
            role_num_map: configs,
            pattern_of_matches: matches,
        } = doc;

        if matches.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen_ids: BTreeSet<MatchId> = BTreeSet::new();
        let mut active_roles: BTreeSet<Role> = BTreeSet::new();
        let mut assignment_counts: BTreeMap<(TeamId, Role), u32> = BTreeMap::new();
        let mut participants: Vec<BTreeSet<TeamId>> = Vec::with_capacity(matches.len());

        for record in &matches {
            if !seen_ids.insert(record.match_id.clone()) {
                return Err(CatalogError::DuplicateMatchId {
                    match_id: record.match_id.clone(),
                });
            }

            let slots = configs.get(&record.config_id).ok_or_else(|| {
                CatalogError::UnknownConfig {
                    match_id: record.match_id.clone(),
                    config_id: record.config_id.clone(),
                }
            })?;

            for slot in &record.assignment {
                if !teams.contains_key(&slot.team_id) {
                    return Err(CatalogError::UnknownTeam {
                        match_id: record.match_id.clone(),
                        team_id: slot.team_id,
                    });
                }
            }

            // Every declared slot must be filled, and nothing beyond it.
            for role in Role::ALL {
                let actual = record
                    .assignment
                    .iter()
                    .filter(|slot| slot.role == role)
                    .count() as u32;
                let expected = slots.slots(role);
                if actual != expected {
                    return Err(CatalogError::SlotCountMismatch {
                        match_id: record.match_id.clone(),
                        config_id: record.config_id.clone(),
                        role,
                        expected,
                        actual,
                    });
                }
            }

            active_roles.extend(slots.active_roles());
            for slot in &record.assignment {
                *assignment_counts.entry((slot.team_id, slot.role)).or_insert(0) += 1;
            }
            participants.push(record.teams());
        }

        debug!(
            matches = matches.len(),
            configs = configs.len(),
            active_roles = active_roles.len(),
            "catalog validated"
        );

        Ok(PatternCatalog {
            teams,
            configs,
            matches,
            active_roles,
            assignment_counts,
            participants,
        })
    }

    /// Ordered match records (document order preserved).
    pub fn matches(&self) -> &[MatchRecord] {
        &self.matches
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// Team ids in ascending order.
    pub fn team_ids(&self) -> impl Iterator<Item = TeamId> + '_ {
        self.teams.keys().copied()
    }

    pub fn team_count(&self) -> usize {
        self.teams.len()
    }

    pub fn team_name(&self, team: TeamId) -> Option<&str> {
        self.teams.get(&team).map(String::as_str)
    }

    /// Role slot counts declared for a configuration id.
    pub fn role_slots_for(&self, config_id: &str) -> Option<&RoleSlots> {
        self.configs.get(config_id)
    }

    pub fn configs(&self) -> &BTreeMap<ConfigId, RoleSlots> {
        &self.configs
    }

    /// Roles with at least one slot in a configuration used by some match.
    pub fn active_roles(&self) -> &BTreeSet<Role> {
        &self.active_roles
    }

    /// Whole-catalog slot count for a (team, role) pair.
    pub fn assignment_count(&self, team: TeamId, role: Role) -> u32 {
        self.assignment_counts
            .get(&(team, role))
            .copied()
            .unwrap_or(0)
    }

    /// Distinct teams featured in the match at `index`.
    pub fn participants(&self, index: usize) -> &BTreeSet<TeamId> {
        &self.participants[index]
    }

    /// Number of matches featuring `team` anywhere in the catalog.
    pub fn appearance_count(&self, team: TeamId) -> usize {
        self.participants.iter().filter(|set| set.contains(&team)).count()
    }

    /// Largest number of distinct teams in any single match.
    pub fn max_teams_per_match(&self) -> usize {
        self.participants.iter().map(BTreeSet::len).max().unwrap_or(0)
    }
}
