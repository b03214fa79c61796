//! Selection report assembly.
//!
//! Flattens a [`SelectionOutcome`](crate::optimizer::SelectionOutcome) and
//! its catalog into serializable tables: the picked matches, the per-team
//! role distribution and the balance statistics the objective optimizes.
//! A run without a selection still reports full, zeroed tables so
//! downstream tooling always sees the same shape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::PatternCatalog;
use crate::coverage::CountingPolicy;
use crate::metrics::{mean, spread, std_dev};
use crate::models::{ConfigId, MatchId, Role, SlotAssignment, TeamId};
use crate::optimizer::{SelectionOutcome, SelectionParams, SolveStatus};

/// One picked match, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedMatchRow {
    /// Position of the match in the source catalog.
    pub catalog_index: usize,
    pub match_id: MatchId,
    pub config_id: ConfigId,
    pub assignment: Vec<SlotAssignment>,
}

/// Per-team role exposure inside the selection. Counts cover the whole role
/// vocabulary, so unplayed roles show up as explicit zeroes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDistributionRow {
    pub team_id: TeamId,
    pub team_name: String,
    pub counts: BTreeMap<Role, u32>,
    pub participation: u32,
}

/// Participation statistics across teams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipationStats {
    pub mean: f64,
    pub std_dev: f64,
    pub min: u32,
    pub max: u32,
}

/// Across-team statistics for one role's in-selection counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleBalanceRow {
    pub role: Role,
    pub spread: u32,
    pub mean: f64,
    pub std_dev: f64,
}

/// Full account of one selection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionReport {
    pub status: SolveStatus,
    pub objective: Option<f64>,
    pub requested_match_count: usize,
    pub achieved_match_count: usize,
    pub total_available: usize,
    pub counting_policy: CountingPolicy,
    pub selected: Vec<SelectedMatchRow>,
    pub role_distribution: Vec<RoleDistributionRow>,
    pub participation: ParticipationStats,
    pub role_balance: Vec<RoleBalanceRow>,
    pub team_spread: u32,
    pub hints: Vec<String>,
    pub elapsed_ms: u64,
}

impl SelectionReport {
    pub fn from_outcome(
        catalog: &PatternCatalog,
        params: &SelectionParams,
        outcome: &SelectionOutcome,
    ) -> Self {
        let picks: &[usize] = outcome.selected.as_deref().unwrap_or(&[]);
        let teams: Vec<TeamId> = catalog.team_ids().collect();

        let selected: Vec<SelectedMatchRow> = picks
            .iter()
            .map(|&m| {
                let record = &catalog.matches()[m];
                SelectedMatchRow {
                    catalog_index: m,
                    match_id: record.match_id.clone(),
                    config_id: record.config_id.clone(),
                    assignment: record.assignment.clone(),
                }
            })
            .collect();

        let participation_counts: Vec<u32> = teams
            .iter()
            .map(|&team| {
                picks
                    .iter()
                    .filter(|&&m| catalog.participants(m).contains(&team))
                    .count() as u32
            })
            .collect();

        let role_distribution: Vec<RoleDistributionRow> = teams
            .iter()
            .zip(&participation_counts)
            .map(|(&team, &participation)| RoleDistributionRow {
                team_id: team,
                team_name: catalog.team_name(team).unwrap_or_default().to_string(),
                counts: Role::ALL
                    .iter()
                    .map(|&role| {
                        let count = picks
                            .iter()
                            .map(|&m| catalog.matches()[m].slot_count(team, role))
                            .sum();
                        (role, count)
                    })
                    .collect(),
                participation,
            })
            .collect();

        let role_balance: Vec<RoleBalanceRow> = catalog
            .active_roles()
            .iter()
            .map(|&role| {
                let counts: Vec<u32> = teams
                    .iter()
                    .map(|&team| {
                        picks
                            .iter()
                            .map(|&m| catalog.matches()[m].slot_count(team, role))
                            .sum()
                    })
                    .collect();
                RoleBalanceRow {
                    role,
                    spread: spread(&counts).unwrap_or(0),
                    mean: mean(&counts).unwrap_or(0.0),
                    std_dev: std_dev(&counts).unwrap_or(0.0),
                }
            })
            .collect();

        SelectionReport {
            status: outcome.status,
            objective: outcome.objective,
            requested_match_count: params.match_count,
            achieved_match_count: picks.len(),
            total_available: catalog.match_count(),
            counting_policy: params.counting_policy,
            selected,
            role_distribution,
            participation: ParticipationStats {
                mean: mean(&participation_counts).unwrap_or(0.0),
                std_dev: std_dev(&participation_counts).unwrap_or(0.0),
                min: participation_counts.iter().copied().min().unwrap_or(0),
                max: participation_counts.iter().copied().max().unwrap_or(0),
            },
            role_balance,
            team_spread: spread(&participation_counts).unwrap_or(0),
            hints: outcome.hints.iter().map(ToString::to_string).collect(),
            elapsed_ms: outcome.elapsed.as_millis() as u64,
        }
    }
}
