//! Error types for catalog loading and parameter validation.
//!
//! Infeasibility and budget expiry are NOT errors: they are in-band
//! [`SolveStatus`](crate::optimizer::SolveStatus) values, because an
//! over-constrained model is a legitimate answer, not a caller mistake.

use thiserror::Error;

use crate::models::{ConfigId, MatchId, Role, TeamId};

/// Faults in the catalog document itself. All of these abort a run before
/// any optimization work starts.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("catalog contains no matches")]
    Empty,

    #[error("match {match_id}: unknown team id {team_id}")]
    UnknownTeam { match_id: MatchId, team_id: TeamId },

    #[error("match {match_id}: undeclared configuration id '{config_id}'")]
    UnknownConfig {
        match_id: MatchId,
        config_id: ConfigId,
    },

    #[error("duplicate match id '{match_id}'")]
    DuplicateMatchId { match_id: MatchId },

    #[error(
        "match {match_id}: {role} fills {actual} slot(s) but configuration '{config_id}' declares {expected}"
    )]
    SlotCountMismatch {
        match_id: MatchId,
        config_id: ConfigId,
        role: Role,
        expected: u32,
        actual: u32,
    },
}

/// Faults in the selection parameters. Checked before model construction.
#[derive(Error, Debug)]
pub enum ParameterError {
    #[error("match count {requested} outside valid range [1, {available}]")]
    MatchCountOutOfRange { requested: usize, available: usize },

    #[error("{name} must be positive, got {value}")]
    NonPositiveWeight { name: &'static str, value: f64 },
}
