//! # aw_curator - Log Curation Pipeline
//!
//! Companion crate to [`aw_core`]: builds the `pattern_of_matches.json`
//! catalog from raw AIWolf game logs, and persists a selection run as a
//! JSON result document, CSV tables and copied log files.
//!
//! The binary target wires both halves into a two-command CLI (`extract`,
//! `select`); the library functions are usable on their own.

pub mod export;
pub mod extract;

// Re-export the pipeline entry points
pub use export::{
    copy_selected_logs, dataset_name, save_result_json, save_tables, ResultDocument, RunMetadata,
};
pub use extract::{
    extract_directory, normalize_team_name, role_slots_for_player_count, save_document,
    ExtractStats,
};
