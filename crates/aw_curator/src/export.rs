//! # Result Export
//!
//! Persists a selection run: a JSON result document (the full report plus
//! run provenance), three CSV tables named after the dataset, and copies of
//! the selected raw logs. Table layouts match the spreadsheets tournament
//! reviewers already work with.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use aw_core::models::Role;
use aw_core::SelectionReport;

/// Provenance of one selection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Catalog the run selected from.
    pub catalog_path: String,
    /// SHA256 checksum of the catalog file (hex string).
    pub catalog_checksum: String,
    /// Creation time (RFC3339).
    pub created_at: String,
    /// Optimizer crate version.
    pub tool_version: String,
}

impl RunMetadata {
    /// Metadata for a run over the catalog at `path`, checksumming the file
    /// as it currently is on disk.
    pub fn for_catalog(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .with_context(|| format!("failed to read catalog file: {}", path.display()))?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let checksum = format!("{:x}", hasher.finalize());

        Ok(RunMetadata {
            catalog_path: path.display().to_string(),
            catalog_checksum: checksum,
            created_at: chrono::Utc::now().to_rfc3339(),
            tool_version: aw_core::VERSION.to_string(),
        })
    }
}

/// The saved result document: full report plus provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultDocument {
    pub report: SelectionReport,
    pub metadata: RunMetadata,
}

/// Save a result document as pretty-printed JSON, creating parent
/// directories as needed.
pub fn save_result_json(path: &Path, document: &ResultDocument) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| {
            format!("failed to create output directory: {}", parent.display())
        })?;
    }
    let json = serde_json::to_string_pretty(document)?;
    fs::write(path, json)
        .with_context(|| format!("failed to write result file: {}", path.display()))?;
    Ok(())
}

/// Dataset label derived from the catalog path, used in export file names.
///
/// A catalog under a `pattern_of_matches` tree is labeled by the directory
/// holding it (`data/pattern_of_matches/0505/pattern_of_matches.json` gives
/// `0505`); any other path falls back to the file stem with a
/// `pattern_of_matches_` prefix stripped.
pub fn dataset_name(catalog_path: &Path) -> String {
    let under_pattern_tree = catalog_path
        .parent()
        .map(|p| p.components().any(|c| c.as_os_str() == "pattern_of_matches"))
        .unwrap_or(false);
    if under_pattern_tree {
        if let Some(dir) = catalog_path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
        {
            if dir != "pattern_of_matches" {
                return dir.to_string();
            }
        }
    }

    let stem = catalog_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("dataset");
    let stripped = stem.strip_prefix("pattern_of_matches_").unwrap_or(stem);
    if stripped.is_empty() {
        "dataset".to_string()
    } else {
        stripped.to_string()
    }
}

/// Write the three CSV tables for a run into `table_dir`, returning the
/// paths written.
///
/// - `role_distribution_<dataset>.csv`: per-team role counts plus total
///   participation, rows ordered by team name.
/// - `optimization_summary_<dataset>.csv`: metric/value pairs.
/// - `selected_matches_<dataset>.csv`: catalog index and source file of
///   every selected match.
pub fn save_tables(
    table_dir: &Path,
    dataset: &str,
    report: &SelectionReport,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(table_dir)
        .with_context(|| format!("failed to create table directory: {}", table_dir.display()))?;

    let mut written = Vec::with_capacity(3);

    let path = table_dir.join(format!("role_distribution_{dataset}.csv"));
    {
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("failed to create table: {}", path.display()))?;

        let mut header: Vec<String> = vec!["Team".to_string()];
        header.extend(Role::ALL.iter().map(|role| role.to_string()));
        header.push("Total_Participation".to_string());
        writer.write_record(&header)?;

        let mut rows: Vec<_> = report.role_distribution.iter().collect();
        rows.sort_by(|a, b| a.team_name.cmp(&b.team_name));
        for row in rows {
            let mut record: Vec<String> = vec![row.team_name.clone()];
            record.extend(
                Role::ALL
                    .iter()
                    .map(|role| row.counts.get(role).copied().unwrap_or(0).to_string()),
            );
            record.push(row.participation.to_string());
            writer.write_record(&record)?;
        }
        writer.flush()?;
    }
    written.push(path);

    let path = table_dir.join(format!("optimization_summary_{dataset}.csv"));
    {
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("failed to create table: {}", path.display()))?;

        let balance = report
            .objective
            .map(|v| format!("{v:.2}"))
            .unwrap_or_else(|| "inf".to_string());
        let rows = [
            ("Total Matches Selected", report.achieved_match_count.to_string()),
            ("Balance Score", balance),
            ("Optimization Status", report.status.as_str().to_string()),
            ("Mean Team Participation", format!("{:.2}", report.participation.mean)),
            ("Std Dev Team Participation", format!("{:.2}", report.participation.std_dev)),
            ("Min Team Participation", report.participation.min.to_string()),
            ("Max Team Participation", report.participation.max.to_string()),
        ];

        writer.write_record(["Metric", "Value"])?;
        for (metric, value) in rows {
            writer.write_record([metric, value.as_str()])?;
        }
        writer.flush()?;
    }
    written.push(path);

    let path = table_dir.join(format!("selected_matches_{dataset}.csv"));
    {
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("failed to create table: {}", path.display()))?;

        writer.write_record(["Selected_Match_Index", "Game_File"])?;
        for row in &report.selected {
            writer.write_record([row.catalog_index.to_string().as_str(), row.match_id.as_str()])?;
        }
        writer.flush()?;
    }
    written.push(path);

    Ok(written)
}

/// Copy the raw log of every selected match from `raw_dir` into `dest_dir`.
///
/// Missing source files are skipped with a warning; returns the number of
/// files actually copied.
pub fn copy_selected_logs(
    raw_dir: &Path,
    dest_dir: &Path,
    report: &SelectionReport,
) -> Result<u32> {
    fs::create_dir_all(dest_dir).with_context(|| {
        format!("failed to create destination directory: {}", dest_dir.display())
    })?;

    let mut copied = 0;
    for row in &report.selected {
        let source = raw_dir.join(&row.match_id);
        if !source.is_file() {
            warn!(file = %source.display(), "selected game log not found, skipping copy");
            continue;
        }
        fs::copy(&source, dest_dir.join(&row.match_id))
            .with_context(|| format!("failed to copy {}", source.display()))?;
        copied += 1;
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aw_core::{select_matches, PatternCatalog, SelectionParams};
    use tempfile::tempdir;

    const CATALOG_JSON: &str = r#"{
        "idx_team_map": {"0": "zeta", "1": "alpha"},
        "role_num_map": {"duel": {"SEER": 1, "WEREWOLF": 1}},
        "pattern_of_matches": [
            {"matchId": "game1", "configId": "duel", "assignment": [
                {"teamId": 0, "role": "SEER"}, {"teamId": 1, "role": "WEREWOLF"}]},
            {"matchId": "game2", "configId": "duel", "assignment": [
                {"teamId": 1, "role": "SEER"}, {"teamId": 0, "role": "WEREWOLF"}]}
        ]
    }"#;

    fn demo_report() -> SelectionReport {
        let catalog = PatternCatalog::from_str(CATALOG_JSON).unwrap();
        let params = SelectionParams::for_all_matches(&catalog);
        let outcome = select_matches(&catalog, &params, None).unwrap();
        SelectionReport::from_outcome(&catalog, &params, &outcome)
    }

    #[test]
    fn test_save_tables_layout() {
        let dir = tempdir().unwrap();
        let report = demo_report();

        let written = save_tables(dir.path(), "demo", &report).unwrap();
        assert_eq!(written.len(), 3);

        let distribution = fs::read_to_string(dir.path().join("role_distribution_demo.csv")).unwrap();
        let lines: Vec<&str> = distribution.lines().collect();
        assert_eq!(
            lines[0],
            "Team,BODYGUARD,MEDIUM,POSSESSED,SEER,VILLAGER,WEREWOLF,Total_Participation"
        );
        // Rows follow team name order, not id order.
        assert_eq!(lines[1], "alpha,0,0,0,1,0,1,2");
        assert_eq!(lines[2], "zeta,0,0,0,1,0,1,2");

        let summary = fs::read_to_string(dir.path().join("optimization_summary_demo.csv")).unwrap();
        assert!(summary.starts_with("Metric,Value\n"), "got {summary}");
        assert!(summary.contains("Total Matches Selected,2"), "got {summary}");
        assert!(summary.contains("Balance Score,0.00"), "got {summary}");
        assert!(summary.contains("Optimization Status,OPTIMAL"), "got {summary}");
        assert!(summary.contains("Mean Team Participation,2.00"), "got {summary}");
        assert!(summary.contains("Std Dev Team Participation,0.00"), "got {summary}");

        let selected = fs::read_to_string(dir.path().join("selected_matches_demo.csv")).unwrap();
        let lines: Vec<&str> = selected.lines().collect();
        assert_eq!(lines, vec!["Selected_Match_Index,Game_File", "0,game1", "1,game2"]);
    }

    #[test]
    fn test_copy_selected_logs_skips_missing() {
        let dir = tempdir().unwrap();
        let raw = dir.path().join("raw");
        let dest = dir.path().join("selected");
        fs::create_dir_all(&raw).unwrap();
        fs::write(raw.join("game1"), "0,status,...\n").unwrap();
        // game2 is selected but its raw file is gone.

        let report = demo_report();
        let copied = copy_selected_logs(&raw, &dest, &report).unwrap();
        assert_eq!(copied, 1);
        assert!(dest.join("game1").is_file());
        assert!(!dest.join("game2").exists());
    }

    #[test]
    fn test_dataset_name() {
        assert_eq!(
            dataset_name(Path::new("data/pattern_of_matches/0505/pattern_of_matches.json")),
            "0505"
        );
        assert_eq!(dataset_name(Path::new("pattern_of_matches_0707.json")), "0707");
        assert_eq!(dataset_name(Path::new("data/my_run.json")), "my_run");
    }

    #[test]
    fn test_result_document_round_trip() {
        let dir = tempdir().unwrap();
        let catalog_path = dir.path().join("pattern_of_matches.json");
        fs::write(&catalog_path, CATALOG_JSON).unwrap();

        let metadata = RunMetadata::for_catalog(&catalog_path).unwrap();
        assert_eq!(metadata.catalog_checksum.len(), 64);
        assert!(metadata.catalog_checksum.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(metadata.tool_version, aw_core::VERSION);

        let document = ResultDocument { report: demo_report(), metadata };
        let out = dir.path().join("results/selection.json");
        save_result_json(&out, &document).unwrap();

        let loaded: ResultDocument =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(loaded.report, document.report);
        assert_eq!(loaded.metadata.catalog_checksum, document.metadata.catalog_checksum);
    }
}
