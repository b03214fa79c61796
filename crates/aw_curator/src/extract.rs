//! # Raw Log Extraction
//!
//! Builds a `pattern_of_matches.json` document from a directory of raw
//! AIWolf game logs.
//!
//! A raw log is a comma-separated text file named `game<N>` (no extension)
//! whose opening lines carry one `status` row per player:
//!
//! ```text
//! 0,status,1,SEER,ALIVE,kanolab-A1,Kano1
//! ```
//!
//! Extraction reads the first `player_count` non-empty lines of each file
//! and records one slot assignment per status row, so a team fielding two
//! agents in the same role contributes two slots. The collected slots are
//! then checked against the declared role counts for the game size; a file
//! that does not fill its slots exactly is skipped with a warning and
//! contributes nothing, not even team names, which keeps the team map free
//! of entries no surviving match refers to.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{debug, warn};

use aw_core::models::{MatchRecord, PatternDocument, Role, RoleSlots, SlotAssignment, TeamId};

/// Per-run extraction statistics.
#[derive(Debug, Clone, Default)]
pub struct ExtractStats {
    /// Game files found in the directory.
    pub files_seen: u32,
    /// Files that produced a match record.
    pub parsed: u32,
    /// Files rejected for a slot mismatch.
    pub skipped: u32,
}

/// Declared role slot counts for a supported game size.
///
/// Zero-slot roles are listed explicitly so each configuration spells out
/// the whole vocabulary.
pub fn role_slots_for_player_count(player_count: u32) -> Option<RoleSlots> {
    let counts: [(Role, u32); 6] = match player_count {
        5 => [
            (Role::Bodyguard, 0),
            (Role::Medium, 0),
            (Role::Possessed, 1),
            (Role::Seer, 1),
            (Role::Villager, 2),
            (Role::Werewolf, 1),
        ],
        13 => [
            (Role::Bodyguard, 1),
            (Role::Medium, 1),
            (Role::Possessed, 1),
            (Role::Seer, 1),
            (Role::Villager, 6),
            (Role::Werewolf, 3),
        ],
        _ => return None,
    };
    Some(counts.into_iter().collect())
}

/// Strip the per-agent suffix from a player's team field.
///
/// Raw logs distinguish the agents a team fields in one game by appending
/// `-<letter><digits>` to the team name (`kanolab-A1`, `kanolab-A2`).
/// Anything not matching that shape is returned unchanged.
pub fn normalize_team_name(raw: &str) -> &str {
    if let Some(dash) = raw.rfind('-') {
        let mut suffix = raw[dash + 1..].chars();
        if matches!(suffix.next(), Some(c) if c.is_ascii_alphabetic()) {
            let digits = suffix.as_str();
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                return &raw[..dash];
            }
        }
    }
    raw
}

/// Numeric sort key of a raw log file name: the digits following `game`,
/// or 0 when the name carries none.
fn game_number(name: &str) -> u64 {
    for (pos, _) in name.match_indices("game") {
        let rest = &name[pos + 4..];
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if end > 0 {
            if let Ok(n) = rest[..end].parse() {
                return n;
            }
        }
    }
    0
}

/// Parse the opening status block of one raw log.
///
/// Only the first `max_lines` non-empty lines are considered, and every one
/// of them spends the budget whether or not it is a status row. Returns one
/// `(team, role)` pair per status row, in file order.
fn parse_status_block(text: &str, max_lines: u32) -> Vec<(String, Role)> {
    let mut pairs = Vec::new();
    let mut budget = max_lines;

    for line in text.lines() {
        if budget == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        budget -= 1;

        // Format: day,status,player_id,role,status,team,name
        let parts: Vec<&str> = line.split(',').collect();
        if parts.len() >= 7 && parts[1] == "status" {
            if let Some(role) = Role::from_log_token(parts[3]) {
                pairs.push((normalize_team_name(parts[5]).to_string(), role));
            }
        }
    }
    pairs
}

/// First role whose parsed slot count differs from the declared one,
/// with the expected and actual counts.
fn slot_mismatch(declared: &RoleSlots, pairs: &[(String, Role)]) -> Option<(Role, u32, u32)> {
    for role in Role::ALL {
        let actual = pairs.iter().filter(|(_, r)| *r == role).count() as u32;
        let expected = declared.slots(role);
        if actual != expected {
            return Some((role, expected, actual));
        }
    }
    None
}

/// Extract a catalog document from a directory of raw game logs.
///
/// Files whose name starts with `game` are processed in numeric order
/// (name order breaks ties), so team ids come out identical from run to
/// run. Team ids are assigned in first-seen order across the accepted
/// files only.
pub fn extract_directory(
    raw_dir: &Path,
    player_count: u32,
) -> Result<(PatternDocument, ExtractStats)> {
    let declared = role_slots_for_player_count(player_count)
        .with_context(|| format!("unsupported player count {player_count}, expected 5 or 13"))?;
    let config_id = format!("{player_count}player");

    let mut names: Vec<(u64, String)> = Vec::new();
    for entry in fs::read_dir(raw_dir)
        .with_context(|| format!("failed to read raw log directory: {}", raw_dir.display()))?
    {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with("game") {
            names.push((game_number(&name), name));
        }
    }
    if names.is_empty() {
        bail!("no game files found in {}", raw_dir.display());
    }
    names.sort();

    let mut stats = ExtractStats {
        files_seen: names.len() as u32,
        ..ExtractStats::default()
    };
    let mut team_ids: BTreeMap<String, TeamId> = BTreeMap::new();
    let mut idx_team_map: BTreeMap<TeamId, String> = BTreeMap::new();
    let mut records: Vec<MatchRecord> = Vec::new();

    for (_, name) in &names {
        let path = raw_dir.join(name);
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read game log: {}", path.display()))?;
        let pairs = parse_status_block(&text, player_count);

        if let Some((role, expected, actual)) = slot_mismatch(&declared, &pairs) {
            warn!(
                file = %name,
                role = %role,
                expected,
                actual,
                "status block does not fill the declared slots, skipping file"
            );
            stats.skipped += 1;
            continue;
        }

        let assignment = pairs
            .into_iter()
            .map(|(team, role)| {
                let next_id = team_ids.len() as TeamId;
                let team_id = *team_ids.entry(team.clone()).or_insert(next_id);
                idx_team_map.entry(team_id).or_insert(team);
                SlotAssignment { team_id, role }
            })
            .collect();

        records.push(MatchRecord {
            match_id: name.clone(),
            config_id: config_id.clone(),
            assignment,
        });
        stats.parsed += 1;
        debug!(file = %name, "game log parsed");
    }

    if records.is_empty() {
        bail!(
            "no usable game files in {} ({} skipped)",
            raw_dir.display(),
            stats.skipped
        );
    }

    let document = PatternDocument {
        idx_team_map,
        role_num_map: [(config_id, declared)].into_iter().collect(),
        pattern_of_matches: records,
    };
    Ok((document, stats))
}

/// Write a document to disk as pretty-printed JSON, creating parent
/// directories as needed.
pub fn save_document(path: &Path, document: &PatternDocument) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| {
            format!("failed to create output directory: {}", parent.display())
        })?;
    }
    let json = serde_json::to_string_pretty(document)?;
    fs::write(path, json)
        .with_context(|| format!("failed to write document: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aw_core::PatternCatalog;
    use tempfile::tempdir;

    fn write_log(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    const GAME1: &str = "\
0,status,1,SEER,ALIVE,tomato-B1,Tom1
0,status,2,VILLAGER,ALIVE,kanolab-A1,Kano1
0,status,3,VILLAGER,ALIVE,kanolab-A2,Kano2
0,status,4,WEREWOLF,ALIVE,sUper_IL-C1,Sup1
0,status,5,POSSESSED,ALIVE,tomato-B2,Tom2
0,talk,1,1,1,Over
";

    const GAME2: &str = "\
0,status,1,WEREWOLF,ALIVE,gat-D1,G1
0,status,2,SEER,ALIVE,kanolab-A1,K1
0,status,3,VILLAGER,ALIVE,tomato-B1,T1
0,status,4,VILLAGER,ALIVE,sUper_IL-C2,S1
0,status,5,POSSESSED,ALIVE,gat-D2,G2
";

    #[test]
    fn test_normalize_team_name() {
        assert_eq!(normalize_team_name("kanolab-A1"), "kanolab");
        assert_eq!(normalize_team_name("sUper_IL-B12"), "sUper_IL");
        assert_eq!(normalize_team_name("a-b-C3"), "a-b", "only the last suffix is stripped");

        // Not the agent-suffix shape.
        assert_eq!(normalize_team_name("team-x"), "team-x");
        assert_eq!(normalize_team_name("team-AB1"), "team-AB1");
        assert_eq!(normalize_team_name("Takeda-5"), "Takeda-5");
        assert_eq!(normalize_team_name("plain"), "plain");
    }

    #[test]
    fn test_role_slots_tables() {
        let five = role_slots_for_player_count(5).unwrap();
        assert_eq!(five.total_slots(), 5);
        assert_eq!(five.slots(Role::Villager), 2);
        assert_eq!(five.slots(Role::Bodyguard), 0);

        let thirteen = role_slots_for_player_count(13).unwrap();
        assert_eq!(thirteen.total_slots(), 13);
        assert_eq!(thirteen.slots(Role::Villager), 6);
        assert_eq!(thirteen.slots(Role::Werewolf), 3);

        assert!(role_slots_for_player_count(7).is_none());
    }

    #[test]
    fn test_extract_five_player_directory() {
        let dir = tempdir().unwrap();
        write_log(dir.path(), "game1", GAME1);
        write_log(dir.path(), "game2", GAME2);

        let (doc, stats) = extract_directory(dir.path(), 5).unwrap();
        assert_eq!(stats.files_seen, 2);
        assert_eq!(stats.parsed, 2);
        assert_eq!(stats.skipped, 0);

        // Team ids follow first appearance across files in order.
        let names: Vec<&str> = doc.idx_team_map.values().map(String::as_str).collect();
        assert_eq!(names, vec!["tomato", "kanolab", "sUper_IL", "gat"]);

        let record = &doc.pattern_of_matches[0];
        assert_eq!(record.match_id, "game1");
        assert_eq!(record.config_id, "5player");
        assert_eq!(record.assignment.len(), 5);
        // kanolab (id 1) fielded two agents as VILLAGER in game1.
        assert_eq!(record.slot_count(1, Role::Villager), 2);

        // The document passes full catalog validation.
        assert!(PatternCatalog::from_document(doc).is_ok());
    }

    #[test]
    fn test_mismatched_file_skipped_without_leaking_teams() {
        let dir = tempdir().unwrap();
        write_log(dir.path(), "game1", GAME1);
        // Truncated log introducing a team nothing else mentions.
        write_log(
            dir.path(),
            "game2",
            "0,status,1,SEER,ALIVE,ghost-Z1,G1\n0,status,2,WEREWOLF,ALIVE,ghost-Z2,G2\n",
        );

        let (doc, stats) = extract_directory(dir.path(), 5).unwrap();
        assert_eq!(stats.parsed, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(doc.pattern_of_matches.len(), 1);
        assert!(
            !doc.idx_team_map.values().any(|name| name == "ghost"),
            "rejected files must not intern team names"
        );
    }

    #[test]
    fn test_every_nonempty_line_spends_the_budget() {
        let dir = tempdir().unwrap();
        // A stray header line pushes the fifth status row past the budget.
        let mut with_header = String::from("# exported by the tournament server\n");
        with_header.push_str(GAME1);
        write_log(dir.path(), "game1", &with_header);

        // Blank lines are free; the same block parses with them interleaved.
        let spaced: String = GAME2.lines().flat_map(|l| [l, ""]).collect::<Vec<_>>().join("\n");
        write_log(dir.path(), "game2", &spaced);

        let (doc, stats) = extract_directory(dir.path(), 5).unwrap();
        assert_eq!(stats.skipped, 1, "header line starves the status block");
        assert_eq!(stats.parsed, 1);
        assert_eq!(doc.pattern_of_matches[0].match_id, "game2");
    }

    #[test]
    fn test_files_sort_numerically() {
        let dir = tempdir().unwrap();
        write_log(dir.path(), "game10", GAME1);
        write_log(dir.path(), "game2", GAME1);
        write_log(dir.path(), "game1", GAME2);

        let (doc, _) = extract_directory(dir.path(), 5).unwrap();
        let ids: Vec<&str> = doc
            .pattern_of_matches
            .iter()
            .map(|record| record.match_id.as_str())
            .collect();
        assert_eq!(ids, vec!["game1", "game2", "game10"]);
    }

    #[test]
    fn test_unsupported_player_count() {
        let dir = tempdir().unwrap();
        let err = extract_directory(dir.path(), 7).unwrap_err();
        assert!(err.to_string().contains("player count"), "got {err}");
    }

    #[test]
    fn test_empty_directory_fails() {
        let dir = tempdir().unwrap();
        let err = extract_directory(dir.path(), 5).unwrap_err();
        assert!(err.to_string().contains("no game files"), "got {err}");
    }

    #[test]
    fn test_save_document_round_trip() {
        let dir = tempdir().unwrap();
        write_log(dir.path(), "game1", GAME1);
        let (doc, _) = extract_directory(dir.path(), 5).unwrap();

        let out = dir.path().join("out/pattern_of_matches.json");
        save_document(&out, &doc).unwrap();

        let loaded = PatternCatalog::load(&out).unwrap();
        assert_eq!(loaded.match_count(), 1);
        assert_eq!(loaded.team_name(0), Some("tomato"));
    }
}
