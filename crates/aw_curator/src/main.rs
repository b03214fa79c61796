//! Curator CLI
//!
//! Raw game logs → pattern_of_matches.json → balanced subset selection →
//! result JSON, CSV tables and copied logs.

#[cfg(feature = "cli")]
use std::collections::BTreeMap;
#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use std::time::Duration;

#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use aw_core::models::Role;
#[cfg(feature = "cli")]
use aw_core::{select_matches, CountingPolicy, PatternCatalog, SelectionParams, SelectionReport};
#[cfg(feature = "cli")]
use aw_curator::{ResultDocument, RunMetadata};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "aw_curator")]
#[command(about = "Extract match catalogs and select balanced subsets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Build a pattern_of_matches.json catalog from raw game logs
    Extract {
        /// Directory of raw game log files (game1, game2, ...)
        #[arg(long)]
        raw_dir: PathBuf,

        /// Game size of the logs (5 or 13)
        #[arg(long)]
        players: u32,

        /// Output catalog JSON path
        #[arg(long)]
        out: PathBuf,
    },

    /// Select a balanced subset of matches from a catalog
    Select {
        /// Input catalog JSON path
        #[arg(long)]
        pattern: PathBuf,

        /// Number of matches to select (default: all available)
        #[arg(long)]
        matches: Option<usize>,

        /// Zero-count roles allowed per team
        #[arg(long, default_value = "0")]
        max_zero_roles: u32,

        /// Coverage vocabulary: observed-only or full-vocabulary
        #[arg(long, default_value = "observed-only")]
        policy: String,

        /// Require every team to appear in the selection
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set, value_name = "BOOL")]
        require_every_team: bool,

        /// Weight of the participation balance objective term
        #[arg(long, default_value = "1.0")]
        team_weight: f64,

        /// Per-role weight override, repeatable (e.g. --role-weight WEREWOLF=2.5)
        #[arg(long = "role-weight", value_name = "ROLE=WEIGHT")]
        role_weights: Vec<String>,

        /// Solve budget in seconds (default: no limit)
        #[arg(long)]
        budget_secs: Option<u64>,

        /// Output result JSON path
        #[arg(long)]
        json_out: Option<PathBuf>,

        /// Directory for the CSV tables
        #[arg(long)]
        table_dir: Option<PathBuf>,

        /// Raw log directory to copy selected files from
        #[arg(long)]
        raw_dir: Option<PathBuf>,

        /// Destination directory for copied logs (used with --raw-dir)
        #[arg(long)]
        copy_dir: Option<PathBuf>,

        /// Dataset label override for export file names
        #[arg(long)]
        dataset: Option<String>,
    },
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract { raw_dir, players, out } => {
            println!("🐺 Extracting match patterns...");
            println!("   Raw logs: {}", raw_dir.display());
            println!("   Players:  {players}");

            let (document, stats) = aw_curator::extract_directory(&raw_dir, players)?;
            aw_curator::save_document(&out, &document)?;

            println!("\n✅ Catalog written to: {}", out.display());
            println!("   Files seen:    {}", stats.files_seen);
            println!("   Matches kept:  {}", stats.parsed);
            println!("   Files skipped: {}", stats.skipped);
            println!("   Teams found:   {}", document.idx_team_map.len());
        }

        Commands::Select {
            pattern,
            matches,
            max_zero_roles,
            policy,
            require_every_team,
            team_weight,
            role_weights,
            budget_secs,
            json_out,
            table_dir,
            raw_dir,
            copy_dir,
            dataset,
        } => {
            println!("🐺 Selecting balanced match subset...");
            println!("   Catalog: {}", pattern.display());

            let catalog = PatternCatalog::load(&pattern)?;
            println!(
                "   Loaded {} matches, {} teams",
                catalog.match_count(),
                catalog.team_count()
            );

            let mut params = match matches {
                Some(count) => SelectionParams::new(count),
                None => SelectionParams::for_all_matches(&catalog),
            };
            params.max_zero_count_roles = max_zero_roles;
            params.counting_policy = parse_policy(&policy)?;
            params.require_every_team = require_every_team;
            params.team_balance_weight = team_weight;
            params.role_weights = parse_role_weights(&role_weights)?;

            let budget = budget_secs.map(Duration::from_secs);
            let outcome = select_matches(&catalog, &params, budget)?;
            let report = SelectionReport::from_outcome(&catalog, &params, &outcome);

            print_report(&report);

            if let Some(path) = json_out {
                let metadata = RunMetadata::for_catalog(&pattern)?;
                let document = ResultDocument { report: report.clone(), metadata };
                aw_curator::save_result_json(&path, &document)?;
                println!("\n📄 Result saved to: {}", path.display());
            }

            if let Some(dir) = table_dir {
                let label = dataset.unwrap_or_else(|| aw_curator::dataset_name(&pattern));
                for path in aw_curator::save_tables(&dir, &label, &report)? {
                    println!("📊 Table saved to: {}", path.display());
                }
            }

            if let (Some(raw), Some(dest)) = (raw_dir, copy_dir) {
                let copied = aw_curator::copy_selected_logs(&raw, &dest, &report)?;
                println!("📦 Copied {copied} game files to: {}", dest.display());
            }

            if !report.status.has_selection() {
                std::process::exit(2);
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn parse_policy(token: &str) -> Result<CountingPolicy> {
    match token {
        "observed-only" => Ok(CountingPolicy::ObservedOnly),
        "full-vocabulary" => Ok(CountingPolicy::FullVocabulary),
        other => anyhow::bail!(
            "unknown counting policy '{other}', expected observed-only or full-vocabulary"
        ),
    }
}

#[cfg(feature = "cli")]
fn parse_role_weights(args: &[String]) -> Result<BTreeMap<Role, f64>> {
    let mut weights = BTreeMap::new();
    for arg in args {
        let (role_token, weight) = arg
            .split_once('=')
            .with_context(|| format!("invalid role weight '{arg}', expected ROLE=WEIGHT"))?;
        let role = Role::from_log_token(role_token.trim())
            .with_context(|| format!("unknown role '{}' in '{arg}'", role_token.trim()))?;
        let weight: f64 = weight
            .trim()
            .parse()
            .with_context(|| format!("invalid weight in '{arg}'"))?;
        weights.insert(role, weight);
    }
    Ok(weights)
}

#[cfg(feature = "cli")]
fn print_report(report: &SelectionReport) {
    println!("\n=== Optimization Results ===");
    println!("Status: {}", report.status);
    println!(
        "Selected matches: {} / {} requested",
        report.achieved_match_count, report.requested_match_count
    );
    match report.objective {
        Some(objective) => println!("Balance score: {objective:.2}"),
        None => println!("Balance score: inf"),
    }

    if !report.hints.is_empty() {
        println!("\nInfeasibility hints:");
        for hint in &report.hints {
            println!("  - {hint}");
        }
    }

    let mut rows: Vec<_> = report.role_distribution.iter().collect();
    rows.sort_by(|a, b| a.team_name.cmp(&b.team_name));

    println!("\n=== Team Participation ===");
    for row in &rows {
        println!("{}: {} matches", row.team_name, row.participation);
    }

    println!("\nParticipation Statistics:");
    println!("  Mean: {:.2}", report.participation.mean);
    println!("  Std Dev: {:.2}", report.participation.std_dev);
    println!(
        "  Min: {}, Max: {}",
        report.participation.min, report.participation.max
    );

    println!("\n=== Role Distribution by Team ===");
    print!("{:<20}", "Team");
    for role in Role::ALL {
        print!("{:>11}", role.as_str());
    }
    println!("{:>22}", "Total_Participation");
    for row in &rows {
        print!("{:<20}", row.team_name);
        for role in Role::ALL {
            print!("{:>11}", row.counts.get(&role).copied().unwrap_or(0));
        }
        println!("{:>22}", row.participation);
    }

    println!("\n=== Role Balance Statistics ===");
    for row in &report.role_balance {
        println!("{}:", row.role);
        println!("  Mean: {:.2}", row.mean);
        println!("  Std Dev: {:.2}", row.std_dev);
        println!("  Spread: {}", row.spread);
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("aw_curator CLI is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
