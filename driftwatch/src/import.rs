//! driftwatch-import - CLI tool to load classified commits into the database
//!
//! Reads commits produced by an upstream classifier (JSON Lines or a JSON
//! array) and stores them under a project, creating the project if needed.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Database: $XDG_DATA_HOME/driftwatch/data.db (~/.local/share/driftwatch/data.db)
//! - Logs: $XDG_STATE_HOME/driftwatch/driftwatch.log (~/.local/state/driftwatch/driftwatch.log)
//! - Config: $XDG_CONFIG_HOME/driftwatch/config.toml (~/.config/driftwatch/config.toml)

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use driftwatch_core::ingest::{import_commits, parse_commits, read_commits};
use driftwatch_core::{Config, Database, Project};
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "driftwatch-import")]
#[command(about = "Import classified commits for a project")]
#[command(version)]
struct Args {
    /// Project ID to import into (created if missing)
    #[arg(short, long)]
    project: String,

    /// Display name for a new project (defaults to the ID)
    #[arg(short, long)]
    name: Option<String>,

    /// Repository as owner/repo
    #[arg(short, long)]
    repo: Option<String>,

    /// File with classified commits, or "-" for stdin
    file: PathBuf,

    /// Parse the file but don't write anything
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Ensure XDG environment variables are set before using core library
    Config::ensure_xdg_env();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard =
        driftwatch_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!(project = %args.project, file = %args.file.display(), "driftwatch-import starting");

    let commits = if args.file.as_os_str() == "-" {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .context("failed to read stdin")?;
        parse_commits(&content)
    } else {
        read_commits(&args.file)
    }
    .with_context(|| format!("failed to read commits from {}", args.file.display()))?;

    println!("Read {} commit(s) from {}", commits.len(), args.file.display());

    if args.dry_run {
        println!("Dry run - nothing imported");
        return Ok(());
    }

    let db_path = Config::database_path();
    tracing::info!(path = %db_path.display(), "Opening database");

    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;

    let existing = db.get_project(&args.project)?;
    let project = Project {
        id: args.project.clone(),
        name: args
            .name
            .clone()
            .or_else(|| existing.as_ref().map(|p| p.name.clone()))
            .unwrap_or_else(|| args.project.clone()),
        repo_full_name: args.repo.clone(),
        created_at: existing.as_ref().map(|p| p.created_at).unwrap_or_else(Utc::now),
        last_analyzed_at: None,
    };
    db.upsert_project(&project)
        .context("failed to register project")?;
    if existing.is_none() {
        println!("Created project {}", project.id);
    }

    let result = import_commits(&db, &project.id, &commits).context("failed to import commits")?;

    println!("Import complete:");
    println!("  Commits received:   {}", result.received);
    println!("  Commits inserted:   {}", result.inserted);
    println!("  Duplicates skipped: {}", result.duplicates);

    Ok(())
}
