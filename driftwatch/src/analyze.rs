//! driftwatch-analyze - CLI tool to run the recommendation engine
//!
//! Runs every enabled pattern detector over each project's recent commit
//! history, reconciles recommendations, and records the run.

mod process_lock;

use anyhow::{Context, Result};
use clap::Parser;
use driftwatch_core::analytics::{create_engine, AnalysisResult, MetricWindow};
use driftwatch_core::db::AnalysisRun;
use driftwatch_core::{Config, Database};
use process_lock::acquire_analysis_guard;

#[derive(Parser)]
#[command(name = "driftwatch-analyze")]
#[command(about = "Detect workflow drift in classified commit history")]
#[command(version)]
struct Args {
    /// Project ID to analyze
    /// If not provided, analyzes all projects
    #[arg(short, long)]
    project: Option<String>,

    /// List enabled detectors without running analysis
    #[arg(long)]
    list_detectors: bool,

    /// Output format: text (default) or json
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Show the metric window history
    #[arg(short, long)]
    windows: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.format != "text" && args.format != "json" {
        anyhow::bail!("unknown format '{}': expected text or json", args.format);
    }

    Config::ensure_xdg_env();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard =
        driftwatch_core::logging::init(&config.logging).context("failed to initialize logging")?;

    // Create recommendation engine
    let engine = create_engine(&config).context("invalid detector configuration")?;

    // List detectors mode
    if args.list_detectors {
        println!("Enabled detectors:");
        for name in engine.detector_names() {
            println!("  - {}", name);
        }
        return Ok(());
    }

    // Open database
    let db_path = Config::database_path();
    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;

    // Find projects to analyze
    let project_ids: Vec<String> = if let Some(ref project_id) = args.project {
        if db.get_project(project_id)?.is_none() {
            anyhow::bail!("No project found with id '{}'", project_id);
        }
        vec![project_id.clone()]
    } else {
        db.list_projects()?.into_iter().map(|p| p.id).collect()
    };

    if project_ids.is_empty() {
        println!("No projects found in database.");
        println!("Run 'driftwatch-import' first to load classified commits.");
        return Ok(());
    }

    let mut results = Vec::with_capacity(project_ids.len());
    for project_id in &project_ids {
        let _guard = acquire_analysis_guard(&db_path, project_id)?;

        let result = engine
            .analyze_project(project_id, &db)
            .with_context(|| format!("failed to analyze project '{}'", project_id))?;

        db.insert_analysis_run(&AnalysisRun::from_result(&result))
            .context("failed to record analysis run")?;

        if args.format == "text" {
            print_text_result(&result, args.windows);
        }
        results.push(result);
    }

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        let created: usize = results.iter().map(|r| r.created).sum();
        let resolved: usize = results.iter().map(|r| r.resolved_ids.len()).sum();
        println!("---");
        println!(
            "Analyzed {} project(s): {} created, {} resolved",
            results.len(),
            created,
            resolved
        );
    }

    Ok(())
}

fn print_text_result(result: &AnalysisResult, show_windows: bool) {
    let commits: u32 = result.windows.iter().map(|w| w.total_commits).sum();
    println!(
        "Project: {} ({} commits in {} window(s))",
        result.project_id,
        commits,
        result.windows.len()
    );

    let phase = &result.phase;
    println!(
        "  Phase: {} (confidence {:.2})",
        phase.phase, phase.confidence
    );
    for signal in &phase.signals {
        println!("    - {}", signal);
    }
    println!("  {}", phase.guidance);

    if result.recommendations.is_empty() {
        println!("  No patterns detected");
    } else {
        println!("  Patterns ({}):", result.recommendations.len());
        for rec in &result.recommendations {
            println!("    [{}] {}", rec.severity, rec.title);
            println!("        {}", rec.description);
        }
    }

    if let Some(trends) = result.trends() {
        println!(
            "  Trends: ai {} ({:+.0}%), tests {} ({:+.0}%), velocity {} ({:+.0}%)",
            trends.ai_ratio.direction.as_str(),
            trends.ai_ratio.change_percent,
            trends.test_ratio.direction.as_str(),
            trends.test_ratio.change_percent,
            trends.velocity.direction.as_str(),
            trends.velocity.change_percent
        );
    }

    if show_windows {
        println!("  Windows:");
        for window in &result.windows {
            print_window(window);
        }
    }

    println!(
        "  Created: {}, Resolved: {} ({}ms)",
        result.created,
        result.resolved_ids.len(),
        result.duration_ms
    );
    println!();
}

fn print_window(window: &MetricWindow) {
    println!(
        "    {}  {:>4} commits  ai {:>3.0}%  tests {:>3.0}%  {:.1} files/commit{}",
        window.window_start.format("%Y-%m-%d"),
        window.total_commits,
        (window.ai_ratio * 100.0).round(),
        (window.test_ratio * 100.0).round(),
        window.avg_files_per_commit,
        if window.unique_ai_tools.is_empty() {
            String::new()
        } else {
            format!("  [{}]", window.unique_ai_tools.join(", "))
        }
    );
}
