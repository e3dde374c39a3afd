//! driftwatch - inspect projects and act on recommendations
//!
//! Read-only views over the database plus the reviewer transitions
//! (acknowledge, dismiss, accuracy label). Analysis itself runs in
//! `driftwatch-analyze`.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use driftwatch_core::analytics::{create_engine, metric_history, project_overview, MetricWindow};
use driftwatch_core::{
    AccuracyLabel, Config, Database, Recommendation, RecommendationFilter, RecommendationStatus,
    Severity,
};

#[derive(Parser)]
#[command(name = "driftwatch")]
#[command(about = "Workflow drift analysis for AI-assisted commit history")]
#[command(version)]
struct Args {
    /// Output format: text (default) or json
    #[arg(short, long, default_value = "text", global = true)]
    format: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List projects with commit and recommendation counts
    Projects,

    /// Show the current phase, trends and counts for a project
    Overview {
        /// Project ID
        project: String,
    },

    /// List a project's recommendations, newest first
    Recommendations {
        /// Project ID
        project: String,

        /// Status to show: active (default), acknowledged, dismissed, resolved or all
        #[arg(short, long, default_value = "active")]
        status: String,

        /// Only this severity
        #[arg(long)]
        severity: Option<String>,

        /// Maximum number of recommendations
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Acknowledge an active recommendation
    Ack {
        /// Recommendation ID
        id: String,
    },

    /// Dismiss an active recommendation
    Dismiss {
        /// Recommendation ID
        id: String,
    },

    /// Label a recommendation's accuracy
    Label {
        /// Recommendation ID
        id: String,

        /// true-positive, false-positive, useful or noisy
        label: String,
    },

    /// Show metric windows for a project over a time range
    History {
        /// Project ID
        project: String,

        /// Start of the range, inclusive (RFC 3339 or YYYY-MM-DD)
        #[arg(long)]
        since: Option<String>,

        /// End of the range, exclusive (RFC 3339 or YYYY-MM-DD)
        #[arg(long)]
        until: Option<String>,
    },

    /// Show recent analysis runs for a project
    Runs {
        /// Project ID
        project: String,

        /// Maximum number of runs
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let json = match args.format.as_str() {
        "text" => false,
        "json" => true,
        other => anyhow::bail!("unknown format '{}': expected text or json", other),
    };

    Config::ensure_xdg_env();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard =
        driftwatch_core::logging::init(&config.logging).context("failed to initialize logging")?;

    // Open database
    let db_path = Config::database_path();
    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;

    match args.command {
        Command::Projects => {
            let projects = db.list_projects()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&projects)?);
            } else if projects.is_empty() {
                println!("No projects found in database.");
            } else {
                println!(
                    "{:<24} {:>8} {:>7}  {:<16}  LAST ANALYZED",
                    "PROJECT", "COMMITS", "ACTIVE", "LAST COMMIT"
                );
                for p in &projects {
                    println!(
                        "{:<24} {:>8} {:>7}  {:<16}  {}",
                        p.id,
                        p.commit_count,
                        p.active_recommendations,
                        format_time(p.last_commit_at),
                        format_time(p.last_analyzed_at)
                    );
                }
            }
        }

        Command::Overview { project } => {
            let engine = create_engine(&config).context("invalid detector configuration")?;
            let overview = project_overview(&db, &engine, &project, Utc::now())
                .with_context(|| format!("failed to load overview for '{}'", project))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&overview)?);
            } else {
                println!("Project: {} ({})", overview.project.name, overview.project.id);
                if let Some(repo) = &overview.project.repo_full_name {
                    println!("Repository: {}", repo);
                }
                println!(
                    "Phase: {} (confidence {:.2})",
                    overview.phase.phase, overview.phase.confidence
                );
                println!("  {}", overview.phase.guidance);
                println!("Commits: {}", overview.commit_count);
                println!("Active recommendations: {}", overview.active_recommendations);
                println!("Last analyzed: {}", format_time(overview.last_analyzed_at));
                if let Some(window) = &overview.current_window {
                    println!(
                        "Current window: {} commits, ai {:.0}%, tests {:.0}%",
                        window.total_commits,
                        (window.ai_ratio * 100.0).round(),
                        (window.test_ratio * 100.0).round()
                    );
                }
                if let Some(trends) = &overview.trends {
                    println!(
                        "Trends: ai {}, tests {}, velocity {}, files/commit {}",
                        trends.ai_ratio.direction.as_str(),
                        trends.test_ratio.direction.as_str(),
                        trends.velocity.direction.as_str(),
                        trends.avg_files_per_commit.direction.as_str()
                    );
                }
            }
        }

        Command::Recommendations {
            project,
            status,
            severity,
            limit,
        } => {
            let filter = RecommendationFilter {
                status: match status.as_str() {
                    "all" => None,
                    s => Some(s.parse::<RecommendationStatus>().map_err(anyhow::Error::msg)?),
                },
                severity: severity
                    .map(|s| s.parse::<Severity>().map_err(anyhow::Error::msg))
                    .transpose()?,
                limit,
            };
            let recommendations = db.list_recommendations(&project, &filter)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&recommendations)?);
            } else if recommendations.is_empty() {
                println!("No recommendations.");
            } else {
                for rec in &recommendations {
                    print_recommendation(rec);
                }
            }
        }

        Command::Ack { id } => {
            let rec = db
                .update_recommendation_status(&id, RecommendationStatus::Acknowledged, Utc::now())
                .with_context(|| format!("failed to acknowledge {}", id))?;
            report_transition(&rec, json)?;
        }

        Command::Dismiss { id } => {
            let rec = db
                .update_recommendation_status(&id, RecommendationStatus::Dismissed, Utc::now())
                .with_context(|| format!("failed to dismiss {}", id))?;
            report_transition(&rec, json)?;
        }

        Command::Label { id, label } => {
            let label: AccuracyLabel = label.parse().map_err(anyhow::Error::msg)?;
            db.set_recommendation_accuracy(&id, label)
                .with_context(|| format!("failed to label {}", id))?;
            if json {
                let labeled = serde_json::json!({ "id": id, "accuracy": label.as_str() });
                println!("{}", serde_json::to_string_pretty(&labeled)?);
            } else {
                println!("Labeled {} as {}", id, label);
            }
        }

        Command::History {
            project,
            since,
            until,
        } => {
            let since = since.as_deref().map(parse_time).transpose()?;
            let until = until.as_deref().map(parse_time).transpose()?;
            let engine = create_engine(&config).context("invalid detector configuration")?;
            let windows = metric_history(&db, &engine, &project, since, until)
                .with_context(|| format!("failed to load history for '{}'", project))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&windows)?);
            } else if windows.is_empty() {
                println!("No commits in range.");
            } else {
                for window in &windows {
                    print_window(window);
                }
            }
        }

        Command::Runs { project, limit } => {
            let runs = db.get_analysis_runs(&project, limit)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&runs)?);
            } else if runs.is_empty() {
                println!("No analysis runs recorded for '{}'.", project);
            } else {
                for run in &runs {
                    let detected: Vec<&str> = run.detected.iter().map(|p| p.as_str()).collect();
                    println!(
                        "{}  {:<12} {:>5} commits  +{} -{}  {}ms  [{}]",
                        format_time(Some(run.analyzed_at)),
                        run.phase,
                        run.commit_count,
                        run.created_count,
                        run.resolved_count,
                        run.duration_ms,
                        detected.join(", ")
                    );
                }
            }
        }
    }

    Ok(())
}

fn print_recommendation(rec: &Recommendation) {
    println!("{}  [{}] {}", rec.id, rec.severity, rec.title);
    println!(
        "  {} · {} · detected {}",
        rec.pattern,
        rec.status,
        format_time(Some(rec.detected_at))
    );
    if let Some(accuracy) = rec.accuracy {
        println!("  accuracy: {}", accuracy);
    }
    println!("  {}", rec.description);
    for step in &rec.next_steps {
        println!("  - {}", step);
    }
    println!();
}

fn print_window(window: &MetricWindow) {
    println!(
        "{} - {}  {:>4} commits  ai {:>3.0}%  tests {:>3.0}%  {:.1} files/commit",
        window.window_start.format("%Y-%m-%d"),
        window.window_end.format("%Y-%m-%d"),
        window.total_commits,
        (window.ai_ratio * 100.0).round(),
        (window.test_ratio * 100.0).round(),
        window.avg_files_per_commit
    );
}

fn report_transition(rec: &Recommendation, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(rec)?);
    } else {
        println!("{} is now {}", rec.id, rec.status);
    }
    Ok(())
}

fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "never".to_string())
}

/// Parse an RFC 3339 timestamp or a bare date (midnight UTC).
fn parse_time(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(time) = DateTime::parse_from_rfc3339(value) {
        return Ok(time.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("invalid time '{}': expected RFC 3339 or YYYY-MM-DD", value))?;
    Ok(date.and_time(NaiveTime::MIN).and_utc())
}
