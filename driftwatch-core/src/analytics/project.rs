//! Project-level analytics for CLI display.
//!
//! Read-only summaries; nothing here writes to the database.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::analytics::engine::RecommendationEngine;
use crate::analytics::metrics::{build_metric_windows, MetricWindow, WindowTrends};
use crate::analytics::phase::{detect_phase, PhaseIndicator};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::types::Project;

/// Row for project list display (lightweight, for table view).
#[derive(Debug, Clone, Serialize)]
pub struct ProjectRow {
    /// Project ID
    pub id: String,
    /// Human-readable project name
    pub name: String,
    /// `owner/repo`, if known
    pub repo_full_name: Option<String>,
    /// Number of stored commits
    pub commit_count: i64,
    /// Number of active recommendations
    pub active_recommendations: i64,
    /// Timestamp of the newest stored commit
    pub last_commit_at: Option<DateTime<Utc>>,
    /// Last engine checkpoint
    pub last_analyzed_at: Option<DateTime<Utc>>,
}

/// Current state of a single project.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectOverview {
    pub project: Project,
    /// Phase recomputed from the lookback window
    pub phase: PhaseIndicator,
    pub active_recommendations: i64,
    /// All stored commits, not only the lookback window
    pub commit_count: i64,
    pub last_analyzed_at: Option<DateTime<Utc>>,
    /// Latest window in the lookback range
    pub current_window: Option<MetricWindow>,
    /// Latest two windows compared, when there are two
    pub trends: Option<WindowTrends>,
}

/// Build an overview for a project as of `now`.
///
/// Uses the engine's window length and lookback; runs no detectors.
pub fn project_overview(
    db: &Database,
    engine: &RecommendationEngine,
    project_id: &str,
    now: DateTime<Utc>,
) -> Result<ProjectOverview> {
    let project = db
        .get_project(project_id)?
        .ok_or_else(|| Error::ProjectNotFound(project_id.to_string()))?;

    let since = now - Duration::weeks(i64::from(engine.lookback_weeks()));
    let commits = db.load_commits_between(project_id, Some(since), None)?;
    let windows = build_metric_windows(&commits, engine.window_days());

    let phase = match windows.split_last() {
        Some((current, history)) => detect_phase(current, history),
        None => detect_phase(&MetricWindow::empty(now), &[]),
    };

    Ok(ProjectOverview {
        phase,
        active_recommendations: db.count_active_recommendations(project_id)?,
        commit_count: db.count_commits(project_id)?,
        last_analyzed_at: project.last_analyzed_at,
        trends: WindowTrends::from_windows(&windows),
        current_window: windows.last().cloned(),
        project,
    })
}

/// Metric windows over the commits in `[since, until)`, oldest first.
///
/// Either bound may be open. Windows use the engine's window length and are
/// anchored at the earliest commit in range.
pub fn metric_history(
    db: &Database,
    engine: &RecommendationEngine,
    project_id: &str,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
) -> Result<Vec<MetricWindow>> {
    if db.get_project(project_id)?.is_none() {
        return Err(Error::ProjectNotFound(project_id.to_string()));
    }

    let commits = db.load_commits_between(project_id, since, until)?;
    tracing::debug!(
        project_id,
        commits = commits.len(),
        "Building metric history"
    );
    Ok(build_metric_windows(&commits, engine.window_days()))
}
