//! Recommendation engine
//!
//! Turns a project's recent commit history into a phase indicator and a
//! deduplicated set of active recommendations.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   RECOMMENDATION ENGINE                         │
//! │                                                                 │
//! │  load_commits ──► build_metric_windows ──► current + history    │
//! │                                               │                 │
//! │                        ┌──────────────────────┼──────────┐      │
//! │                        ▼                      ▼          ▼      │
//! │                  detect_phase        Detector A   Detector B ...│
//! │                                               │                 │
//! │                                               ▼                 │
//! │  find_active_recommendations ──► diff by pattern                │
//! │                                   ├─► create_recommendations    │
//! │                                   └─► resolve_recommendations   │
//! │                                                                 │
//! │  set_project_checkpoint                                         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Detectors and the phase classifier are pure. All I/O goes through a
//! [`RecommendationStore`] and happens sequentially in the order above.
//! Store errors propagate unchanged; the create and resolve writes are not
//! wrapped in a transaction.
//!
//! Runs for the same project must be serialized by the caller. Two
//! concurrent runs can both see "no active row" for a pattern and both
//! create one.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use driftwatch_core::analytics::create_default_engine;
//!
//! let engine = create_default_engine();
//! let result = engine.analyze_project("proj-1", &db)?;
//!
//! println!("phase: {}", result.phase.phase);
//! for rec in &result.recommendations {
//!     println!("{}: {}", rec.severity, rec.title);
//! }
//! ```

use crate::analytics::metrics::{build_metric_windows, MetricWindow, WindowTrends};
use crate::analytics::phase::{detect_phase, PhaseIndicator};
use crate::error::Result;
use crate::types::{ClassifiedCommit, PatternType, Recommendation, RecommendationInput};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::time::Instant;

/// Default metric window length.
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// Default history loaded per run.
pub const DEFAULT_LOOKBACK_WEEKS: u32 = 12;

/// Longest accepted metric window (one year).
pub const MAX_WINDOW_DAYS: u32 = 365;

/// Longest accepted lookback (ten years).
pub const MAX_LOOKBACK_WEEKS: u32 = 520;

// ============================================
// Detector context and trait
// ============================================

/// Inputs handed to every detector on a run.
///
/// `commits` is the full loaded commit set, not only the current window's
/// slice. Detectors that need window-scoped commits filter them.
pub struct DetectionContext<'a> {
    /// Latest window (zero-valued when nothing was loaded)
    pub current: &'a MetricWindow,
    /// Earlier windows, oldest first, excluding `current`
    pub history: &'a [MetricWindow],
    /// Loaded commits, oldest first
    pub commits: &'a [ClassifiedCommit],
}

impl<'a> DetectionContext<'a> {
    /// The window immediately before `current`, if any.
    pub fn previous(&self) -> Option<&'a MetricWindow> {
        self.history.last()
    }
}

/// Trait that all pattern detectors implement.
///
/// Detectors are pure: the same context always yields the same result, and
/// they hold no mutable state. Each detector decides on exactly one
/// pattern.
pub trait PatternDetector: Send + Sync {
    /// The pattern this detector reports.
    fn pattern(&self) -> PatternType;

    /// Unique name, defaults to the pattern's wire name.
    fn name(&self) -> &str {
        self.pattern().as_str()
    }

    /// Inspect the context and return a recommendation if the pattern fires.
    fn detect(&self, ctx: &DetectionContext<'_>) -> Option<RecommendationInput>;
}

// ============================================
// Persistence boundary
// ============================================

/// Storage the engine reads from and writes to.
///
/// Any implementation satisfying these operations works; see
/// [`Database`](crate::db::Database) for the SQLite one.
pub trait RecommendationStore {
    /// Commits for a project with `timestamp >= since`, oldest first.
    fn load_commits(&self, project_id: &str, since: DateTime<Utc>)
        -> Result<Vec<ClassifiedCommit>>;

    /// Recommendations for a project whose status is `active`.
    fn find_active_recommendations(&self, project_id: &str) -> Result<Vec<Recommendation>>;

    /// Persist new recommendations.
    fn create_recommendations(&self, recommendations: &[Recommendation]) -> Result<()>;

    /// Mark recommendations resolved at `resolved_at`.
    fn resolve_recommendations(&self, ids: &[String], resolved_at: DateTime<Utc>) -> Result<()>;

    /// Record when the project was last analyzed.
    fn set_project_checkpoint(&self, project_id: &str, at: DateTime<Utc>) -> Result<()>;
}

// ============================================
// Results
// ============================================

/// Pure output of windowing, phase detection and pattern detection.
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    /// Every pattern detected, in evaluation order
    pub recommendations: Vec<RecommendationInput>,
    pub phase: PhaseIndicator,
    /// Non-empty windows, oldest first
    pub windows: Vec<MetricWindow>,
}

/// Result of analyzing one project.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub project_id: String,
    /// Every pattern detected this run, not only new ones
    pub recommendations: Vec<RecommendationInput>,
    pub phase: PhaseIndicator,
    pub windows: Vec<MetricWindow>,
    /// Number of recommendations created
    pub created: usize,
    /// Ids of the active recommendations this run resolved
    pub resolved_ids: Vec<String>,
    /// Clock used for this run (detected_at, resolved_at, checkpoint)
    pub analyzed_at: DateTime<Utc>,
    pub duration_ms: i64,
}

impl AnalysisResult {
    /// The latest window, if any commits were loaded.
    pub fn current_window(&self) -> Option<&MetricWindow> {
        self.windows.last()
    }

    /// Trends between the two latest windows.
    pub fn trends(&self) -> Option<WindowTrends> {
        WindowTrends::from_windows(&self.windows)
    }

    /// Whether this run wrote any recommendation changes.
    pub fn changed(&self) -> bool {
        self.created > 0 || !self.resolved_ids.is_empty()
    }
}

// ============================================
// Engine
// ============================================

/// Engine that owns the registered detectors and runs analyses.
pub struct RecommendationEngine {
    detectors: Vec<Box<dyn PatternDetector>>,
    window_days: u32,
    lookback_weeks: u32,
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RecommendationEngine {
    /// Create a new engine with no detectors and default window sizes.
    pub fn new() -> Self {
        Self {
            detectors: Vec::new(),
            window_days: DEFAULT_WINDOW_DAYS,
            lookback_weeks: DEFAULT_LOOKBACK_WEEKS,
        }
    }

    /// Set the metric window length, clamped to `1..=MAX_WINDOW_DAYS`.
    pub fn with_window_days(mut self, days: u32) -> Self {
        self.window_days = days.clamp(1, MAX_WINDOW_DAYS);
        self
    }

    /// Set how many weeks of commits each run loads, clamped to `1..=MAX_LOOKBACK_WEEKS`.
    pub fn with_lookback_weeks(mut self, weeks: u32) -> Self {
        self.lookback_weeks = weeks.clamp(1, MAX_LOOKBACK_WEEKS);
        self
    }

    pub fn window_days(&self) -> u32 {
        self.window_days
    }

    pub fn lookback_weeks(&self) -> u32 {
        self.lookback_weeks
    }

    /// Register a detector. Detectors run in registration order.
    pub fn register(&mut self, detector: Box<dyn PatternDetector>) {
        tracing::debug!(detector = detector.name(), "Registered pattern detector");
        self.detectors.push(detector);
    }

    /// Names of the registered detectors, in evaluation order.
    pub fn detector_names(&self) -> Vec<&str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Check if a detector is registered.
    pub fn has_detector(&self, name: &str) -> bool {
        self.detectors.iter().any(|d| d.name() == name)
    }

    /// Run every detector against one context.
    pub fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<RecommendationInput> {
        self.detectors
            .iter()
            .filter_map(|detector| {
                let found = detector.detect(ctx);
                if let Some(rec) = &found {
                    tracing::debug!(
                        detector = detector.name(),
                        severity = %rec.severity,
                        evidence_commits = rec.evidence.commits.len(),
                        "Pattern detected"
                    );
                }
                found
            })
            .collect()
    }

    /// Window the commits, classify the phase and run every detector.
    ///
    /// `now` stamps the zero-valued window used when there are no commits.
    pub fn evaluate(&self, commits: &[ClassifiedCommit], now: DateTime<Utc>) -> Evaluation {
        let windows = build_metric_windows(commits, self.window_days);
        let empty;
        let (current, history) = match windows.split_last() {
            Some((current, history)) => (current, history),
            None => {
                empty = MetricWindow::empty(now);
                (&empty, &windows[..])
            }
        };

        let phase = detect_phase(current, history);
        let ctx = DetectionContext {
            current,
            history,
            commits,
        };
        let recommendations = self.detect(&ctx);

        Evaluation {
            recommendations,
            phase,
            windows,
        }
    }

    /// Analyze a project using the current time.
    pub fn analyze_project(
        &self,
        project_id: &str,
        store: &dyn RecommendationStore,
    ) -> Result<AnalysisResult> {
        self.analyze_project_at(project_id, store, Utc::now())
    }

    /// Analyze a project as of `now`.
    ///
    /// Loads the lookback window, evaluates it, creates recommendations for
    /// patterns that have no active row and resolves active rows whose
    /// pattern was not detected. Already-active patterns that are still
    /// detected are left alone, so an unchanged re-run writes nothing but
    /// the checkpoint.
    pub fn analyze_project_at(
        &self,
        project_id: &str,
        store: &dyn RecommendationStore,
        now: DateTime<Utc>,
    ) -> Result<AnalysisResult> {
        let start = Instant::now();
        let since = now - Duration::weeks(i64::from(self.lookback_weeks));

        tracing::info!(
            project_id,
            since = %since,
            detectors = self.detectors.len(),
            "Starting analysis"
        );

        let mut commits = store.load_commits(project_id, since)?;
        commits.sort_by_key(|c| c.timestamp);

        let evaluation = self.evaluate(&commits, now);

        tracing::debug!(
            project_id,
            commits = commits.len(),
            windows = evaluation.windows.len(),
            phase = %evaluation.phase.phase,
            "Built metric windows"
        );

        let active = store.find_active_recommendations(project_id)?;

        let active_patterns: HashSet<PatternType> = active.iter().map(|r| r.pattern).collect();
        let detected_patterns: HashSet<PatternType> = evaluation
            .recommendations
            .iter()
            .map(|r| r.pattern)
            .collect();

        let new_recommendations: Vec<Recommendation> = evaluation
            .recommendations
            .iter()
            .filter(|r| !active_patterns.contains(&r.pattern))
            .map(|r| Recommendation::from_input(project_id, r, now))
            .collect();

        let resolved_ids: Vec<String> = active
            .iter()
            .filter(|r| !detected_patterns.contains(&r.pattern))
            .map(|r| r.id.clone())
            .collect();

        if !new_recommendations.is_empty() {
            store.create_recommendations(&new_recommendations)?;
        }

        if !resolved_ids.is_empty() {
            store.resolve_recommendations(&resolved_ids, now)?;
        }

        store.set_project_checkpoint(project_id, now)?;

        let duration_ms = start.elapsed().as_millis() as i64;

        tracing::info!(
            project_id,
            detected = evaluation.recommendations.len(),
            created = new_recommendations.len(),
            resolved = resolved_ids.len(),
            duration_ms,
            "Analysis complete"
        );

        Ok(AnalysisResult {
            project_id: project_id.to_string(),
            recommendations: evaluation.recommendations,
            phase: evaluation.phase,
            windows: evaluation.windows,
            created: new_recommendations.len(),
            resolved_ids,
            analyzed_at: now,
            duration_ms,
        })
    }
}
