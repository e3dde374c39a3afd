//! Analytics module for driftwatch
//!
//! Turns a project's classified commit history into workflow insight:
//! - Weekly metric windows and window-over-window trends
//! - Project phase classification
//! - Pattern detectors and the recommendation engine that persists their output
//! - Replay of detectors over a known history
//! - Project-level summaries for display
//!
//! ## Detector Framework
//!
//! Each detector implements [`PatternDetector`] and sees one
//! [`DetectionContext`]: the current window, earlier windows, and the
//! loaded commits. The [`RecommendationEngine`] runs every registered
//! detector and reconciles the results against stored recommendations.
//!
//! See [`engine`] for the reconciliation rules and [`detectors`] for the
//! built-in patterns.

pub mod detectors;
pub mod engine;
pub mod metrics;
pub mod phase;
pub mod project;
pub mod replay;

#[cfg(test)]
pub(crate) mod testing;

// Engine exports
pub use detectors::{create_default_engine, create_engine};
pub use engine::{
    AnalysisResult, DetectionContext, Evaluation, PatternDetector, RecommendationEngine,
    RecommendationStore, DEFAULT_LOOKBACK_WEEKS, DEFAULT_WINDOW_DAYS, MAX_LOOKBACK_WEEKS,
    MAX_WINDOW_DAYS,
};

pub use metrics::{
    aggregate_metrics, build_metric_windows, calculate_trend, MetricTrend, MetricWindow,
    TrendDirection, WindowTrends,
};
pub use phase::{detect_phase, PhaseIndicator, ProjectPhase};
pub use project::{metric_history, project_overview, ProjectOverview, ProjectRow};
pub use replay::{replay_detections, FirstDetection, ReplayReport};
