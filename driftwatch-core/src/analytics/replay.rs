//! Detector replay over a commit history
//!
//! Walks every metric window oldest to newest and runs the engine's
//! detectors as if each window were the current one, recording the first
//! window in which each pattern fired. Used to validate detectors against a
//! known history.
//!
//! Unlike [`RecommendationEngine::analyze_project`], detectors here only see
//! the commits inside the window being replayed (`[start, end)`), not the
//! whole loaded history. Detectors that count commits (sprint drift,
//! changelog silence, evidence lists) can therefore disagree between the
//! two modes.

use crate::analytics::engine::{DetectionContext, RecommendationEngine};
use crate::analytics::metrics::{build_metric_windows, MetricWindow};
use crate::analytics::phase::{detect_phase, PhaseIndicator};
use crate::types::{ClassifiedCommit, PatternType, RecommendationInput};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// The first window in which a pattern fired.
#[derive(Debug, Clone, Serialize)]
pub struct FirstDetection {
    /// Index into [`ReplayReport::windows`]
    pub window_index: usize,
    pub window_start: DateTime<Utc>,
    pub recommendation: RecommendationInput,
}

/// Result of replaying a history.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub windows: Vec<MetricWindow>,
    /// One entry per pattern that fired, ordered by window then evaluation order
    pub detections: Vec<FirstDetection>,
    /// Phase of the latest window, `None` without commits
    pub phase: Option<PhaseIndicator>,
}

impl ReplayReport {
    /// The first detection of a pattern, if it ever fired.
    pub fn first(&self, pattern: PatternType) -> Option<&FirstDetection> {
        self.detections
            .iter()
            .find(|d| d.recommendation.pattern == pattern)
    }

    /// Expected patterns that never fired.
    pub fn missing(&self, expected: &[PatternType]) -> Vec<PatternType> {
        expected
            .iter()
            .copied()
            .filter(|p| self.first(*p).is_none())
            .collect()
    }
}

/// Replay the engine's detectors window by window.
pub fn replay_detections(
    commits: &[ClassifiedCommit],
    engine: &RecommendationEngine,
) -> ReplayReport {
    let mut sorted = commits.to_vec();
    sorted.sort_by_key(|c| c.timestamp);

    let windows = build_metric_windows(&sorted, engine.window_days());
    let mut detections: Vec<FirstDetection> = Vec::new();

    for (index, current) in windows.iter().enumerate() {
        let in_window: Vec<ClassifiedCommit> = sorted
            .iter()
            .filter(|c| current.contains(c.timestamp))
            .cloned()
            .collect();

        let ctx = DetectionContext {
            current,
            history: &windows[..index],
            commits: &in_window,
        };

        for rec in engine.detect(&ctx) {
            if detections
                .iter()
                .any(|d| d.recommendation.pattern == rec.pattern)
            {
                continue;
            }
            tracing::debug!(
                pattern = rec.pattern.as_str(),
                window = index,
                "First detection during replay"
            );
            detections.push(FirstDetection {
                window_index: index,
                window_start: current.window_start,
                recommendation: rec,
            });
        }
    }

    let phase = windows
        .split_last()
        .map(|(current, history)| detect_phase(current, history));

    ReplayReport {
        windows,
        detections,
        phase,
    }
}
