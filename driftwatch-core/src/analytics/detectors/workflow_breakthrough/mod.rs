//! Workflow Breakthrough
//!
//! A sustained step up in AI share. This is the one positive pattern: it
//! suggests the developer found an effective AI-augmented flow.
//!
//! ## Algorithm
//!
//! 1. Require `min_history_windows` (2) history windows.
//! 2. Count *sustained* windows: start at 1 for the current window, then
//!    walk history backwards. A history window counts while its AI ratio
//!    exceeds the average of every strictly earlier window by more than
//!    `increase` (0.15), and while at least `min_history_windows` earlier
//!    windows exist to average.
//! 3. Require `min_sustained_windows` (2) sustained windows.
//! 4. The baseline is history with the sustained history windows removed;
//!    it needs `min_history_windows` windows.
//! 5. Fire when `current.ai_ratio - mean(baseline) > increase`.
//!
//! ## Evidence
//!
//! | Metric | Description |
//! |--------|-------------|
//! | `currentAiRatio` | current AI ratio, 3 decimals |
//! | `historicalAverage` | baseline mean AI ratio, 3 decimals |
//! | `sustainedWeeks` | sustained window count |
//! | `increasePct` | increase in whole percentage points |

use crate::analytics::engine::{DetectionContext, PatternDetector};
use crate::analytics::metrics::{percent, MetricWindow};
use crate::config::WorkflowBreakthroughThresholds;
use crate::types::{Evidence, PatternType, RecommendationInput};

pub struct WorkflowBreakthroughDetector {
    thresholds: WorkflowBreakthroughThresholds,
}

impl WorkflowBreakthroughDetector {
    pub fn new(thresholds: WorkflowBreakthroughThresholds) -> Self {
        Self { thresholds }
    }

    /// Consecutive elevated windows ending at the current one.
    fn sustained_windows(&self, history: &[MetricWindow]) -> usize {
        let mut count = 1;
        for i in (0..history.len()).rev() {
            let earlier = &history[..i];
            if earlier.len() < self.thresholds.min_history_windows {
                break;
            }
            if history[i].ai_ratio - average_ai_ratio(earlier) > self.thresholds.increase {
                count += 1;
            } else {
                break;
            }
        }
        count
    }
}

impl Default for WorkflowBreakthroughDetector {
    fn default() -> Self {
        Self::new(WorkflowBreakthroughThresholds::default())
    }
}

fn average_ai_ratio(windows: &[MetricWindow]) -> f64 {
    if windows.is_empty() {
        return 0.0;
    }
    windows.iter().map(|w| w.ai_ratio).sum::<f64>() / windows.len() as f64
}

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

impl PatternDetector for WorkflowBreakthroughDetector {
    fn pattern(&self) -> PatternType {
        PatternType::WorkflowBreakthrough
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Option<RecommendationInput> {
        let history = ctx.history;
        if history.len() < self.thresholds.min_history_windows {
            return None;
        }

        let sustained = self.sustained_windows(history);
        if sustained < self.thresholds.min_sustained_windows {
            return None;
        }

        let baseline = &history[..history.len().saturating_sub(sustained - 1)];
        if baseline.len() < self.thresholds.min_history_windows {
            return None;
        }

        let historical_average = average_ai_ratio(baseline);
        let current = ctx.current.ai_ratio;
        let increase = current - historical_average;
        if increase <= self.thresholds.increase {
            return None;
        }

        Some(RecommendationInput::new(
            PatternType::WorkflowBreakthrough,
            "Workflow Breakthrough: AI Acceleration Detected",
            format!(
                "Your AI workflow is accelerating! AI-assisted development jumped from {:.0}% \
                 to {:.0}% and has been sustained for {sustained} weeks. You've found an \
                 effective AI-augmented development flow.",
                percent(historical_average),
                percent(current)
            ),
            Evidence::new(
                Vec::new(),
                [
                    ("currentAiRatio", round_to(current, 3)),
                    ("historicalAverage", round_to(historical_average, 3)),
                    ("sustainedWeeks", sustained as f64),
                    ("increasePct", (increase * 100.0).round()),
                ],
            ),
            &[
                "Document what changed in your workflow to maintain this acceleration",
                "Share your AI prompting patterns with your team",
                "Monitor test coverage to ensure quality stays high during rapid development",
            ],
        ))
    }
}
