//! Sprint-Drift Cycle
//!
//! Signal: AI share spikes, churn follows, cleanup commits pile up, repeat.
//!
//! ## Trigger
//!
//! - current window AI ratio `>= 0.6`
//! - `(fix + refactor + chore) / non-bot commits >= 0.5` over the loaded commits
//!
//! ## Evidence
//!
//! | Metric | Description |
//! |--------|-------------|
//! | `aiRatio` | AI ratio of the current window |
//! | `cleanupRatio` | cleanup commits over non-bot commits |
//! | `cleanupCommitCount` | number of cleanup commits |
//! | `totalNonBotCommits` | number of non-bot commits |
//!
//! `commits` lists the cleanup commit SHAs.

use crate::analytics::engine::{DetectionContext, PatternDetector};
use crate::config::SprintDriftThresholds;
use crate::types::{AuthorType, Evidence, PatternType, RecommendationInput};

pub struct SprintDriftDetector {
    thresholds: SprintDriftThresholds,
}

impl SprintDriftDetector {
    pub fn new(thresholds: SprintDriftThresholds) -> Self {
        Self { thresholds }
    }
}

impl Default for SprintDriftDetector {
    fn default() -> Self {
        Self::new(SprintDriftThresholds::default())
    }
}

impl PatternDetector for SprintDriftDetector {
    fn pattern(&self) -> PatternType {
        PatternType::SprintDrift
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Option<RecommendationInput> {
        if ctx.commits.is_empty() || ctx.current.ai_ratio < self.thresholds.ai_ratio {
            return None;
        }

        let non_bot: Vec<_> = ctx
            .commits
            .iter()
            .filter(|c| c.author_type != AuthorType::Bot)
            .collect();
        if non_bot.is_empty() {
            return None;
        }

        let cleanup: Vec<String> = non_bot
            .iter()
            .filter(|c| c.category.is_cleanup())
            .map(|c| c.sha.clone())
            .collect();
        let cleanup_ratio = cleanup.len() as f64 / non_bot.len() as f64;

        if cleanup_ratio < self.thresholds.cleanup_ratio {
            return None;
        }

        let metrics = [
            ("aiRatio", ctx.current.ai_ratio),
            ("cleanupRatio", cleanup_ratio),
            ("cleanupCommitCount", cleanup.len() as f64),
            ("totalNonBotCommits", non_bot.len() as f64),
        ];

        Some(RecommendationInput::new(
            PatternType::SprintDrift,
            "Sprint-Drift Cycle Detected",
            "High AI-assisted development followed by cleanup commits. This pattern \
             suggests rapid AI-generated code followed by human refinement.",
            Evidence::new(cleanup, metrics),
            &[
                "Review AI-generated code before committing to reduce cleanup cycles",
                "Consider pairing AI generation with immediate human review",
                "Track whether cleanup reduces over time as AI prompts improve",
            ],
        ))
    }
}
