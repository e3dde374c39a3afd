//! Changelog Silence
//!
//! Lots of commits, few user-facing features: work is happening (fixes,
//! refactors, chores) but nothing user-visible ships.
//!
//! Counts the loaded non-bot commits. Fires when there are more than
//! `min_commits` (10) of them and fewer than `feat_ratio` (10%) are `feat`.
//!
//! Evidence lists the first ten non-bot commit SHAs with `totalCommits`,
//! `featCommits` and `featRatio`.

use crate::analytics::engine::{DetectionContext, PatternDetector};
use crate::analytics::metrics::percent;
use crate::config::ChangelogSilenceThresholds;
use crate::types::{AuthorType, CommitCategory, Evidence, PatternType, RecommendationInput};

/// Maximum commit SHAs attached as evidence.
const MAX_EVIDENCE_COMMITS: usize = 10;

pub struct ChangelogSilenceDetector {
    thresholds: ChangelogSilenceThresholds,
}

impl ChangelogSilenceDetector {
    pub fn new(thresholds: ChangelogSilenceThresholds) -> Self {
        Self { thresholds }
    }
}

impl Default for ChangelogSilenceDetector {
    fn default() -> Self {
        Self::new(ChangelogSilenceThresholds::default())
    }
}

impl PatternDetector for ChangelogSilenceDetector {
    fn pattern(&self) -> PatternType {
        PatternType::ChangelogSilence
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Option<RecommendationInput> {
        let non_bot: Vec<_> = ctx
            .commits
            .iter()
            .filter(|c| c.author_type != AuthorType::Bot)
            .collect();
        let total = non_bot.len();
        if total <= self.thresholds.min_commits {
            return None;
        }

        let feat = non_bot
            .iter()
            .filter(|c| c.category == CommitCategory::Feat)
            .count();
        let feat_ratio = feat as f64 / total as f64;
        if feat_ratio >= self.thresholds.feat_ratio {
            return None;
        }

        let commits = non_bot
            .iter()
            .take(MAX_EVIDENCE_COMMITS)
            .map(|c| c.sha.clone())
            .collect();

        Some(RecommendationInput::new(
            PatternType::ChangelogSilence,
            "Changelog Silence",
            format!(
                "{total} commits but only {feat} features ({:.0}%). You're shipping code but \
                 not features. Consider prioritizing user-visible work.",
                percent(feat_ratio)
            ),
            Evidence::new(
                commits,
                [
                    ("totalCommits", total as f64),
                    ("featCommits", feat as f64),
                    ("featRatio", feat_ratio),
                ],
            ),
            &[
                "Identify the next user-visible feature and prioritize it.",
                "Check if cleanup work is blocking feature delivery.",
                "Consider whether refactoring is producing diminishing returns.",
            ],
        ))
    }
}
