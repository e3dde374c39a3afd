//! Ghost Churn
//!
//! AI-generated code that gets reverted or deleted within days.
//!
//! ## Algorithm
//!
//! 1. Keep the loaded commits whose timestamp falls inside the current
//!    window (both bounds inclusive).
//! 2. A non-AI commit is a *ghost* when it lands at most `window_days`
//!    after some AI commit and its message matches
//!    `revert|delete|remove|undo|rollback` as a whole word, ignoring case.
//! 3. Fire when `ghosts / ai_commits > ghost_ratio` (default 0.2).
//!
//! ## Evidence
//!
//! | Metric | Description |
//! |--------|-------------|
//! | `aiCommitCount` | AI commits in the window |
//! | `ghostCommitCount` | ghost commits in the window |
//! | `ghostRatioPercent` | `round(ghosts / ai_commits * 100)` |
//!
//! `commits` lists the AI commit SHAs followed by the ghost SHAs.

use crate::analytics::engine::{DetectionContext, PatternDetector};
use crate::config::GhostChurnThresholds;
use crate::types::{AuthorType, ClassifiedCommit, Evidence, PatternType, RecommendationInput};
use chrono::Duration;
use regex::Regex;
use std::sync::LazyLock;

static GHOST_MESSAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(revert|delete|remove|undo|rollback)\b").unwrap()
});

/// Whether a commit message reads like a reversal.
pub fn is_ghost_message(message: &str) -> bool {
    GHOST_MESSAGE.is_match(message)
}

pub struct GhostChurnDetector {
    thresholds: GhostChurnThresholds,
}

impl GhostChurnDetector {
    pub fn new(thresholds: GhostChurnThresholds) -> Self {
        Self { thresholds }
    }
}

impl Default for GhostChurnDetector {
    fn default() -> Self {
        Self::new(GhostChurnThresholds::default())
    }
}

impl PatternDetector for GhostChurnDetector {
    fn pattern(&self) -> PatternType {
        PatternType::GhostChurn
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Option<RecommendationInput> {
        let current = ctx.current;
        let in_window: Vec<&ClassifiedCommit> = ctx
            .commits
            .iter()
            .filter(|c| c.timestamp >= current.window_start && c.timestamp <= current.window_end)
            .collect();

        let ai: Vec<&ClassifiedCommit> = in_window
            .iter()
            .copied()
            .filter(|c| c.author_type == AuthorType::Ai)
            .collect();
        if ai.is_empty() {
            return None;
        }

        let reach = Duration::days(i64::from(self.thresholds.window_days));
        let ghosts: Vec<&ClassifiedCommit> = in_window
            .iter()
            .copied()
            .filter(|c| c.author_type != AuthorType::Ai)
            .filter(|c| {
                ai.iter()
                    .any(|a| c.timestamp >= a.timestamp && c.timestamp - a.timestamp <= reach)
            })
            .filter(|c| is_ghost_message(&c.message))
            .collect();
        if ghosts.is_empty() {
            return None;
        }

        let ghost_ratio = ghosts.len() as f64 / ai.len() as f64;
        if ghost_ratio <= self.thresholds.ghost_ratio {
            return None;
        }

        let commits = ai
            .iter()
            .chain(ghosts.iter())
            .map(|c| c.sha.clone())
            .collect();
        let metrics = [
            ("aiCommitCount", ai.len() as f64),
            ("ghostCommitCount", ghosts.len() as f64),
            ("ghostRatioPercent", (ghost_ratio * 100.0).round()),
        ];

        Some(RecommendationInput::new(
            PatternType::GhostChurn,
            "AI-generated code is being reverted shortly after commit",
            "A significant portion of AI-generated commits are being reverted, deleted, or \
             removed within days. The generated code may not be meeting quality standards \
             or may be introducing issues that require rollback.",
            Evidence::new(commits, metrics),
            &[
                "Review the reverted commits to identify common patterns or quality issues",
                "Consider adjusting your AI prompts or context to improve code quality",
                "Add integration tests to catch issues before committing AI-generated code",
                "Increase code review rigor for AI-generated changes",
            ],
        ))
    }
}
