//! AI Handoff Cliff
//!
//! AI-generated code is arriving faster than the developer can review or
//! test it. Fires when the current window's AI ratio is above `ai_ratio`
//! (0.7) while its test ratio is below `test_ratio` (0.1).
//!
//! Evidence lists every loaded AI commit with the window's `aiRatio`,
//! `testRatio` and `avgFilesPerCommit`.

use crate::analytics::engine::{DetectionContext, PatternDetector};
use crate::analytics::metrics::percent;
use crate::config::AiHandoffCliffThresholds;
use crate::types::{AuthorType, Evidence, PatternType, RecommendationInput};

pub struct AiHandoffCliffDetector {
    thresholds: AiHandoffCliffThresholds,
}

impl AiHandoffCliffDetector {
    pub fn new(thresholds: AiHandoffCliffThresholds) -> Self {
        Self { thresholds }
    }
}

impl Default for AiHandoffCliffDetector {
    fn default() -> Self {
        Self::new(AiHandoffCliffThresholds::default())
    }
}

impl PatternDetector for AiHandoffCliffDetector {
    fn pattern(&self) -> PatternType {
        PatternType::AiHandoffCliff
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Option<RecommendationInput> {
        let current = ctx.current;
        if ctx.commits.is_empty()
            || current.ai_ratio <= self.thresholds.ai_ratio
            || current.test_ratio >= self.thresholds.test_ratio
        {
            return None;
        }

        let ai_shas = ctx
            .commits
            .iter()
            .filter(|c| c.author_type == AuthorType::Ai)
            .map(|c| c.sha.clone())
            .collect();

        Some(RecommendationInput::new(
            PatternType::AiHandoffCliff,
            "AI Handoff Cliff",
            format!(
                "AI ratio is {:.0}% but test ratio is only {:.0}%. AI-generated code may be \
                 exceeding your review capacity.",
                percent(current.ai_ratio),
                percent(current.test_ratio)
            ),
            Evidence::new(
                ai_shas,
                [
                    ("aiRatio", current.ai_ratio),
                    ("testRatio", current.test_ratio),
                    ("avgFilesPerCommit", current.avg_files_per_commit),
                ],
            ),
            &[
                "Add tests for recent AI-generated code before generating more.",
                "Review large AI commits for correctness before moving on.",
                "Consider smaller, more focused AI prompts.",
            ],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::testing::{commit, day, window};
    use crate::types::Severity;

    #[test]
    fn test_fires_on_high_ai_low_tests() {
        let current = window(0.85, 0.05);
        let commits = vec![
            commit(day(1)).ai("Claude Code").sha("a1").build(),
            commit(day(2)).sha("h1").build(),
        ];
        let ctx = DetectionContext {
            current: &current,
            history: &[],
            commits: &commits,
        };

        let rec = AiHandoffCliffDetector::default()
            .detect(&ctx)
            .expect("handoff cliff should fire");

        assert_eq!(rec.pattern, PatternType::AiHandoffCliff);
        assert_eq!(rec.severity, Severity::Critical);
        assert_eq!(rec.evidence.commits, vec!["a1"]);
        assert_eq!(rec.evidence.metric("aiRatio"), Some(0.85));
        assert!(rec.description.starts_with("AI ratio is 85% but test ratio is only 5%"));
    }

    #[test]
    fn test_boundaries_are_strict() {
        let commits = vec![commit(day(1)).ai("Claude Code").build()];
        let detector = AiHandoffCliffDetector::default();

        for (ai, test) in [(0.7, 0.0), (0.9, 0.1)] {
            let current = window(ai, test);
            let ctx = DetectionContext {
                current: &current,
                history: &[],
                commits: &commits,
            };
            assert!(detector.detect(&ctx).is_none(), "ai={ai} test={test}");
        }
    }

    #[test]
    fn test_requires_commits() {
        let current = window(0.85, 0.05);
        let ctx = DetectionContext {
            current: &current,
            history: &[],
            commits: &[],
        };
        assert!(AiHandoffCliffDetector::default().detect(&ctx).is_none());
    }
}
