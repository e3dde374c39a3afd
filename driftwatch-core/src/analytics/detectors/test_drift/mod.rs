//! Test Drift
//!
//! Tests falling behind AI output. Needs one history window and fires when
//! all of these hold for the current window:
//!
//! - AI ratio `>= ai_ratio` (0.5)
//! - test ratio `< test_ratio` (0.15)
//! - test ratio below the previous window's
//!
//! ## Evidence
//!
//! | Metric | Description |
//! |--------|-------------|
//! | `currentAiRatio` | AI ratio of the current window |
//! | `currentTestRatio` | test ratio of the current window |
//! | `previousTestRatio` | test ratio of the previous window |

use crate::analytics::engine::{DetectionContext, PatternDetector};
use crate::analytics::metrics::percent;
use crate::config::TestDriftThresholds;
use crate::types::{Evidence, PatternType, RecommendationInput};

pub struct TestDriftDetector {
    thresholds: TestDriftThresholds,
}

impl TestDriftDetector {
    pub fn new(thresholds: TestDriftThresholds) -> Self {
        Self { thresholds }
    }
}

impl Default for TestDriftDetector {
    fn default() -> Self {
        Self::new(TestDriftThresholds::default())
    }
}

impl PatternDetector for TestDriftDetector {
    fn pattern(&self) -> PatternType {
        PatternType::TestDrift
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Option<RecommendationInput> {
        let previous = ctx.previous()?;
        let current = ctx.current;

        if current.ai_ratio < self.thresholds.ai_ratio
            || current.test_ratio >= self.thresholds.test_ratio
            || current.test_ratio >= previous.test_ratio
        {
            return None;
        }

        let commits = ctx.commits.iter().map(|c| c.sha.clone()).collect();

        Some(RecommendationInput::new(
            PatternType::TestDrift,
            "Test Coverage Falling Behind AI Output",
            format!(
                "Tests are falling behind your AI output. Your test ratio dropped from {:.0}% \
                 to {:.0}% while AI contributions remain high at {:.0}%.",
                percent(previous.test_ratio),
                percent(current.test_ratio),
                percent(current.ai_ratio)
            ),
            Evidence::new(
                commits,
                [
                    ("currentAiRatio", current.ai_ratio),
                    ("currentTestRatio", current.test_ratio),
                    ("previousTestRatio", previous.test_ratio),
                ],
            ),
            &[
                "Review recent AI-generated code for test coverage gaps",
                "Add tests for untested functionality before continuing",
                "Consider slowing feature development to stabilize quality",
            ],
        ))
    }
}
