//! Tool Transition
//!
//! Flags a change in the set of AI tools between the previous window and the
//! current one: a tool appeared, disappeared, or both. Needs one history
//! window. Two windows without any AI tool never fire.
//!
//! Evidence lists every loaded commit, with `currentAvgFiles` and
//! `previousAvgFiles` so the velocity effect of the switch is visible.

use crate::analytics::engine::{DetectionContext, PatternDetector};
use crate::types::{Evidence, PatternType, RecommendationInput};
use std::collections::BTreeSet;

pub struct ToolTransitionDetector;

impl PatternDetector for ToolTransitionDetector {
    fn pattern(&self) -> PatternType {
        PatternType::ToolTransition
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Option<RecommendationInput> {
        let previous = ctx.previous()?;
        let current = ctx.current;

        let current_tools: BTreeSet<&str> =
            current.unique_ai_tools.iter().map(String::as_str).collect();
        let previous_tools: BTreeSet<&str> =
            previous.unique_ai_tools.iter().map(String::as_str).collect();

        if current_tools == previous_tools {
            return None;
        }

        let added: Vec<&str> = current_tools.difference(&previous_tools).copied().collect();
        let removed: Vec<&str> = previous_tools.difference(&current_tools).copied().collect();

        let mut description =
            "You switched AI tools recently. Here's how it's affecting your workflow.".to_string();
        if !added.is_empty() {
            description.push_str(&format!(" Started using: {}.", added.join(", ")));
        }
        if !removed.is_empty() {
            description.push_str(&format!(" Stopped using: {}.", removed.join(", ")));
        }

        let commits = ctx.commits.iter().map(|c| c.sha.clone()).collect();

        Some(RecommendationInput::new(
            PatternType::ToolTransition,
            "Tool Transition Detected",
            description,
            Evidence::new(
                commits,
                [
                    ("currentAvgFiles", current.avg_files_per_commit),
                    ("previousAvgFiles", previous.avg_files_per_commit),
                ],
            ),
            &[
                "Monitor velocity for the next 1-2 weeks to see if it stabilizes.",
                "Note which tool works better for different types of tasks.",
            ],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::metrics::MetricWindow;
    use crate::analytics::testing::window;
    use crate::types::Severity;

    fn with_tools(tools: &[&str]) -> MetricWindow {
        let mut w = window(0.5, 0.2);
        w.unique_ai_tools = tools.iter().map(|t| t.to_string()).collect();
        w
    }

    fn run(previous: MetricWindow, current: MetricWindow) -> Option<RecommendationInput> {
        let history = [previous];
        let ctx = DetectionContext {
            current: &current,
            history: &history,
            commits: &[],
        };
        ToolTransitionDetector.detect(&ctx)
    }

    #[test]
    fn test_switching_tools_fires() {
        let rec = run(with_tools(&["GitHub Copilot"]), with_tools(&["Claude Code"]))
            .expect("tool transition should fire");

        assert_eq!(rec.severity, Severity::Low);
        assert!(rec.description.contains("Started using: Claude Code."));
        assert!(rec.description.contains("Stopped using: GitHub Copilot."));
        assert_eq!(rec.evidence.metric("currentAvgFiles"), Some(3.0));
    }

    #[test]
    fn test_adding_a_tool_fires() {
        assert!(run(
            with_tools(&["Claude Code"]),
            with_tools(&["Claude Code", "Cursor"])
        )
        .is_some());
        // Dropping every tool counts as a change too
        assert!(run(with_tools(&["Claude Code"]), with_tools(&[])).is_some());
    }

    #[test]
    fn test_same_tools_are_quiet() {
        assert!(run(with_tools(&["Claude Code"]), with_tools(&["Claude Code"])).is_none());
        assert!(run(with_tools(&[]), with_tools(&[])).is_none());
    }

    #[test]
    fn test_needs_history() {
        let current = with_tools(&["Claude Code"]);
        let ctx = DetectionContext {
            current: &current,
            history: &[],
            commits: &[],
        };
        assert!(ToolTransitionDetector.detect(&ctx).is_none());
    }
}
