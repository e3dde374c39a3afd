//! Pattern detectors
//!
//! Each detector lives in its own subdirectory and implements
//! [`PatternDetector`](super::PatternDetector) for exactly one pattern.
//!
//! ## Built-in Detectors
//!
//! Listed in evaluation order:
//!
//! | Detector | Pattern | Severity |
//! |----------|---------|----------|
//! | [`sprint_drift`] | heavy AI output followed by mostly cleanup commits | medium |
//! | [`ghost_churn`] | AI commits reverted or deleted within days | high |
//! | [`ai_handoff_cliff`] | AI output far ahead of test coverage | critical |
//! | [`tool_transition`] | the set of AI tools changed | low |
//! | [`test_drift`] | test ratio sliding while AI output stays high | high |
//! | [`changelog_silence`] | many commits, few features | medium |
//! | [`workflow_breakthrough`] | sustained step up in AI ratio (positive) | low |
//!
//! Thresholds default to the constants in each module and can be
//! overridden from `[thresholds.<detector>]` in the config file.
//!
//! Use [`create_default_engine`] for an engine with every detector, or
//! [`create_engine`] to honor a loaded [`Config`].

pub mod ai_handoff_cliff;
pub mod changelog_silence;
pub mod ghost_churn;
pub mod sprint_drift;
pub mod test_drift;
pub mod tool_transition;
pub mod workflow_breakthrough;

use super::RecommendationEngine;
use crate::config::{Config, DetectorThresholds};
use crate::error::Result;
use crate::types::PatternType;

/// Build the detector for a pattern from a set of thresholds.
fn detector_for(
    pattern: PatternType,
    thresholds: &DetectorThresholds,
) -> Box<dyn super::PatternDetector> {
    match pattern {
        PatternType::SprintDrift => Box::new(sprint_drift::SprintDriftDetector::new(
            thresholds.sprint_drift.clone(),
        )),
        PatternType::GhostChurn => Box::new(ghost_churn::GhostChurnDetector::new(
            thresholds.ghost_churn.clone(),
        )),
        PatternType::AiHandoffCliff => Box::new(ai_handoff_cliff::AiHandoffCliffDetector::new(
            thresholds.ai_handoff_cliff.clone(),
        )),
        PatternType::ToolTransition => Box::new(tool_transition::ToolTransitionDetector),
        PatternType::TestDrift => Box::new(test_drift::TestDriftDetector::new(
            thresholds.test_drift.clone(),
        )),
        PatternType::ChangelogSilence => Box::new(
            changelog_silence::ChangelogSilenceDetector::new(thresholds.changelog_silence.clone()),
        ),
        PatternType::WorkflowBreakthrough => Box::new(
            workflow_breakthrough::WorkflowBreakthroughDetector::new(
                thresholds.workflow_breakthrough.clone(),
            ),
        ),
    }
}

/// Create an engine with all built-in detectors and default thresholds.
///
/// ```rust,ignore
/// use driftwatch_core::analytics::create_default_engine;
///
/// let engine = create_default_engine();
/// println!("Registered detectors: {:?}", engine.detector_names());
/// ```
pub fn create_default_engine() -> RecommendationEngine {
    let thresholds = DetectorThresholds::default();
    let mut engine = RecommendationEngine::new();
    for pattern in PatternType::ALL {
        engine.register(detector_for(pattern, &thresholds));
    }
    engine
}

/// Create an engine from configuration.
///
/// Applies `[analysis]` window sizes and thresholds, and skips every
/// pattern listed in `disabled_detectors`. Active recommendations of a
/// disabled pattern are resolved on the next run, since nothing detects
/// them anymore.
pub fn create_engine(config: &Config) -> Result<RecommendationEngine> {
    let disabled = config.analysis.disabled_patterns()?;

    let mut engine = RecommendationEngine::new()
        .with_window_days(config.analysis.window_days)
        .with_lookback_weeks(config.analysis.lookback_weeks);

    for pattern in PatternType::ALL {
        if disabled.contains(&pattern) {
            tracing::info!(detector = pattern.as_str(), "Detector disabled by config");
            continue;
        }
        engine.register(detector_for(pattern, &config.thresholds));
    }

    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_engine_has_detectors_in_order() {
        let engine = create_default_engine();
        let names = engine.detector_names();

        let expected: Vec<&str> = PatternType::ALL.iter().map(|p| p.as_str()).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_create_engine_honors_config() {
        let config: Config = toml::from_str(
            r#"
[analysis]
window_days = 14
lookback_weeks = 4
disabled_detectors = ["tool-transition", "workflow-breakthrough"]
"#,
        )
        .unwrap();

        let engine = create_engine(&config).unwrap();

        assert_eq!(engine.window_days(), 14);
        assert_eq!(engine.lookback_weeks(), 4);
        assert_eq!(engine.detector_names().len(), 5);
        assert!(!engine.has_detector("tool-transition"));
        assert!(!engine.has_detector("workflow-breakthrough"));
        assert!(engine.has_detector("sprint-drift"));
    }

    #[test]
    fn test_create_engine_rejects_unknown_detector() {
        let mut config = Config::default();
        config.analysis.disabled_detectors = vec!["milestone".to_string()];
        assert!(create_engine(&config).is_err());
    }
}
