//! Workflow phase classification
//!
//! Synthesizes the latest [`MetricWindow`] (and recent history) into a single
//! "you are here" indicator. There is no stored phase and no transition
//! table: every call scores four candidates from scratch and returns the best.
//!
//! ## Scoring
//!
//! | Phase | Signals |
//! |-------|---------|
//! | `building` | base 0.2; feature ratio; tests present; velocity above 5 commits |
//! | `drifting` | high AI ratio; high cleanup ratio; thin tests |
//! | `stabilizing` | cleanup declining; test ratio improving; refactoring; good tests |
//! | `ship-ready` | steady commit counts; good tests; low churn; features landing |
//!
//! `stabilizing` needs one history window and `ship-ready` needs two; with
//! less history they score 0. Ties go to the candidate listed first.

use crate::analytics::metrics::{percent, MetricWindow};
use crate::types::CommitCategory;
use serde::{Deserialize, Serialize};

/// Where a project is in its build/clean-up/ship cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectPhase {
    Building,
    Drifting,
    Stabilizing,
    ShipReady,
}

impl ProjectPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectPhase::Building => "building",
            ProjectPhase::Drifting => "drifting",
            ProjectPhase::Stabilizing => "stabilizing",
            ProjectPhase::ShipReady => "ship-ready",
        }
    }

    /// Static advice shown with the phase.
    pub fn guidance(&self) -> &'static str {
        match self {
            ProjectPhase::Building => "Keep shipping. Watch for churn creeping in.",
            ProjectPhase::Drifting => {
                "Slow down. Focus on refactoring and adding tests before generating more code."
            }
            ProjectPhase::Stabilizing => "Polish. Write docs. Prepare to ship.",
            ProjectPhase::ShipReady => "Ready to ship. Focus on polish and documentation.",
        }
    }
}

impl std::fmt::Display for ProjectPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of phase classification for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseIndicator {
    pub phase: ProjectPhase,
    /// Winning score clamped to `[0, 1]`
    pub confidence: f64,
    /// Human-readable evidence, in the order it was gathered
    pub signals: Vec<String>,
    pub guidance: String,
}

/// One scored candidate.
struct PhaseScore {
    phase: ProjectPhase,
    score: f64,
    signals: Vec<String>,
}

impl PhaseScore {
    fn new(phase: ProjectPhase, base: f64) -> Self {
        Self {
            phase,
            score: base,
            signals: Vec::new(),
        }
    }

    fn add(&mut self, points: f64, signal: impl Into<String>) {
        self.score += points;
        self.signals.push(signal.into());
    }
}

fn pct(ratio: f64) -> String {
    format!("{:.0}%", percent(ratio))
}

/// Classify the current phase from the latest window and its history.
///
/// `history` is ordered oldest to newest and excludes `current`.
pub fn detect_phase(current: &MetricWindow, history: &[MetricWindow]) -> PhaseIndicator {
    let [building, rest @ ..] = [
        score_building(current),
        score_drifting(current),
        score_stabilizing(current, history),
        score_ship_ready(current, history),
    ];

    // Strict comparison: on a tie the earlier candidate wins
    let best = rest.into_iter().fold(building, |best, candidate| {
        if candidate.score > best.score {
            candidate
        } else {
            best
        }
    });

    PhaseIndicator {
        phase: best.phase,
        confidence: best.score.clamp(0.0, 1.0),
        signals: best.signals,
        guidance: best.phase.guidance().to_string(),
    }
}

fn score_building(current: &MetricWindow) -> PhaseScore {
    let mut s = PhaseScore::new(ProjectPhase::Building, 0.2);

    let feat = current.feat_ratio();
    if feat > 0.3 {
        s.add(0.4, format!("Feature ratio {}, features are landing", pct(feat)));
    } else if feat > 0.15 {
        s.add(0.2, format!("Feature ratio {}, some features landing", pct(feat)));
    }

    if current.test_ratio > 0.1 {
        s.add(0.2, "Tests present alongside features");
    }

    if current.total_commits > 5 {
        s.add(0.1, "Active development velocity");
    }

    s
}

fn score_drifting(current: &MetricWindow) -> PhaseScore {
    let mut s = PhaseScore::new(ProjectPhase::Drifting, 0.0);

    if current.ai_ratio > 0.7 {
        s.add(
            0.3,
            format!("AI ratio {}, heavy AI generation", pct(current.ai_ratio)),
        );
    } else if current.ai_ratio > 0.5 {
        // Contributes to the score without a signal of its own
        s.score += 0.1;
    }

    let cleanup = current.cleanup_ratio();
    if cleanup > 0.5 {
        s.add(
            0.4,
            format!("Cleanup ratio {}, fixes and refactors dominating", pct(cleanup)),
        );
    } else if cleanup > 0.3 {
        s.add(
            0.2,
            format!("Cleanup ratio {}, significant cleanup activity", pct(cleanup)),
        );
    }

    if current.test_ratio < 0.1 {
        s.add(0.2, "Test coverage thin");
    }

    s
}

fn score_stabilizing(current: &MetricWindow, history: &[MetricWindow]) -> PhaseScore {
    let mut s = PhaseScore::new(ProjectPhase::Stabilizing, 0.0);

    let Some(previous) = history.last() else {
        return s;
    };

    let prev_cleanup = previous.cleanup_ratio();
    let cur_cleanup = current.cleanup_ratio();
    if prev_cleanup > cur_cleanup && cur_cleanup < 0.5 {
        s.add(
            0.3,
            format!(
                "Cleanup declining: {} -> {}",
                pct(prev_cleanup),
                pct(cur_cleanup)
            ),
        );
    }

    if current.test_ratio > previous.test_ratio {
        s.add(
            0.3,
            format!(
                "Test ratio improving: {} -> {}",
                pct(previous.test_ratio),
                pct(current.test_ratio)
            ),
        );
    }

    if current.count(CommitCategory::Refactor) > 0 {
        s.add(0.1, "Active refactoring");
    }

    if current.test_ratio > 0.2 {
        s.add(0.2, "Good test coverage");
    }

    s
}

fn score_ship_ready(current: &MetricWindow, history: &[MetricWindow]) -> PhaseScore {
    let mut s = PhaseScore::new(ProjectPhase::ShipReady, 0.0);

    if history.len() < 2 {
        return s;
    }

    let recent: Vec<f64> = history[history.len() - 2..]
        .iter()
        .chain(std::iter::once(current))
        .map(|w| w.total_commits as f64)
        .collect();
    let mean = recent.iter().sum::<f64>() / recent.len() as f64;
    let mad = recent.iter().map(|c| (c - mean).abs()).sum::<f64>() / recent.len() as f64;
    if mean > 0.0 && mad / mean < 0.3 {
        s.add(0.3, "Stable development velocity");
    }

    if current.test_ratio > 0.2 {
        s.add(
            0.3,
            format!("Test ratio {}, good coverage", pct(current.test_ratio)),
        );
    }

    if current.cleanup_ratio() < 0.3 {
        s.add(0.2, "Low churn, code is settling");
    }

    if current.feat_ratio() > 0.15 {
        s.add(0.1, "Features still landing");
    }

    s
}
