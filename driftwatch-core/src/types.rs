//! Core domain types for driftwatch
//!
//! These types describe commits that have already been classified upstream
//! and the recommendations the engine derives from them.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Project** | A repository whose commit history is analyzed |
//! | **Classified commit** | A commit annotated with author type, category, and file-touch counts |
//! | **Pattern** | A named heuristic describing a workflow anti-pattern (or one positive pattern) |
//! | **Recommendation** | A persisted record of a pattern firing for a project |
//!
//! Classification itself (deciding whether a commit is AI-authored, which
//! category it belongs to) happens outside this crate. Records arriving here
//! are trusted to carry valid enum values and timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================
// Project
// ============================================

/// A repository tracked by driftwatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier
    pub id: String,
    /// Human-friendly name
    pub name: String,
    /// `owner/repo` on the hosting service, if known
    pub repo_full_name: Option<String>,
    /// When this project was first registered
    pub created_at: DateTime<Utc>,
    /// Checkpoint stamped by the recommendation engine after each run
    pub last_analyzed_at: Option<DateTime<Utc>>,
}

// ============================================
// Commit classification
// ============================================

/// Who authored a commit, as decided by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorType {
    Human,
    Ai,
    Bot,
}

impl AuthorType {
    /// Returns the identifier used in database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorType::Human => "human",
            AuthorType::Ai => "ai",
            AuthorType::Bot => "bot",
        }
    }
}

impl std::fmt::Display for AuthorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AuthorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "human" => Ok(AuthorType::Human),
            "ai" => Ok(AuthorType::Ai),
            "bot" => Ok(AuthorType::Bot),
            _ => Err(format!("unknown author type: {}", s)),
        }
    }
}

/// Conventional-commit style category assigned by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitCategory {
    Feat,
    Fix,
    Refactor,
    Docs,
    Test,
    Chore,
    Ci,
    Perf,
    Other,
}

impl CommitCategory {
    /// Every category, in canonical order.
    pub const ALL: [CommitCategory; 9] = [
        CommitCategory::Feat,
        CommitCategory::Fix,
        CommitCategory::Refactor,
        CommitCategory::Docs,
        CommitCategory::Test,
        CommitCategory::Chore,
        CommitCategory::Ci,
        CommitCategory::Perf,
        CommitCategory::Other,
    ];

    /// Returns the identifier used in database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitCategory::Feat => "feat",
            CommitCategory::Fix => "fix",
            CommitCategory::Refactor => "refactor",
            CommitCategory::Docs => "docs",
            CommitCategory::Test => "test",
            CommitCategory::Chore => "chore",
            CommitCategory::Ci => "ci",
            CommitCategory::Perf => "perf",
            CommitCategory::Other => "other",
        }
    }

    /// Fix, refactor and chore commits count as cleanup work.
    pub fn is_cleanup(&self) -> bool {
        matches!(
            self,
            CommitCategory::Fix | CommitCategory::Refactor | CommitCategory::Chore
        )
    }
}

impl std::fmt::Display for CommitCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CommitCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommitCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown commit category: {}", s))
    }
}

/// A commit that has already been classified upstream.
///
/// Immutable input to the analysis pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedCommit {
    /// Commit hash
    pub sha: String,
    /// Full commit message
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_email: String,
    /// Human, AI or bot
    pub author_type: AuthorType,
    /// Name of the AI tool for AI-authored commits (e.g. "Claude Code")
    #[serde(default)]
    pub ai_tool: Option<String>,
    pub category: CommitCategory,
    #[serde(default)]
    pub files_changed: u32,
    #[serde(default)]
    pub insertions: u32,
    #[serde(default)]
    pub deletions: u32,
    /// Number of changed files that are tests
    #[serde(default)]
    pub test_files_touched: u32,
    /// Commit timestamp
    pub timestamp: DateTime<Utc>,
}

// ============================================
// Recommendations
// ============================================

/// The seven named heuristics the engine evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternType {
    SprintDrift,
    GhostChurn,
    AiHandoffCliff,
    ToolTransition,
    TestDrift,
    ChangelogSilence,
    WorkflowBreakthrough,
}

impl PatternType {
    /// Every pattern, in evaluation order.
    pub const ALL: [PatternType; 7] = [
        PatternType::SprintDrift,
        PatternType::GhostChurn,
        PatternType::AiHandoffCliff,
        PatternType::ToolTransition,
        PatternType::TestDrift,
        PatternType::ChangelogSilence,
        PatternType::WorkflowBreakthrough,
    ];

    /// Returns the identifier used in database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::SprintDrift => "sprint-drift",
            PatternType::GhostChurn => "ghost-churn",
            PatternType::AiHandoffCliff => "ai-handoff-cliff",
            PatternType::ToolTransition => "tool-transition",
            PatternType::TestDrift => "test-drift",
            PatternType::ChangelogSilence => "changelog-silence",
            PatternType::WorkflowBreakthrough => "workflow-breakthrough",
        }
    }

    /// Severity is fixed per pattern.
    pub fn severity(&self) -> Severity {
        match self {
            PatternType::SprintDrift => Severity::Medium,
            PatternType::GhostChurn => Severity::High,
            PatternType::AiHandoffCliff => Severity::Critical,
            PatternType::ToolTransition => Severity::Low,
            PatternType::TestDrift => Severity::High,
            PatternType::ChangelogSilence => Severity::Medium,
            PatternType::WorkflowBreakthrough => Severity::Low,
        }
    }
}

impl std::fmt::Display for PatternType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PatternType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PatternType::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown pattern: {}", s))
    }
}

/// How urgently a recommendation should be looked at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "critical" => Ok(Severity::Critical),
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            _ => Err(format!("unknown severity: {}", s)),
        }
    }
}

/// Lifecycle status of a persisted recommendation.
///
/// `Active` moves to `Acknowledged` or `Dismissed` through an external actor,
/// or to `Resolved` when the engine stops detecting the pattern. The engine
/// never reactivates a closed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationStatus {
    Active,
    Acknowledged,
    Dismissed,
    Resolved,
}

impl RecommendationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationStatus::Active => "active",
            RecommendationStatus::Acknowledged => "acknowledged",
            RecommendationStatus::Dismissed => "dismissed",
            RecommendationStatus::Resolved => "resolved",
        }
    }

    /// Closed statuses are never changed by the engine.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RecommendationStatus::Active)
    }
}

impl std::fmt::Display for RecommendationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RecommendationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(RecommendationStatus::Active),
            "acknowledged" => Ok(RecommendationStatus::Acknowledged),
            "dismissed" => Ok(RecommendationStatus::Dismissed),
            "resolved" => Ok(RecommendationStatus::Resolved),
            _ => Err(format!("unknown recommendation status: {}", s)),
        }
    }
}

/// Feedback label a reviewer can attach to a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccuracyLabel {
    TruePositive,
    FalsePositive,
    Useful,
    Noisy,
}

impl AccuracyLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccuracyLabel::TruePositive => "true-positive",
            AccuracyLabel::FalsePositive => "false-positive",
            AccuracyLabel::Useful => "useful",
            AccuracyLabel::Noisy => "noisy",
        }
    }
}

impl std::fmt::Display for AccuracyLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AccuracyLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "true-positive" => Ok(AccuracyLabel::TruePositive),
            "false-positive" => Ok(AccuracyLabel::FalsePositive),
            "useful" => Ok(AccuracyLabel::Useful),
            "noisy" => Ok(AccuracyLabel::Noisy),
            _ => Err(format!("unknown accuracy label: {}", s)),
        }
    }
}

/// Supporting data attached to a recommendation.
///
/// `metrics` has no fixed schema; each detector picks its own keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// SHAs of the commits that triggered the pattern
    pub commits: Vec<String>,
    /// Files involved, when a detector tracks them
    pub files: Vec<String>,
    /// Detector-specific numeric measurements
    pub metrics: BTreeMap<String, f64>,
}

impl Evidence {
    /// Evidence listing the given commits and metrics, with no files.
    pub fn new<I, K>(commits: Vec<String>, metrics: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            commits,
            files: Vec::new(),
            metrics: metrics.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Look up a metric by name.
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}

/// A detector's output before it is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationInput {
    pub pattern: PatternType,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub evidence: Evidence,
    pub next_steps: Vec<String>,
}

impl RecommendationInput {
    /// Build a detection; severity comes from the pattern.
    pub fn new(
        pattern: PatternType,
        title: impl Into<String>,
        description: impl Into<String>,
        evidence: Evidence,
        next_steps: &[&str],
    ) -> Self {
        Self {
            pattern,
            severity: pattern.severity(),
            title: title.into(),
            description: description.into(),
            evidence,
            next_steps: next_steps.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// A persisted recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    /// UUID v4
    pub id: String,
    pub project_id: String,
    pub pattern: PatternType,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub evidence: Evidence,
    pub next_steps: Vec<String>,
    pub status: RecommendationStatus,
    /// Reviewer feedback, if any
    pub accuracy: Option<AccuracyLabel>,
    pub detected_at: DateTime<Utc>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub dismissed_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Recommendation {
    /// Build a new active recommendation from a detection.
    pub fn from_input(
        project_id: &str,
        input: &RecommendationInput,
        detected_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            project_id: project_id.to_string(),
            pattern: input.pattern,
            severity: input.severity,
            title: input.title.clone(),
            description: input.description.clone(),
            evidence: input.evidence.clone(),
            next_steps: input.next_steps.clone(),
            status: RecommendationStatus::Active,
            accuracy: None,
            detected_at,
            acknowledged_at: None,
            dismissed_at: None,
            resolved_at: None,
        }
    }
}
