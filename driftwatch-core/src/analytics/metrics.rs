//! Metric windows
//!
//! Reduces classified commits into fixed-length [`MetricWindow`]s and compares
//! scalars across windows with [`calculate_trend`].
//!
//! ## Windowing
//!
//! Windows are anchored at the exact timestamp of the earliest commit (not
//! calendar-aligned) and advance by `window_days`. Each window covers the
//! half-open range `[start, end)`. Windows that contain no commits are
//! dropped, so consecutive windows are not necessarily adjacent in time.
//!
//! ## Ratios
//!
//! | Ratio | Definition |
//! |-------|------------|
//! | `ai_ratio` | `ai_commits / total_commits` |
//! | `test_ratio` | `total_test_files_touched / total_files_changed` |
//! | `avg_files_per_commit` | `total_files_changed / total_commits` |
//!
//! Every ratio is exactly `0.0` when its denominator is zero.

use crate::analytics::engine::MAX_WINDOW_DAYS;
use crate::types::{AuthorType, ClassifiedCommit, CommitCategory};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Relative change (in percent) at or below which a trend is `Stable`.
pub const TREND_STABLE_THRESHOLD_PERCENT: f64 = 10.0;

/// Aggregated metrics for one time window. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricWindow {
    /// Inclusive start
    pub window_start: DateTime<Utc>,
    /// Exclusive end
    pub window_end: DateTime<Utc>,
    pub total_commits: u32,
    pub ai_commits: u32,
    pub human_commits: u32,
    pub bot_commits: u32,
    pub ai_ratio: f64,
    /// Commit count per category; every category is present, possibly at zero
    pub category_distribution: BTreeMap<CommitCategory, u32>,
    pub total_files_changed: u64,
    pub total_test_files_touched: u64,
    pub test_ratio: f64,
    pub avg_files_per_commit: f64,
    /// Distinct AI tool names, sorted
    pub unique_ai_tools: Vec<String>,
}

impl MetricWindow {
    /// A zero-valued window spanning the single instant `at`.
    ///
    /// Used as the current window when a project has no commits in range.
    pub fn empty(at: DateTime<Utc>) -> Self {
        aggregate_metrics(&[], at, at)
    }

    /// Number of commits in a category.
    pub fn count(&self, category: CommitCategory) -> u32 {
        self.category_distribution
            .get(&category)
            .copied()
            .unwrap_or(0)
    }

    pub fn feat_commits(&self) -> u32 {
        self.count(CommitCategory::Feat)
    }

    /// Fix + refactor + chore commits.
    pub fn cleanup_commits(&self) -> u32 {
        CommitCategory::ALL
            .iter()
            .filter(|c| c.is_cleanup())
            .map(|c| self.count(*c))
            .sum()
    }

    /// Feature commits over all commits, 0 for an empty window.
    pub fn feat_ratio(&self) -> f64 {
        ratio(self.feat_commits() as f64, self.total_commits as f64)
    }

    /// Cleanup commits over all commits, 0 for an empty window.
    pub fn cleanup_ratio(&self) -> f64 {
        ratio(self.cleanup_commits() as f64, self.total_commits as f64)
    }

    /// Whether a timestamp falls inside `[window_start, window_end)`.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.window_start && ts < self.window_end
    }
}

/// `numerator / denominator`, or 0 when the denominator is 0.
pub(crate) fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// A ratio as a whole percentage, halves rounded up.
pub(crate) fn percent(ratio: f64) -> f64 {
    (ratio * 100.0).round()
}

/// Reduce a set of commits into one window with bounds `[start, end)`.
///
/// The commits are not checked against the bounds; callers pass the slice
/// they want aggregated.
pub fn aggregate_metrics(
    commits: &[ClassifiedCommit],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> MetricWindow {
    let mut category_distribution: BTreeMap<CommitCategory, u32> =
        CommitCategory::ALL.iter().map(|c| (*c, 0)).collect();

    let mut ai_commits = 0u32;
    let mut human_commits = 0u32;
    let mut bot_commits = 0u32;
    let mut total_files_changed = 0u64;
    let mut total_test_files_touched = 0u64;
    let mut ai_tools = BTreeSet::new();

    for commit in commits {
        match commit.author_type {
            AuthorType::Ai => {
                ai_commits += 1;
                if let Some(tool) = commit.ai_tool.as_deref().filter(|t| !t.is_empty()) {
                    ai_tools.insert(tool.to_string());
                }
            }
            AuthorType::Human => human_commits += 1,
            AuthorType::Bot => bot_commits += 1,
        }

        *category_distribution.entry(commit.category).or_insert(0) += 1;
        total_files_changed += u64::from(commit.files_changed);
        total_test_files_touched += u64::from(commit.test_files_touched);
    }

    let total_commits = commits.len() as u32;

    MetricWindow {
        window_start,
        window_end,
        total_commits,
        ai_commits,
        human_commits,
        bot_commits,
        ai_ratio: ratio(ai_commits as f64, total_commits as f64),
        category_distribution,
        total_files_changed,
        total_test_files_touched,
        test_ratio: ratio(
            total_test_files_touched as f64,
            total_files_changed as f64,
        ),
        avg_files_per_commit: ratio(total_files_changed as f64, total_commits as f64),
        unique_ai_tools: ai_tools.into_iter().collect(),
    }
}

/// Partition commits into non-empty windows of `window_days` days, oldest first.
///
/// The input does not need to be sorted. An empty input yields no windows.
/// `window_days` is clamped to `1..=MAX_WINDOW_DAYS`.
pub fn build_metric_windows(commits: &[ClassifiedCommit], window_days: u32) -> Vec<MetricWindow> {
    if commits.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<ClassifiedCommit> = commits.to_vec();
    sorted.sort_by_key(|c| c.timestamp);

    let span = Duration::days(i64::from(window_days.clamp(1, MAX_WINDOW_DAYS)));
    let latest = sorted[sorted.len() - 1].timestamp;

    let mut windows = Vec::new();
    let mut window_start = sorted[0].timestamp;
    let mut cursor = 0usize;

    while window_start <= latest {
        let window_end = window_start + span;
        let first = cursor;
        while cursor < sorted.len() && sorted[cursor].timestamp < window_end {
            cursor += 1;
        }

        if cursor > first {
            windows.push(aggregate_metrics(
                &sorted[first..cursor],
                window_start,
                window_end,
            ));
        }

        window_start = window_end;
    }

    windows
}

/// Direction of change between two values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Stable,
    Down,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Up => "up",
            TrendDirection::Stable => "stable",
            TrendDirection::Down => "down",
        }
    }
}

/// Comparison of a metric between the current and previous window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricTrend {
    pub current: f64,
    pub previous: f64,
    pub direction: TrendDirection,
    pub change_percent: f64,
}

/// Classify how `current` moved relative to `previous`.
///
/// - both zero: stable, 0%
/// - previous zero, current positive: up, 100%
/// - otherwise the relative change; within ±10% counts as stable
pub fn calculate_trend(current: f64, previous: f64) -> MetricTrend {
    if current == 0.0 && previous == 0.0 {
        return MetricTrend {
            current,
            previous,
            direction: TrendDirection::Stable,
            change_percent: 0.0,
        };
    }

    if previous == 0.0 {
        let up = current > 0.0;
        return MetricTrend {
            current,
            previous,
            direction: if up {
                TrendDirection::Up
            } else {
                TrendDirection::Stable
            },
            change_percent: if up { 100.0 } else { 0.0 },
        };
    }

    let change_percent = (current - previous) / previous * 100.0;
    let direction = if change_percent.abs() <= TREND_STABLE_THRESHOLD_PERCENT {
        TrendDirection::Stable
    } else if change_percent > 0.0 {
        TrendDirection::Up
    } else {
        TrendDirection::Down
    };

    MetricTrend {
        current,
        previous,
        direction,
        change_percent,
    }
}

/// Trends between the two most recent windows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowTrends {
    pub ai_ratio: MetricTrend,
    pub test_ratio: MetricTrend,
    /// Commits per window
    pub velocity: MetricTrend,
    pub avg_files_per_commit: MetricTrend,
}

impl WindowTrends {
    /// Compare the last window against the one before it.
    ///
    /// Returns `None` with fewer than two windows.
    pub fn from_windows(windows: &[MetricWindow]) -> Option<Self> {
        let [.., previous, current] = windows else {
            return None;
        };

        Some(Self {
            ai_ratio: calculate_trend(current.ai_ratio, previous.ai_ratio),
            test_ratio: calculate_trend(current.test_ratio, previous.test_ratio),
            velocity: calculate_trend(
                current.total_commits as f64,
                previous.total_commits as f64,
            ),
            avg_files_per_commit: calculate_trend(
                current.avg_files_per_commit,
                previous.avg_files_per_commit,
            ),
        })
    }
}
