//! Shared fixtures for analytics unit tests.

use crate::analytics::metrics::MetricWindow;
use crate::types::{AuthorType, ClassifiedCommit, CommitCategory};
use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_SHA: AtomicUsize = AtomicUsize::new(1);

/// Midnight UTC on day `n` counted from 2026-01-01 (day 1).
pub fn day(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::days(n - 1)
}

/// Start building a human `feat` commit at `ts` touching 3 files.
pub fn commit(ts: DateTime<Utc>) -> CommitBuilder {
    let n = NEXT_SHA.fetch_add(1, Ordering::Relaxed);
    CommitBuilder {
        commit: ClassifiedCommit {
            sha: format!("sha-{n:05}"),
            message: "feat: something".to_string(),
            author_name: "Megan".to_string(),
            author_email: "megan@example.com".to_string(),
            author_type: AuthorType::Human,
            ai_tool: None,
            category: CommitCategory::Feat,
            files_changed: 3,
            insertions: 0,
            deletions: 0,
            test_files_touched: 0,
            timestamp: ts,
        },
    }
}

pub struct CommitBuilder {
    commit: ClassifiedCommit,
}

impl CommitBuilder {
    pub fn ai(mut self, tool: &str) -> Self {
        self.commit.author_type = AuthorType::Ai;
        self.commit.ai_tool = Some(tool.to_string());
        self
    }

    pub fn bot(mut self) -> Self {
        self.commit.author_type = AuthorType::Bot;
        self.commit.ai_tool = None;
        self
    }

    pub fn category(mut self, category: CommitCategory) -> Self {
        self.commit.category = category;
        self
    }

    pub fn message(mut self, message: &str) -> Self {
        self.commit.message = message.to_string();
        self
    }

    pub fn files(mut self, changed: u32, tests: u32) -> Self {
        self.commit.files_changed = changed;
        self.commit.test_files_touched = tests;
        self
    }

    pub fn sha(mut self, sha: &str) -> Self {
        self.commit.sha = sha.to_string();
        self
    }

    pub fn build(self) -> ClassifiedCommit {
        self.commit
    }
}

/// A window over `[day(1), day(8))` with ten commits and the given ratios.
///
/// Counts are filled so that the invariants hold; tests override fields
/// they care about with struct update syntax.
pub fn window(ai_ratio: f64, test_ratio: f64) -> MetricWindow {
    let mut w = MetricWindow::empty(day(1));
    w.window_end = day(8);
    w.total_commits = 10;
    w.ai_commits = (ai_ratio * 10.0).round() as u32;
    w.human_commits = 10 - w.ai_commits;
    w.ai_ratio = ai_ratio;
    w.category_distribution.insert(CommitCategory::Feat, 10);
    w.total_files_changed = 30;
    w.total_test_files_touched = (test_ratio * 30.0).round() as u64;
    w.test_ratio = test_ratio;
    w.avg_files_per_commit = 3.0;
    w
}

/// Set the category counts of a window, keeping the rest at zero.
pub fn with_categories(mut w: MetricWindow, counts: &[(CommitCategory, u32)]) -> MetricWindow {
    for c in CommitCategory::ALL {
        w.category_distribution.insert(c, 0);
    }
    for (c, n) in counts {
        w.category_distribution.insert(*c, *n);
    }
    w.total_commits = counts.iter().map(|(_, n)| n).sum();
    w
}

/// Arbitrary commits spread over roughly four months from day(1).
///
/// Test files never exceed files changed, as in classified input.
pub fn arb_commits(max_len: usize) -> impl Strategy<Value = Vec<ClassifiedCommit>> {
    let one = (
        0i64..60 * 24 * 120,
        0u8..3,
        0usize..CommitCategory::ALL.len(),
        0u32..20,
        0u32..=20,
    )
        .prop_map(|(minutes, author, category, files, tests)| {
            let builder = commit(day(1) + Duration::minutes(minutes))
                .category(CommitCategory::ALL[category])
                .files(files, tests.min(files));
            match author {
                0 => builder.build(),
                1 => builder.ai("Claude Code").build(),
                _ => builder.bot().build(),
            }
        });
    prop::collection::vec(one, 0..max_len)
}
