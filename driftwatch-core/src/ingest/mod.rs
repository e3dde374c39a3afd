//! Ingestion of classified commits
//!
//! Classification happens upstream; this module only reads its output and
//! stores it.
//!
//! ## Accepted formats
//!
//! ```text
//! ┌──────────────────────┐     ┌────────────────┐     ┌──────────────┐
//! │ JSON Lines           │     │                │     │              │
//! │  {"sha": ...}        │ ──► │ parse_commits  │ ──► │  Database    │
//! │  {"sha": ...}        │     │                │     │  (commits)   │
//! │ or a JSON array      │     └────────────────┘     └──────────────┘
//! └──────────────────────┘
//! ```
//!
//! Each record is a serialized [`ClassifiedCommit`]. Blank lines are skipped.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use driftwatch_core::ingest::{import_commits, read_commits};
//!
//! let commits = read_commits(Path::new("history.jsonl"))?;
//! let result = import_commits(&db, "my-project", &commits)?;
//! println!("Inserted {} of {} commits", result.inserted, result.received);
//! ```

use crate::db::Database;
use crate::error::{Error, Result};
use crate::types::ClassifiedCommit;
use std::path::Path;

/// Outcome of importing one batch of commits.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportResult {
    /// Records read from the input
    pub received: usize,
    /// Rows actually inserted
    pub inserted: usize,
    /// Records whose SHA was already stored
    pub duplicates: usize,
}

/// Parse commits from JSON Lines or a JSON array.
///
/// The first malformed record fails the whole parse with
/// [`Error::Import`], carrying its 1-based line (JSON Lines) or position
/// (array).
pub fn parse_commits(content: &str) -> Result<Vec<ClassifiedCommit>> {
    if content.trim_start().starts_with('[') {
        return parse_array(content);
    }

    let mut commits = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let commit = serde_json::from_str(line).map_err(|e| Error::Import {
            line: index + 1,
            message: e.to_string(),
        })?;
        commits.push(commit);
    }

    Ok(commits)
}

fn parse_array(content: &str) -> Result<Vec<ClassifiedCommit>> {
    let records: Vec<serde_json::Value> =
        serde_json::from_str(content).map_err(|e| Error::Import {
            line: e.line(),
            message: e.to_string(),
        })?;

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            serde_json::from_value(record).map_err(|e| Error::Import {
                line: index + 1,
                message: e.to_string(),
            })
        })
        .collect()
}

/// Read and parse a commit file.
pub fn read_commits(path: &Path) -> Result<Vec<ClassifiedCommit>> {
    let content = std::fs::read_to_string(path)?;
    let commits = parse_commits(&content)?;
    tracing::debug!(path = %path.display(), records = commits.len(), "Read commit file");
    Ok(commits)
}

/// Store commits for an existing project, skipping known SHAs.
pub fn import_commits(
    db: &Database,
    project_id: &str,
    commits: &[ClassifiedCommit],
) -> Result<ImportResult> {
    let inserted = db.insert_commits(project_id, commits)?;
    let result = ImportResult {
        received: commits.len(),
        inserted,
        duplicates: commits.len() - inserted,
    };

    tracing::info!(
        project_id,
        received = result.received,
        inserted = result.inserted,
        duplicates = result.duplicates,
        "Import complete"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AuthorType, CommitCategory, Project};
    use chrono::Utc;

    const TWO_COMMITS: &str = r#"
{"sha": "a1", "author_type": "ai", "ai_tool": "Cursor", "category": "feat", "files_changed": 5, "timestamp": "2026-02-02T10:00:00Z"}

{"sha": "b2", "message": "Revert \"feat: x\"", "author_type": "human", "category": "other", "timestamp": "2026-02-03T10:00:00+02:00"}
"#;

    #[test]
    fn test_parse_json_lines() {
        let commits = parse_commits(TWO_COMMITS).unwrap();

        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].author_type, AuthorType::Ai);
        assert_eq!(commits[0].ai_tool.as_deref(), Some("Cursor"));
        assert_eq!(commits[1].category, CommitCategory::Other);
        // Offsets normalize to UTC
        assert_eq!(commits[1].timestamp.to_rfc3339(), "2026-02-03T08:00:00+00:00");
    }

    #[test]
    fn test_parse_json_array() {
        let content = r#"[
            {"sha": "a1", "author_type": "bot", "category": "chore", "timestamp": "2026-02-02T10:00:00Z"}
        ]"#;
        let commits = parse_commits(content).unwrap();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].author_type, AuthorType::Bot);
    }

    #[test]
    fn test_parse_reports_bad_line() {
        let content = format!(
            "{}\n{{\"sha\": \"c3\", \"author_type\": \"robot\", \"category\": \"feat\", \"timestamp\": \"2026-02-04T10:00:00Z\"}}\n",
            TWO_COMMITS.trim()
        );
        match parse_commits(&content).unwrap_err() {
            Error::Import { line, message } => {
                assert_eq!(line, 4);
                assert!(message.contains("robot"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_reports_bad_array_record() {
        let content = r#"[
            {"sha": "a1", "author_type": "ai", "category": "feat", "timestamp": "2026-02-02T10:00:00Z"},
            {"sha": "a2", "author_type": "ai", "category": "feat"}
        ]"#;
        assert!(matches!(
            parse_commits(content).unwrap_err(),
            Error::Import { line: 2, .. }
        ));
    }

    #[test]
    fn test_import_counts_duplicates() {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db.upsert_project(&Project {
            id: "p".to_string(),
            name: "p".to_string(),
            repo_full_name: None,
            created_at: Utc::now(),
            last_analyzed_at: None,
        })
        .unwrap();

        let commits = parse_commits(TWO_COMMITS).unwrap();
        let first = import_commits(&db, "p", &commits).unwrap();
        let second = import_commits(&db, "p", &commits).unwrap();

        assert_eq!(first.inserted, 2);
        assert_eq!(
            second,
            ImportResult {
                received: 2,
                inserted: 0,
                duplicates: 2
            }
        );
    }
}
