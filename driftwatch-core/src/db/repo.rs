//! Database repository layer
//!
//! Provides query and insert operations for projects, commits,
//! recommendations and analysis runs, and implements
//! [`RecommendationStore`] for the engine.

use crate::analytics::engine::{AnalysisResult, RecommendationStore};
use crate::analytics::project::ProjectRow;
use crate::error::{Error, Result};
use crate::types::*;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Mutex;

/// Filter for listing recommendations.
///
/// The default lists active recommendations of every severity.
#[derive(Debug, Clone)]
pub struct RecommendationFilter {
    /// Only this status; `None` for every status
    pub status: Option<RecommendationStatus>,
    /// Only this severity
    pub severity: Option<Severity>,
    /// Maximum rows returned
    pub limit: Option<usize>,
}

impl Default for RecommendationFilter {
    fn default() -> Self {
        Self {
            status: Some(RecommendationStatus::Active),
            severity: None,
            limit: None,
        }
    }
}

impl RecommendationFilter {
    /// Every recommendation regardless of status.
    pub fn all() -> Self {
        Self {
            status: None,
            ..Self::default()
        }
    }
}

/// One recorded engine run, for observability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRun {
    /// Row id, 0 before insertion
    pub id: i64,
    pub project_id: String,
    pub analyzed_at: DateTime<Utc>,
    pub duration_ms: i64,
    /// Commits inside the lookback window
    pub commit_count: i64,
    pub window_count: i64,
    pub phase: String,
    pub confidence: f64,
    /// Patterns detected this run
    pub detected: Vec<PatternType>,
    pub created_count: i64,
    pub resolved_count: i64,
}

impl AnalysisRun {
    /// Summarize an engine result.
    pub fn from_result(result: &AnalysisResult) -> Self {
        Self {
            id: 0,
            project_id: result.project_id.clone(),
            analyzed_at: result.analyzed_at,
            duration_ms: result.duration_ms,
            commit_count: result
                .windows
                .iter()
                .map(|w| i64::from(w.total_commits))
                .sum(),
            window_count: result.windows.len() as i64,
            phase: result.phase.phase.as_str().to_string(),
            confidence: result.phase.confidence,
            detected: result.recommendations.iter().map(|r| r.pattern).collect(),
            created_count: result.created as i64,
            resolved_count: result.resolved_ids.len() as i64,
        }
    }
}

/// Format a timestamp for storage: UTC, microseconds, `Z` suffix.
fn ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error<E>(column: &str, err: E) -> rusqlite::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let err = err.into();
    tracing::warn!(column, error = %err, "Unreadable column value");
    rusqlite::Error::FromSqlConversionFailure(0, Type::Text, err)
}

fn get_ts(row: &Row, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(column, e))
}

fn get_opt_ts(row: &Row, column: &str) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(column)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_error(column, e))
    })
    .transpose()
}

fn get_enum<T>(row: &Row, column: &str) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    let raw: String = row.get(column)?;
    raw.parse().map_err(|e: String| conversion_error(column, e))
}

fn get_json<T: serde::de::DeserializeOwned>(row: &Row, column: &str) -> rusqlite::Result<T> {
    let raw: String = row.get(column)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(column, e))
}

/// Database handle with connection pooling (single connection for now)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &PathBuf) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable foreign keys and WAL mode for better concurrency
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        super::schema::run_migrations(&conn)
    }

    // ============================================
    // Project operations
    // ============================================

    /// Insert or update a project
    ///
    /// An existing project keeps its `created_at` and checkpoint.
    pub fn upsert_project(&self, project: &Project) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO projects (id, name, repo_full_name, created_at, last_analyzed_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                repo_full_name = COALESCE(excluded.repo_full_name, projects.repo_full_name)
            "#,
            params![
                project.id,
                project.name,
                project.repo_full_name,
                ts(project.created_at),
                project.last_analyzed_at.map(ts),
            ],
        )?;
        Ok(())
    }

    /// Get a project by ID
    pub fn get_project(&self, id: &str) -> Result<Option<Project>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM projects WHERE id = ?",
            [id],
            Self::row_to_project,
        )
        .optional()
        .map_err(Error::from)
    }

    /// List projects with commit and active recommendation counts, by name.
    pub fn list_projects(&self) -> Result<Vec<ProjectRow>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT
                p.id,
                p.name,
                p.repo_full_name,
                p.last_analyzed_at,
                (SELECT COUNT(*) FROM commits c WHERE c.project_id = p.id) AS commit_count,
                (SELECT MAX(c.timestamp) FROM commits c WHERE c.project_id = p.id) AS last_commit_at,
                (SELECT COUNT(*) FROM recommendations r
                    WHERE r.project_id = p.id AND r.status = 'active') AS active_recommendations
            FROM projects p
            ORDER BY p.name, p.id
            "#,
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(ProjectRow {
                    id: row.get("id")?,
                    name: row.get("name")?,
                    repo_full_name: row.get("repo_full_name")?,
                    commit_count: row.get("commit_count")?,
                    active_recommendations: row.get("active_recommendations")?,
                    last_commit_at: get_opt_ts(row, "last_commit_at")?,
                    last_analyzed_at: get_opt_ts(row, "last_analyzed_at")?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn row_to_project(row: &Row) -> rusqlite::Result<Project> {
        Ok(Project {
            id: row.get("id")?,
            name: row.get("name")?,
            repo_full_name: row.get("repo_full_name")?,
            created_at: get_ts(row, "created_at")?,
            last_analyzed_at: get_opt_ts(row, "last_analyzed_at")?,
        })
    }

    // ============================================
    // Commit operations
    // ============================================

    /// Insert classified commits in a transaction.
    ///
    /// Commits whose SHA is already stored for the project are skipped.
    /// Returns the number of rows actually inserted.
    pub fn insert_commits(&self, project_id: &str, commits: &[ClassifiedCommit]) -> Result<usize> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let exists: Option<String> = tx
            .query_row("SELECT id FROM projects WHERE id = ?", [project_id], |r| {
                r.get(0)
            })
            .optional()?;
        if exists.is_none() {
            return Err(Error::ProjectNotFound(project_id.to_string()));
        }

        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT OR IGNORE INTO commits (project_id, sha, message, author_name, author_email,
                                               author_type, ai_tool, category, files_changed,
                                               insertions, deletions, test_files_touched, timestamp)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                "#,
            )?;

            for commit in commits {
                inserted += stmt.execute(params![
                    project_id,
                    commit.sha,
                    commit.message,
                    commit.author_name,
                    commit.author_email,
                    commit.author_type.as_str(),
                    commit.ai_tool,
                    commit.category.as_str(),
                    commit.files_changed,
                    commit.insertions,
                    commit.deletions,
                    commit.test_files_touched,
                    ts(commit.timestamp),
                ])?;
            }
        }

        tx.commit()?;

        tracing::debug!(
            project_id,
            received = commits.len(),
            inserted,
            "Inserted commits"
        );

        Ok(inserted)
    }

    /// Number of commits stored for a project.
    pub fn count_commits(&self, project_id: &str) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM commits WHERE project_id = ?",
            [project_id],
            |r| r.get(0),
        )?;
        Ok(count)
    }

    /// Commits with `since <= timestamp < until`, oldest first.
    ///
    /// Either bound may be omitted.
    pub fn load_commits_between(
        &self,
        project_id: &str,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<ClassifiedCommit>> {
        let conn = self.conn.lock().unwrap();

        let mut sql = String::from("SELECT * FROM commits WHERE project_id = ?");
        let mut args: Vec<String> = vec![project_id.to_string()];
        if let Some(since) = since {
            sql.push_str(" AND timestamp >= ?");
            args.push(ts(since));
        }
        if let Some(until) = until {
            sql.push_str(" AND timestamp < ?");
            args.push(ts(until));
        }
        sql.push_str(" ORDER BY timestamp ASC, id ASC");

        let mut stmt = conn.prepare(&sql)?;
        let commits = stmt
            .query_map(params_from_iter(args.iter()), Self::row_to_commit)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(commits)
    }

    fn row_to_commit(row: &Row) -> rusqlite::Result<ClassifiedCommit> {
        Ok(ClassifiedCommit {
            sha: row.get("sha")?,
            message: row.get("message")?,
            author_name: row.get("author_name")?,
            author_email: row.get("author_email")?,
            author_type: get_enum(row, "author_type")?,
            ai_tool: row.get("ai_tool")?,
            category: get_enum(row, "category")?,
            files_changed: row.get("files_changed")?,
            insertions: row.get("insertions")?,
            deletions: row.get("deletions")?,
            test_files_touched: row.get("test_files_touched")?,
            timestamp: get_ts(row, "timestamp")?,
        })
    }

    // ============================================
    // Recommendation operations
    // ============================================

    /// Get a recommendation by ID
    pub fn get_recommendation(&self, id: &str) -> Result<Option<Recommendation>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM recommendations WHERE id = ?",
            [id],
            Self::row_to_recommendation,
        )
        .optional()
        .map_err(Error::from)
    }

    /// List a project's recommendations, newest first.
    pub fn list_recommendations(
        &self,
        project_id: &str,
        filter: &RecommendationFilter,
    ) -> Result<Vec<Recommendation>> {
        let conn = self.conn.lock().unwrap();

        let mut sql = String::from("SELECT * FROM recommendations WHERE project_id = ?");
        let mut args: Vec<String> = vec![project_id.to_string()];
        if let Some(status) = filter.status {
            sql.push_str(" AND status = ?");
            args.push(status.as_str().to_string());
        }
        if let Some(severity) = filter.severity {
            sql.push_str(" AND severity = ?");
            args.push(severity.as_str().to_string());
        }
        sql.push_str(" ORDER BY detected_at DESC, rowid DESC");
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let mut stmt = conn.prepare(&sql)?;
        let recommendations = stmt
            .query_map(params_from_iter(args.iter()), Self::row_to_recommendation)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(recommendations)
    }

    /// Number of active recommendations for a project.
    pub fn count_active_recommendations(&self, project_id: &str) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM recommendations WHERE project_id = ? AND status = 'active'",
            [project_id],
            |r| r.get(0),
        )?;
        Ok(count)
    }

    /// Acknowledge or dismiss an active recommendation.
    ///
    /// Stamps `acknowledged_at` or `dismissed_at` with `at`. Any other
    /// transition, including from a closed status, is
    /// [`Error::InvalidTransition`].
    pub fn update_recommendation_status(
        &self,
        id: &str,
        status: RecommendationStatus,
        at: DateTime<Utc>,
    ) -> Result<Recommendation> {
        let current = self
            .get_recommendation(id)?
            .ok_or_else(|| Error::RecommendationNotFound(id.to_string()))?;

        let column = match status {
            RecommendationStatus::Acknowledged => "acknowledged_at",
            RecommendationStatus::Dismissed => "dismissed_at",
            _ => return Err(Self::invalid_transition(&current, status)),
        };
        if current.status.is_terminal() {
            return Err(Self::invalid_transition(&current, status));
        }

        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            &format!(
                "UPDATE recommendations SET status = ?1, {} = ?2 WHERE id = ?3 AND status = 'active'",
                column
            ),
            params![status.as_str(), ts(at), id],
        )?;
        drop(conn);

        // Lost a race with the engine resolving it
        if changed == 0 {
            let latest = self
                .get_recommendation(id)?
                .ok_or_else(|| Error::RecommendationNotFound(id.to_string()))?;
            return Err(Self::invalid_transition(&latest, status));
        }

        tracing::info!(id, status = status.as_str(), "Recommendation status updated");

        self.get_recommendation(id)?
            .ok_or_else(|| Error::RecommendationNotFound(id.to_string()))
    }

    fn invalid_transition(current: &Recommendation, to: RecommendationStatus) -> Error {
        Error::InvalidTransition {
            id: current.id.clone(),
            from: current.status.as_str().to_string(),
            to: to.as_str().to_string(),
        }
    }

    /// Attach a reviewer accuracy label, replacing any previous one.
    pub fn set_recommendation_accuracy(&self, id: &str, label: AccuracyLabel) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE recommendations SET accuracy = ?1 WHERE id = ?2",
            params![label.as_str(), id],
        )?;
        if changed == 0 {
            return Err(Error::RecommendationNotFound(id.to_string()));
        }
        Ok(())
    }

    fn row_to_recommendation(row: &Row) -> rusqlite::Result<Recommendation> {
        let accuracy: Option<String> = row.get("accuracy")?;
        Ok(Recommendation {
            id: row.get("id")?,
            project_id: row.get("project_id")?,
            pattern: get_enum(row, "pattern")?,
            severity: get_enum(row, "severity")?,
            title: row.get("title")?,
            description: row.get("description")?,
            evidence: get_json(row, "evidence")?,
            next_steps: get_json(row, "next_steps")?,
            status: get_enum(row, "status")?,
            accuracy: accuracy
                .map(|s| s.parse::<AccuracyLabel>().map_err(|e| conversion_error("accuracy", e)))
                .transpose()?,
            detected_at: get_ts(row, "detected_at")?,
            acknowledged_at: get_opt_ts(row, "acknowledged_at")?,
            dismissed_at: get_opt_ts(row, "dismissed_at")?,
            resolved_at: get_opt_ts(row, "resolved_at")?,
        })
    }

    // ============================================
    // Analysis run operations
    // ============================================

    /// Record an analysis run. Returns the new row id.
    pub fn insert_analysis_run(&self, run: &AnalysisRun) -> Result<i64> {
        let detected: Vec<&str> = run.detected.iter().map(|p| p.as_str()).collect();
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO analysis_runs (project_id, analyzed_at, duration_ms, commit_count, window_count,
                                       phase, confidence, detected, created_count, resolved_count)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                run.project_id,
                ts(run.analyzed_at),
                run.duration_ms,
                run.commit_count,
                run.window_count,
                run.phase,
                run.confidence,
                serde_json::to_string(&detected)?,
                run.created_count,
                run.resolved_count,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Most recent analysis runs for a project, newest first.
    pub fn get_analysis_runs(&self, project_id: &str, limit: usize) -> Result<Vec<AnalysisRun>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM analysis_runs
            WHERE project_id = ?
            ORDER BY analyzed_at DESC, id DESC
            LIMIT ?
            "#,
        )?;

        let runs = stmt
            .query_map(params![project_id, limit as i64], |row| {
                let detected: Vec<String> = get_json(row, "detected")?;
                Ok(AnalysisRun {
                    id: row.get("id")?,
                    project_id: row.get("project_id")?,
                    analyzed_at: get_ts(row, "analyzed_at")?,
                    duration_ms: row.get("duration_ms")?,
                    commit_count: row.get("commit_count")?,
                    window_count: row.get("window_count")?,
                    phase: row.get("phase")?,
                    confidence: row.get("confidence")?,
                    // Patterns from older builds that no longer parse are dropped
                    detected: detected.iter().filter_map(|p| p.parse().ok()).collect(),
                    created_count: row.get("created_count")?,
                    resolved_count: row.get("resolved_count")?,
                })
            })?
            .filter_map(|r| r.ok())
            .collect();

        Ok(runs)
    }
}

impl RecommendationStore for Database {
    fn load_commits(
        &self,
        project_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<ClassifiedCommit>> {
        self.load_commits_between(project_id, Some(since), None)
    }

    fn find_active_recommendations(&self, project_id: &str) -> Result<Vec<Recommendation>> {
        self.list_recommendations(project_id, &RecommendationFilter::default())
    }

    fn create_recommendations(&self, recommendations: &[Recommendation]) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        for rec in recommendations {
            tx.execute(
                r#"
                INSERT INTO recommendations (id, project_id, pattern, severity, title, description,
                                             evidence, next_steps, status, accuracy, detected_at,
                                             acknowledged_at, dismissed_at, resolved_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                "#,
                params![
                    rec.id,
                    rec.project_id,
                    rec.pattern.as_str(),
                    rec.severity.as_str(),
                    rec.title,
                    rec.description,
                    serde_json::to_string(&rec.evidence)?,
                    serde_json::to_string(&rec.next_steps)?,
                    rec.status.as_str(),
                    rec.accuracy.map(|a| a.as_str()),
                    ts(rec.detected_at),
                    rec.acknowledged_at.map(ts),
                    rec.dismissed_at.map(ts),
                    rec.resolved_at.map(ts),
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn resolve_recommendations(&self, ids: &[String], resolved_at: DateTime<Utc>) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let resolved_at = ts(resolved_at);
        for id in ids {
            // Rows closed by a reviewer in the meantime stay closed
            tx.execute(
                r#"
                UPDATE recommendations
                SET status = 'resolved', resolved_at = ?1
                WHERE id = ?2 AND status = 'active'
                "#,
                params![resolved_at, id],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn set_project_checkpoint(&self, project_id: &str, at: DateTime<Utc>) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE projects SET last_analyzed_at = ?1 WHERE id = ?2",
            params![ts(at), project_id],
        )?;
        if changed == 0 {
            return Err(Error::ProjectNotFound(project_id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::testing::{commit, day};
    use chrono::Duration;

    fn setup() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db.upsert_project(&create_test_project("proj-1")).unwrap();
        db
    }

    fn create_test_project(id: &str) -> Project {
        Project {
            id: id.to_string(),
            name: format!("Project {}", id),
            repo_full_name: Some("acme/widgets".to_string()),
            created_at: day(1),
            last_analyzed_at: None,
        }
    }

    fn create_test_recommendation(pattern: PatternType, detected_at: DateTime<Utc>) -> Recommendation {
        let input = RecommendationInput::new(
            pattern,
            "title",
            "description",
            Evidence::new(vec!["abc".to_string()], [("ratio", 0.5)]),
            &["step one", "step two"],
        );
        Recommendation::from_input("proj-1", &input, detected_at)
    }

    #[test]
    fn test_project_upsert_keeps_checkpoint() {
        let db = setup();
        db.set_project_checkpoint("proj-1", day(5)).unwrap();

        let mut renamed = create_test_project("proj-1");
        renamed.name = "Renamed".to_string();
        renamed.repo_full_name = None;
        db.upsert_project(&renamed).unwrap();

        let project = db.get_project("proj-1").unwrap().unwrap();
        assert_eq!(project.name, "Renamed");
        assert_eq!(project.repo_full_name.as_deref(), Some("acme/widgets"));
        assert_eq!(project.last_analyzed_at, Some(day(5)));
        assert!(db.get_project("missing").unwrap().is_none());
    }

    #[test]
    fn test_checkpoint_for_unknown_project() {
        let db = setup();
        let err = db.set_project_checkpoint("missing", day(1)).unwrap_err();
        assert!(matches!(err, Error::ProjectNotFound(_)));
    }

    #[test]
    fn test_insert_commits_ignores_duplicates() {
        let db = setup();
        let commits = vec![
            commit(day(2)).sha("a").ai("Claude Code").files(4, 1).build(),
            commit(day(1)).sha("b").message("fix: typo").build(),
        ];

        assert_eq!(db.insert_commits("proj-1", &commits).unwrap(), 2);
        assert_eq!(db.insert_commits("proj-1", &commits).unwrap(), 0);
        assert_eq!(db.count_commits("proj-1").unwrap(), 2);

        let loaded = db.load_commits_between("proj-1", None, None).unwrap();
        // Oldest first, round-tripped exactly
        assert_eq!(loaded, vec![commits[1].clone(), commits[0].clone()]);
    }

    #[test]
    fn test_insert_commits_requires_project() {
        let db = setup();
        let err = db
            .insert_commits("missing", &[commit(day(1)).build()])
            .unwrap_err();
        assert!(matches!(err, Error::ProjectNotFound(_)));
    }

    #[test]
    fn test_load_commits_bounds() {
        let db = setup();
        let commits: Vec<_> = (1..=5).map(|d| commit(day(d)).build()).collect();
        db.insert_commits("proj-1", &commits).unwrap();

        let since = db.load_commits("proj-1", day(3)).unwrap();
        assert_eq!(since.len(), 3);
        assert_eq!(since[0].timestamp, day(3));

        let between = db
            .load_commits_between("proj-1", Some(day(2)), Some(day(4)))
            .unwrap();
        assert_eq!(between.len(), 2);

        // Sub-second precision survives the round trip and compares correctly
        let precise = day(3) + Duration::microseconds(1);
        assert_eq!(db.load_commits("proj-1", precise).unwrap().len(), 2);
    }

    #[test]
    fn test_recommendation_round_trip() {
        let db = setup();
        let rec = create_test_recommendation(PatternType::GhostChurn, day(3));
        db.create_recommendations(std::slice::from_ref(&rec)).unwrap();

        let loaded = db.get_recommendation(&rec.id).unwrap().unwrap();
        assert_eq!(loaded.pattern, PatternType::GhostChurn);
        assert_eq!(loaded.severity, Severity::High);
        assert_eq!(loaded.evidence, rec.evidence);
        assert_eq!(loaded.next_steps, rec.next_steps);
        assert_eq!(loaded.status, RecommendationStatus::Active);
        assert_eq!(loaded.detected_at, day(3));
        assert!(loaded.accuracy.is_none());
    }

    #[test]
    fn test_list_recommendations_filters_and_orders() {
        let db = setup();
        let old = create_test_recommendation(PatternType::TestDrift, day(2));
        let new = create_test_recommendation(PatternType::ToolTransition, day(4));
        let gone = create_test_recommendation(PatternType::SprintDrift, day(3));
        db.create_recommendations(&[old.clone(), new.clone(), gone.clone()])
            .unwrap();
        db.resolve_recommendations(&[gone.id.clone()], day(5)).unwrap();

        let active = db
            .list_recommendations("proj-1", &RecommendationFilter::default())
            .unwrap();
        let ids: Vec<_> = active.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec![new.id.as_str(), old.id.as_str()]);

        let high = db
            .list_recommendations(
                "proj-1",
                &RecommendationFilter {
                    severity: Some(Severity::High),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].id, old.id);

        let all = db
            .list_recommendations("proj-1", &RecommendationFilter::all())
            .unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(db.count_active_recommendations("proj-1").unwrap(), 2);

        let resolved = db.get_recommendation(&gone.id).unwrap().unwrap();
        assert_eq!(resolved.status, RecommendationStatus::Resolved);
        assert_eq!(resolved.resolved_at, Some(day(5)));
    }

    #[test]
    fn test_acknowledge_and_dismiss_only_from_active() {
        let db = setup();
        let a = create_test_recommendation(PatternType::TestDrift, day(2));
        let b = create_test_recommendation(PatternType::GhostChurn, day(2));
        db.create_recommendations(&[a.clone(), b.clone()]).unwrap();

        let acked = db
            .update_recommendation_status(&a.id, RecommendationStatus::Acknowledged, day(3))
            .unwrap();
        assert_eq!(acked.status, RecommendationStatus::Acknowledged);
        assert_eq!(acked.acknowledged_at, Some(day(3)));

        // Closed rows cannot move again
        let err = db
            .update_recommendation_status(&a.id, RecommendationStatus::Dismissed, day(4))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));

        // The engine owns the resolved transition
        let err = db
            .update_recommendation_status(&b.id, RecommendationStatus::Resolved, day(4))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));

        let dismissed = db
            .update_recommendation_status(&b.id, RecommendationStatus::Dismissed, day(4))
            .unwrap();
        assert_eq!(dismissed.dismissed_at, Some(day(4)));

        let err = db
            .update_recommendation_status(&b.id, RecommendationStatus::Acknowledged, day(5))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));

        let err = db
            .update_recommendation_status("nope", RecommendationStatus::Dismissed, day(4))
            .unwrap_err();
        assert!(matches!(err, Error::RecommendationNotFound(_)));
    }

    #[test]
    fn test_resolve_skips_closed_rows() {
        let db = setup();
        let rec = create_test_recommendation(PatternType::TestDrift, day(2));
        db.create_recommendations(std::slice::from_ref(&rec)).unwrap();
        db.update_recommendation_status(&rec.id, RecommendationStatus::Dismissed, day(3))
            .unwrap();

        db.resolve_recommendations(&[rec.id.clone()], day(4)).unwrap();

        let loaded = db.get_recommendation(&rec.id).unwrap().unwrap();
        assert_eq!(loaded.status, RecommendationStatus::Dismissed);
        assert!(loaded.resolved_at.is_none());
    }

    #[test]
    fn test_accuracy_label() {
        let db = setup();
        let rec = create_test_recommendation(PatternType::TestDrift, day(2));
        db.create_recommendations(std::slice::from_ref(&rec)).unwrap();

        db.set_recommendation_accuracy(&rec.id, AccuracyLabel::FalsePositive)
            .unwrap();
        let loaded = db.get_recommendation(&rec.id).unwrap().unwrap();
        assert_eq!(loaded.accuracy, Some(AccuracyLabel::FalsePositive));

        let err = db
            .set_recommendation_accuracy("nope", AccuracyLabel::Useful)
            .unwrap_err();
        assert!(matches!(err, Error::RecommendationNotFound(_)));
    }

    #[test]
    fn test_list_projects_counts() {
        let db = setup();
        db.upsert_project(&create_test_project("proj-2")).unwrap();
        db.insert_commits("proj-1", &[commit(day(1)).build(), commit(day(6)).build()])
            .unwrap();
        db.create_recommendations(&[create_test_recommendation(PatternType::TestDrift, day(2))])
            .unwrap();

        let rows = db.list_projects().unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "proj-1");
        assert_eq!(rows[0].commit_count, 2);
        assert_eq!(rows[0].active_recommendations, 1);
        assert_eq!(rows[0].last_commit_at, Some(day(6)));
        assert_eq!(rows[1].commit_count, 0);
        assert!(rows[1].last_commit_at.is_none());
    }

    #[test]
    fn test_analysis_runs() {
        let db = setup();
        let mut run = AnalysisRun {
            id: 0,
            project_id: "proj-1".to_string(),
            analyzed_at: day(3),
            duration_ms: 12,
            commit_count: 40,
            window_count: 6,
            phase: "drifting".to_string(),
            confidence: 0.9,
            detected: vec![PatternType::SprintDrift, PatternType::GhostChurn],
            created_count: 2,
            resolved_count: 0,
        };
        db.insert_analysis_run(&run).unwrap();
        run.analyzed_at = day(4);
        run.detected.clear();
        let second_id = db.insert_analysis_run(&run).unwrap();

        let runs = db.get_analysis_runs("proj-1", 10).unwrap();

        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].id, second_id);
        assert!(runs[0].detected.is_empty());
        assert_eq!(
            runs[1].detected,
            vec![PatternType::SprintDrift, PatternType::GhostChurn]
        );
        assert_eq!(db.get_analysis_runs("proj-1", 1).unwrap().len(), 1);
    }
}
