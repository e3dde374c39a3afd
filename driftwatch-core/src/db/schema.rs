//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.
//!
//! Timestamps are stored as RFC 3339 text in UTC with a fixed microsecond
//! precision and a `Z` suffix, so lexical order equals time order and range
//! filters can compare strings directly.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: projects, classified commits, recommendations
    r#"
    CREATE TABLE IF NOT EXISTS projects (
        id               TEXT PRIMARY KEY,
        name             TEXT NOT NULL,
        repo_full_name   TEXT,
        created_at       DATETIME NOT NULL,
        last_analyzed_at DATETIME
    );

    -- Classified upstream; rows are never updated
    CREATE TABLE IF NOT EXISTS commits (
        id                 INTEGER PRIMARY KEY AUTOINCREMENT,
        project_id         TEXT NOT NULL REFERENCES projects(id),
        sha                TEXT NOT NULL,
        message            TEXT NOT NULL DEFAULT '',
        author_name        TEXT NOT NULL DEFAULT '',
        author_email       TEXT NOT NULL DEFAULT '',
        author_type        TEXT NOT NULL,
        ai_tool            TEXT,
        category           TEXT NOT NULL,
        files_changed      INTEGER NOT NULL DEFAULT 0,
        insertions         INTEGER NOT NULL DEFAULT 0,
        deletions          INTEGER NOT NULL DEFAULT 0,
        test_files_touched INTEGER NOT NULL DEFAULT 0,
        timestamp          DATETIME NOT NULL,

        UNIQUE(project_id, sha)
    );

    CREATE INDEX IF NOT EXISTS idx_commits_project_ts ON commits(project_id, timestamp);

    CREATE TABLE IF NOT EXISTS recommendations (
        id               TEXT PRIMARY KEY,
        project_id       TEXT NOT NULL REFERENCES projects(id),
        pattern          TEXT NOT NULL,
        severity         TEXT NOT NULL,
        title            TEXT NOT NULL,
        description      TEXT NOT NULL,
        evidence         JSON NOT NULL,
        next_steps       JSON NOT NULL,
        status           TEXT NOT NULL DEFAULT 'active',
        detected_at      DATETIME NOT NULL,
        acknowledged_at  DATETIME,
        dismissed_at     DATETIME,
        resolved_at      DATETIME
    );

    CREATE INDEX IF NOT EXISTS idx_recommendations_project_status
        ON recommendations(project_id, status);
    "#,
    // Version 2: reviewer feedback and analysis run observability
    r#"
    ALTER TABLE recommendations ADD COLUMN accuracy TEXT;

    CREATE TABLE IF NOT EXISTS analysis_runs (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        project_id       TEXT NOT NULL REFERENCES projects(id),
        analyzed_at      DATETIME NOT NULL,
        duration_ms      INTEGER NOT NULL,
        commit_count     INTEGER NOT NULL,
        window_count     INTEGER NOT NULL,
        phase            TEXT NOT NULL,
        confidence       REAL NOT NULL,
        detected         JSON NOT NULL,
        created_count    INTEGER NOT NULL,
        resolved_count   INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_analysis_runs_project ON analysis_runs(project_id, analyzed_at);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    tracing::info!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}
