//! Schema DDL and forward-only migrations.
//!
//! The `schema_version` table holds a single row with the applied version.
//! To change the schema, bump [`CURRENT_SCHEMA_VERSION`] and add a step to
//! [`migrate`].

use rusqlite::{Connection, OptionalExtension, TransactionBehavior};

use crate::error::{StoreError, StoreResult};

pub const CURRENT_SCHEMA_VERSION: i64 = 1;

const SCHEMA_VERSION_DDL: &str = "
    CREATE TABLE IF NOT EXISTS schema_version (
        id      INTEGER PRIMARY KEY CHECK (id = 1),
        version INTEGER NOT NULL
    );
";

/// v1: envelopes, PR feedback, commit feedback, employees.
///
/// JSON columns (`payload`, `feedback`, `recommended_resources`) are TEXT.
/// Timestamps are stored in the rusqlite chrono text format (UTC).
const SCHEMA_V1_SQL: &str = "
    CREATE TABLE IF NOT EXISTS employees (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        github_username TEXT UNIQUE,
        github_token    TEXT
    );

    CREATE TABLE IF NOT EXISTS github_events (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        event_type   TEXT NOT NULL,
        payload      TEXT NOT NULL,
        status       TEXT NOT NULL DEFAULT 'pending'
                          CHECK (status IN ('pending', 'done')),
        created_at   TEXT NOT NULL,
        processed_at TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_github_events_status ON github_events(status);

    CREATE TABLE IF NOT EXISTS pull_request_feedback (
        id                    INTEGER PRIMARY KEY AUTOINCREMENT,
        github_repo_id        INTEGER NOT NULL,
        pr_number             INTEGER NOT NULL,
        repo_full_name        TEXT NOT NULL,
        author                TEXT,
        employee_id           INTEGER REFERENCES employees(id),
        feedback              TEXT NOT NULL DEFAULT '[]',
        summary               TEXT,
        quality               REAL,
        recommended_resources TEXT NOT NULL DEFAULT '[]',
        created_at            TEXT NOT NULL,
        analyzed_at           TEXT,
        UNIQUE (github_repo_id, pr_number)
    );

    CREATE INDEX IF NOT EXISTS idx_pr_feedback_employee ON pull_request_feedback(employee_id);

    CREATE TABLE IF NOT EXISTS commit_feedback (
        id                    INTEGER PRIMARY KEY AUTOINCREMENT,
        sha                   TEXT NOT NULL UNIQUE,
        repo_full_name        TEXT NOT NULL,
        employee_id           INTEGER REFERENCES employees(id),
        status                TEXT NOT NULL,
        summary               TEXT,
        feedback              TEXT NOT NULL DEFAULT '[]',
        quality               REAL,
        recommended_resources TEXT NOT NULL DEFAULT '[]',
        created_at            TEXT NOT NULL,
        analyzed_at           TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_commit_feedback_employee ON commit_feedback(employee_id);
";

/// Applies pending migrations. Safe to call on every open.
pub fn migrate(conn: &mut Connection) -> StoreResult<()> {
    conn.execute_batch(SCHEMA_VERSION_DDL)
        .map_err(StoreError::sqlite("create schema_version"))?;

    let version: i64 = conn
        .query_row("SELECT version FROM schema_version WHERE id = 1", [], |r| {
            r.get(0)
        })
        .optional()
        .map_err(StoreError::sqlite("read schema version"))?
        .unwrap_or(0);

    if version > CURRENT_SCHEMA_VERSION {
        return Err(StoreError::SchemaTooNew {
            found: version,
            supported: CURRENT_SCHEMA_VERSION,
        });
    }

    if version < 1 {
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(StoreError::sqlite("begin migration"))?;
        tx.execute_batch(SCHEMA_V1_SQL)
            .map_err(StoreError::sqlite("apply schema v1"))?;
        tx.execute(
            "INSERT INTO schema_version (id, version) VALUES (1, 1)
             ON CONFLICT(id) DO UPDATE SET version = excluded.version",
            [],
        )
        .map_err(StoreError::sqlite("record schema version"))?;
        tx.commit().map_err(StoreError::sqlite("commit migration"))?;
    }

    Ok(())
}
