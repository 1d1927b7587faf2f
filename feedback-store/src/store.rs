//! SQLite-backed feedback store.
//!
//! One connection behind `Arc<Mutex<_>>`; every operation runs on
//! `tokio::task::spawn_blocking` so rusqlite never blocks the async runtime.
//! Each write is its own transaction and is committed before the call returns.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::models::*;
use crate::schema;

/// How many analysed PRs the dashboard lists.
const RECENT_REVIEWS_LIMIT: i64 = 5;

#[derive(Clone)]
pub struct FeedbackStore {
    conn: Arc<Mutex<Connection>>,
}

impl FeedbackStore {
    /// Opens (or creates) the database at `path` and applies migrations.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path).map_err(StoreError::sqlite("open database"))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;",
        )
        .map_err(StoreError::sqlite("configure pragmas"))?;
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(StoreError::sqlite("set busy_timeout"))?;

        info!(path = %path.display(), "feedback store opened");
        Self::from_connection(conn)
    }

    /// In-memory store, used by tests and ephemeral runs.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(StoreError::sqlite("open in-memory"))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(StoreError::sqlite("configure pragmas"))?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: Connection) -> StoreResult<Self> {
        schema::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Join(e.to_string()))?
    }

    /* ------------------------------------------------------------------ */
    /* Event envelopes                                                    */
    /* ------------------------------------------------------------------ */

    /// Inserts a `pending` envelope and returns its id.
    pub async fn record_event(
        &self,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> StoreResult<i64> {
        let event_type = event_type.to_string();
        let payload = serde_json::to_string(payload)?;
        let now = Utc::now();

        self.with_conn(move |c| {
            c.execute(
                "INSERT INTO github_events (event_type, payload, status, created_at)
                 VALUES (?1, ?2, 'pending', ?3)",
                params![event_type, payload, now],
            )
            .map_err(StoreError::sqlite("insert github event"))?;
            Ok(c.last_insert_rowid())
        })
        .await
    }

    /// Marks an envelope `done` and stamps `processed_at`.
    pub async fn mark_event_done(&self, id: i64) -> StoreResult<()> {
        let now = Utc::now();
        let updated = self
            .with_conn(move |c| {
                c.execute(
                    "UPDATE github_events SET status = 'done', processed_at = ?1 WHERE id = ?2",
                    params![now, id],
                )
                .map_err(StoreError::sqlite("mark github event done"))
            })
            .await?;

        if updated == 0 {
            return Err(StoreError::NotFound("github event"));
        }
        Ok(())
    }

    pub async fn get_event(&self, id: i64) -> StoreResult<Option<GithubEventEnvelope>> {
        let raw = self
            .with_conn(move |c| {
                c.query_row(
                    "SELECT id, event_type, payload, status, created_at, processed_at
                     FROM github_events WHERE id = ?1",
                    params![id],
                    RawEvent::from_row,
                )
                .optional()
                .map_err(StoreError::sqlite("select github event"))
            })
            .await?;
        Ok(raw.map(RawEvent::into_envelope))
    }

    /// Envelopes still `pending`, oldest first.
    pub async fn pending_events(&self) -> StoreResult<Vec<GithubEventEnvelope>> {
        let rows = self
            .with_conn(|c| {
                let mut stmt = c
                    .prepare(
                        "SELECT id, event_type, payload, status, created_at, processed_at
                         FROM github_events WHERE status = 'pending' ORDER BY id",
                    )
                    .map_err(StoreError::sqlite("prepare pending events"))?;
                let rows = stmt
                    .query_map([], RawEvent::from_row)
                    .and_then(|it| it.collect::<Result<Vec<_>, _>>())
                    .map_err(StoreError::sqlite("select pending events"))?;
                Ok(rows)
            })
            .await?;
        Ok(rows.into_iter().map(RawEvent::into_envelope).collect())
    }

    /* ------------------------------------------------------------------ */
    /* Pull request feedback                                              */
    /* ------------------------------------------------------------------ */

    pub async fn find_pr_feedback(
        &self,
        github_repo_id: i64,
        pr_number: i64,
    ) -> StoreResult<Option<PullRequestFeedbackRecord>> {
        let raw = self
            .with_conn(move |c| {
                c.query_row(
                    &format!("{PR_SELECT} WHERE github_repo_id = ?1 AND pr_number = ?2"),
                    params![github_repo_id, pr_number],
                    RawPr::from_row,
                )
                .optional()
                .map_err(StoreError::sqlite("select pr feedback"))
            })
            .await?;
        Ok(raw.map(RawPr::into_record))
    }

    /// Returns the id of the row for `(repo, pr)`, inserting an empty
    /// placeholder first when none exists. The boolean is `true` on insert.
    pub async fn ensure_pr_feedback(
        &self,
        github_repo_id: i64,
        pr_number: i64,
        repo_full_name: &str,
    ) -> StoreResult<(i64, bool)> {
        let repo_full_name = repo_full_name.to_string();
        let now = Utc::now();

        self.with_conn(move |c| {
            let existing: Option<i64> = c
                .query_row(
                    "SELECT id FROM pull_request_feedback
                     WHERE github_repo_id = ?1 AND pr_number = ?2",
                    params![github_repo_id, pr_number],
                    |r| r.get(0),
                )
                .optional()
                .map_err(StoreError::sqlite("lookup pr feedback"))?;
            if let Some(id) = existing {
                return Ok((id, false));
            }

            // A concurrent writer may have inserted between lookup and insert.
            let inserted = c
                .execute(
                    "INSERT INTO pull_request_feedback
                         (github_repo_id, pr_number, repo_full_name, created_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT (github_repo_id, pr_number) DO NOTHING",
                    params![github_repo_id, pr_number, repo_full_name, now],
                )
                .map_err(StoreError::sqlite("insert pr feedback placeholder"))?;

            let id: i64 = c
                .query_row(
                    "SELECT id FROM pull_request_feedback
                     WHERE github_repo_id = ?1 AND pr_number = ?2",
                    params![github_repo_id, pr_number],
                    |r| r.get(0),
                )
                .map_err(StoreError::sqlite("lookup pr feedback"))?;
            Ok((id, inserted == 1))
        })
        .await
    }

    /// Overwrites the review columns of row `id` in one transaction.
    pub async fn save_pr_review(
        &self,
        id: i64,
        author: &str,
        employee_id: Option<i64>,
        outcome: &ReviewOutcome,
    ) -> StoreResult<()> {
        let author = author.to_string();
        let feedback = serde_json::to_string(&outcome.feedback)?;
        let (summary, quality, resources) = match &outcome.summary {
            Some(s) => (
                Some(s.summary.clone()),
                Some(s.quality),
                serde_json::to_string(&s.recommended_resources)?,
            ),
            None => (None, None, "[]".to_string()),
        };
        let analyzed_at = outcome.analyzed_at;

        self.with_conn(move |c| {
            let tx = c
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(StoreError::sqlite("begin pr review update"))?;
            let updated = tx
                .execute(
                    "UPDATE pull_request_feedback
                     SET analyzed_at = ?1, author = ?2, employee_id = ?3, feedback = ?4,
                         summary = ?5, quality = ?6, recommended_resources = ?7
                     WHERE id = ?8",
                    params![
                        analyzed_at,
                        author,
                        employee_id,
                        feedback,
                        summary,
                        quality,
                        resources,
                        id
                    ],
                )
                .map_err(StoreError::sqlite("update pr review"))?;
            if updated == 0 {
                // Dropping `tx` rolls back.
                return Err(StoreError::NotFound("pull request feedback"));
            }
            tx.commit().map_err(StoreError::sqlite("commit pr review update"))?;
            Ok(())
        })
        .await?;

        debug!(id, "pr review saved");
        Ok(())
    }

    /// Retro labels for the given PR numbers of one repository.
    /// Numbers without a row are absent from the map.
    pub async fn retro_labels(
        &self,
        github_repo_id: i64,
        pr_numbers: &[i64],
    ) -> StoreResult<HashMap<i64, RetroLabel>> {
        if pr_numbers.is_empty() {
            return Ok(HashMap::new());
        }
        let numbers = pr_numbers.to_vec();

        let rows = self
            .with_conn(move |c| {
                let sql = format!(
                    "{PR_SELECT} WHERE github_repo_id = ? AND pr_number IN ({})",
                    placeholders(numbers.len())
                );
                let mut stmt = c.prepare(&sql).map_err(StoreError::sqlite("prepare retro labels"))?;
                let mut args: Vec<i64> = Vec::with_capacity(numbers.len() + 1);
                args.push(github_repo_id);
                args.extend(numbers);
                let rows = stmt
                    .query_map(rusqlite::params_from_iter(args), RawPr::from_row)
                    .and_then(|it| it.collect::<Result<Vec<_>, _>>())
                    .map_err(StoreError::sqlite("select retro labels"))?;
                Ok(rows)
            })
            .await?;

        Ok(rows
            .into_iter()
            .map(RawPr::into_record)
            .map(|r| (r.pr_number, r.retro()))
            .collect())
    }

    /* ------------------------------------------------------------------ */
    /* Commit feedback                                                    */
    /* ------------------------------------------------------------------ */

    /// Inserts a commit row; an existing `sha` keeps its values.
    /// Returns `true` when a row was written.
    pub async fn insert_commit_feedback(&self, new: &NewCommitFeedback) -> StoreResult<bool> {
        let new = new.clone();
        let now = Utc::now();
        let inserted = self
            .with_conn(move |c| {
                c.execute(
                    "INSERT INTO commit_feedback (sha, repo_full_name, employee_id, status, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT (sha) DO NOTHING",
                    params![new.sha, new.repo_full_name, new.employee_id, new.status, now],
                )
                .map_err(StoreError::sqlite("insert commit feedback"))
            })
            .await?;
        Ok(inserted == 1)
    }

    pub async fn find_commit_feedback(
        &self,
        sha: &str,
    ) -> StoreResult<Option<CommitFeedbackRecord>> {
        let sha = sha.to_string();
        let raw = self
            .with_conn(move |c| {
                c.query_row(
                    &format!("{COMMIT_SELECT} WHERE sha = ?1"),
                    params![sha],
                    RawCommit::from_row,
                )
                .optional()
                .map_err(StoreError::sqlite("select commit feedback"))
            })
            .await?;
        Ok(raw.map(RawCommit::into_record))
    }

    /// `sha -> status` for the given shas. Unknown shas are absent.
    pub async fn commit_statuses(&self, shas: &[String]) -> StoreResult<HashMap<String, String>> {
        if shas.is_empty() {
            return Ok(HashMap::new());
        }
        let shas = shas.to_vec();
        self.with_conn(move |c| {
            let sql = format!(
                "SELECT sha, status FROM commit_feedback WHERE sha IN ({})",
                placeholders(shas.len())
            );
            let mut stmt = c.prepare(&sql).map_err(StoreError::sqlite("prepare commit statuses"))?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(shas.iter()), |r| {
                    Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
                })
                .and_then(|it| it.collect::<Result<HashMap<_, _>, _>>())
                .map_err(StoreError::sqlite("select commit statuses"))?;
            Ok(rows)
        })
        .await
    }

    /* ------------------------------------------------------------------ */
    /* Employees                                                          */
    /* ------------------------------------------------------------------ */

    pub async fn insert_employee(
        &self,
        github_username: Option<&str>,
        github_token: Option<&str>,
    ) -> StoreResult<i64> {
        let username = github_username.map(str::to_string);
        let token = github_token.map(str::to_string);
        self.with_conn(move |c| {
            c.execute(
                "INSERT INTO employees (github_username, github_token) VALUES (?1, ?2)",
                params![username, token],
            )
            .map_err(StoreError::sqlite("insert employee"))?;
            Ok(c.last_insert_rowid())
        })
        .await
    }

    pub async fn find_employee(&self, id: i64) -> StoreResult<Option<Employee>> {
        self.with_conn(move |c| {
            c.query_row(
                "SELECT id, github_username, github_token FROM employees WHERE id = ?1",
                params![id],
                employee_from_row,
            )
            .optional()
            .map_err(StoreError::sqlite("select employee"))
        })
        .await
    }

    /// Case-sensitive match on the GitHub login.
    pub async fn find_employee_by_github_username(
        &self,
        username: &str,
    ) -> StoreResult<Option<Employee>> {
        let username = username.to_string();
        self.with_conn(move |c| {
            c.query_row(
                "SELECT id, github_username, github_token FROM employees WHERE github_username = ?1",
                params![username],
                employee_from_row,
            )
            .optional()
            .map_err(StoreError::sqlite("select employee by username"))
        })
        .await
    }

    /* ------------------------------------------------------------------ */
    /* Dashboard                                                          */
    /* ------------------------------------------------------------------ */

    pub async fn dashboard(&self, employee_id: i64) -> StoreResult<DashboardStats> {
        let (analyzed, pending, avg, by_status, recent) = self
            .with_conn(move |c| {
                let (analyzed, pending, avg): (i64, i64, Option<f64>) = c
                    .query_row(
                        "SELECT
                             COUNT(CASE WHEN analyzed_at IS NOT NULL THEN 1 END),
                             COUNT(CASE WHEN analyzed_at IS NULL THEN 1 END),
                             AVG(quality)
                         FROM pull_request_feedback WHERE employee_id = ?1",
                        params![employee_id],
                        |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
                    )
                    .map_err(StoreError::sqlite("aggregate pr feedback"))?;

                let mut stmt = c
                    .prepare(
                        "SELECT status, COUNT(*) FROM commit_feedback
                         WHERE employee_id = ?1 GROUP BY status",
                    )
                    .map_err(StoreError::sqlite("prepare commit counts"))?;
                let by_status = stmt
                    .query_map(params![employee_id], |r| {
                        Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?))
                    })
                    .and_then(|it| it.collect::<Result<Vec<_>, _>>())
                    .map_err(StoreError::sqlite("select commit counts"))?;

                let mut stmt = c
                    .prepare(&format!(
                        "{PR_SELECT} WHERE employee_id = ?1 AND analyzed_at IS NOT NULL
                         ORDER BY analyzed_at DESC LIMIT ?2"
                    ))
                    .map_err(StoreError::sqlite("prepare recent reviews"))?;
                let recent = stmt
                    .query_map(params![employee_id, RECENT_REVIEWS_LIMIT], RawPr::from_row)
                    .and_then(|it| it.collect::<Result<Vec<_>, _>>())
                    .map_err(StoreError::sqlite("select recent reviews"))?;

                Ok((analyzed, pending, avg, by_status, recent))
            })
            .await?;

        Ok(DashboardStats {
            analyzed_prs: analyzed.max(0) as u64,
            pending_prs: pending.max(0) as u64,
            average_quality: avg,
            commits_by_status: by_status
                .into_iter()
                .map(|(s, n)| (s, n.max(0) as u64))
                .collect::<BTreeMap<_, _>>(),
            recent_reviews: recent.into_iter().map(RawPr::into_record).collect(),
        })
    }
}

/* ---------------------------------------------------------------------- */
/* Row mapping                                                            */
/* ---------------------------------------------------------------------- */

const PR_SELECT: &str = "SELECT id, github_repo_id, pr_number, repo_full_name, author, employee_id,
        feedback, summary, quality, recommended_resources, created_at, analyzed_at
     FROM pull_request_feedback";

const COMMIT_SELECT: &str = "SELECT id, sha, repo_full_name, employee_id, status, summary,
        feedback, quality, recommended_resources, created_at, analyzed_at
     FROM commit_feedback";

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Decodes a JSON array column; a malformed value reads as empty.
fn json_list<T: DeserializeOwned>(column: &str, raw: &str) -> Vec<T> {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!(column, error = %e, "malformed JSON column, reading as empty");
        Vec::new()
    })
}

fn employee_from_row(r: &Row<'_>) -> rusqlite::Result<Employee> {
    Ok(Employee {
        id: r.get(0)?,
        github_username: r.get(1)?,
        github_token: r.get(2)?,
    })
}

/// Column values as stored; JSON is decoded after the lock is released.
struct RawPr {
    id: i64,
    github_repo_id: i64,
    pr_number: i64,
    repo_full_name: String,
    author: Option<String>,
    employee_id: Option<i64>,
    feedback: String,
    summary: Option<String>,
    quality: Option<f64>,
    recommended_resources: String,
    created_at: DateTime<Utc>,
    analyzed_at: Option<DateTime<Utc>>,
}

impl RawPr {
    fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: r.get(0)?,
            github_repo_id: r.get(1)?,
            pr_number: r.get(2)?,
            repo_full_name: r.get(3)?,
            author: r.get(4)?,
            employee_id: r.get(5)?,
            feedback: r.get(6)?,
            summary: r.get(7)?,
            quality: r.get(8)?,
            recommended_resources: r.get(9)?,
            created_at: r.get(10)?,
            analyzed_at: r.get(11)?,
        })
    }

    fn into_record(self) -> PullRequestFeedbackRecord {
        PullRequestFeedbackRecord {
            id: self.id,
            github_repo_id: self.github_repo_id,
            pr_number: self.pr_number,
            repo_full_name: self.repo_full_name,
            author: self.author,
            employee_id: self.employee_id,
            feedback: json_list("feedback", &self.feedback),
            summary: self.summary,
            quality: self.quality,
            recommended_resources: json_list("recommended_resources", &self.recommended_resources),
            created_at: self.created_at,
            analyzed_at: self.analyzed_at,
        }
    }
}

struct RawCommit {
    id: i64,
    sha: String,
    repo_full_name: String,
    employee_id: Option<i64>,
    status: String,
    summary: Option<String>,
    feedback: String,
    quality: Option<f64>,
    recommended_resources: String,
    created_at: DateTime<Utc>,
    analyzed_at: Option<DateTime<Utc>>,
}

impl RawCommit {
    fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: r.get(0)?,
            sha: r.get(1)?,
            repo_full_name: r.get(2)?,
            employee_id: r.get(3)?,
            status: r.get(4)?,
            summary: r.get(5)?,
            feedback: r.get(6)?,
            quality: r.get(7)?,
            recommended_resources: r.get(8)?,
            created_at: r.get(9)?,
            analyzed_at: r.get(10)?,
        })
    }

    fn into_record(self) -> CommitFeedbackRecord {
        CommitFeedbackRecord {
            id: self.id,
            sha: self.sha,
            repo_full_name: self.repo_full_name,
            employee_id: self.employee_id,
            status: self.status,
            summary: self.summary,
            feedback: json_list("feedback", &self.feedback),
            quality: self.quality,
            recommended_resources: json_list("recommended_resources", &self.recommended_resources),
            created_at: self.created_at,
            analyzed_at: self.analyzed_at,
        }
    }
}

struct RawEvent {
    id: i64,
    event_type: String,
    payload: String,
    status: String,
    created_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
}

impl RawEvent {
    fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: r.get(0)?,
            event_type: r.get(1)?,
            payload: r.get(2)?,
            status: r.get(3)?,
            created_at: r.get(4)?,
            processed_at: r.get(5)?,
        })
    }

    fn into_envelope(self) -> GithubEventEnvelope {
        let status = if self.status == EventStatus::Done.as_str() {
            EventStatus::Done
        } else {
            EventStatus::Pending
        };
        GithubEventEnvelope {
            id: self.id,
            event_type: self.event_type,
            payload: serde_json::from_str(&self.payload).unwrap_or(serde_json::Value::Null),
            status,
            created_at: self.created_at,
            processed_at: self.processed_at,
        }
    }
}
