//! SQLite-based session log and key-value store.
//!
//! The connection lives on a dedicated worker thread; callers queue
//! closures over an mpsc channel and await the reply on a oneshot. rusqlite
//! stays synchronous while the rest of the crate awaits.
//!
//! Provides persistent storage for:
//! - Closed sessions, app usage included
//! - Key-value state such as the tracker checkpoint

use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc, Mutex};
use std::thread::{self, JoinHandle};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use tokio::sync::oneshot;
use tracing::{debug, error};

use crate::error::StoreError;
use crate::session::{EndReason, Session, SessionType, TaskMeta};
use crate::store::SnapshotStore;
use crate::usage::UsageRecord;

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum DbCommand {
    Execute(DbTask),
    Shutdown,
}

struct DatabaseInner {
    sender: mpsc::Sender<DbCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        let _ = self.sender.send(DbCommand::Shutdown);
        if let Ok(mut guard) = self.worker.lock() {
            if let Some(handle) = guard.take() {
                let _ = handle.join();
            }
        }
    }
}

/// Handle to the SQLite worker. Cheap to clone; the connection closes when
/// the last clone drops.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
    db_path: Arc<PathBuf>,
}

impl Database {
    /// Open (or create) the database at `db_path` and start the worker.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or migrated.
    pub fn open(db_path: PathBuf) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let (command_tx, command_rx) = mpsc::channel::<DbCommand>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), StoreError>>();

        let worker_path = db_path.clone();
        let worker = thread::Builder::new()
            .name("pomotrace-db".to_string())
            .spawn(move || {
                let mut conn = match Connection::open(&worker_path) {
                    Ok(conn) => conn,
                    Err(source) => {
                        let _ = ready_tx.send(Err(StoreError::OpenFailed {
                            path: worker_path,
                            source,
                        }));
                        return;
                    }
                };

                if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                    error!("failed to enable WAL mode: {err}");
                }
                if let Err(err) = conn.pragma_update(None, "foreign_keys", "ON") {
                    error!("failed to enable foreign keys: {err}");
                }

                let init = migrate(&mut conn).map_err(StoreError::from);
                if ready_tx.send(init).is_err() {
                    error!("database opener dropped before the ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        DbCommand::Execute(task) => task(&mut conn),
                        DbCommand::Shutdown => break,
                    }
                }
                debug!("database worker shutting down");
            })
            .map_err(StoreError::Io)?;

        ready_rx
            .recv()
            .map_err(|_| StoreError::WorkerUnavailable("worker exited during open".to_string()))??;

        Ok(Self {
            inner: Arc::new(DatabaseInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
            db_path: Arc::new(db_path),
        })
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    /// Run `task` on the worker thread and await its result.
    async fn execute<F, T>(&self, task: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let command = DbCommand::Execute(Box::new(move |conn| {
            let result = task(conn);
            if reply_tx.send(result).is_err() {
                error!("database caller dropped before receiving the result");
            }
        }));

        self.inner
            .sender
            .send(command)
            .map_err(|err| StoreError::WorkerUnavailable(err.to_string()))?;
        reply_rx
            .await
            .map_err(|_| StoreError::WorkerUnavailable("database worker terminated".to_string()))?
    }

    /// Insert or replace a closed session.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn record_session(&self, session: &Session) -> Result<(), StoreError> {
        let session = session.clone();
        self.execute(move |conn| {
            let app_usage = session
                .app_usage
                .as_ref()
                .map(|usage| serde_json::to_string(usage))
                .transpose()
                .map_err(|e| StoreError::Malformed(e.to_string()))?;
            conn.execute(
                "INSERT OR REPLACE INTO sessions
                     (id, kind, planned_secs, started_at, ended_at, completed,
                      end_reason, task_id, task_title, app_usage)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    session.id,
                    session.kind.as_str(),
                    session.planned_secs,
                    session.started_at.to_rfc3339(),
                    session.ended_at.map(|t| t.to_rfc3339()),
                    session.completed,
                    session.end_reason.map(|r| r.as_str()),
                    session.task.as_ref().map(|t| t.task_id.clone()),
                    session.task.as_ref().map(|t| t.title.clone()),
                    app_usage,
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// All recorded sessions, oldest first.
    pub async fn all_sessions(&self) -> Result<Vec<Session>, StoreError> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, kind, planned_secs, started_at, ended_at, completed,
                        end_reason, task_id, task_title, app_usage
                 FROM sessions ORDER BY started_at ASC",
            )?;
            let rows = stmt.query_map([], row_to_parts)?;
            rows.map(|row| session_from_parts(row?))
                .collect::<Result<Vec<_>, _>>()
        })
        .await
    }

    pub async fn session_by_id(&self, id: &str) -> Result<Option<Session>, StoreError> {
        let id = id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, kind, planned_secs, started_at, ended_at, completed,
                        end_reason, task_id, task_title, app_usage
                 FROM sessions WHERE id = ?1",
            )?;
            match stmt.query_row(params![id], row_to_parts) {
                Ok(parts) => Ok(Some(session_from_parts(parts)?)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    /// The most recently started session, if any.
    pub async fn last_session(&self) -> Result<Option<Session>, StoreError> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, kind, planned_secs, started_at, ended_at, completed,
                        end_reason, task_id, task_title, app_usage
                 FROM sessions ORDER BY started_at DESC LIMIT 1",
            )?;
            match stmt.query_row([], row_to_parts) {
                Ok(parts) => Ok(Some(session_from_parts(parts)?)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    /// Get a value from the kv store.
    pub async fn kv_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let key = key.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
            match stmt.query_row(params![key], |row| row.get::<_, String>(0)) {
                Ok(v) => Ok(Some(v)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    /// Set a value in the kv store.
    pub async fn kv_set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let key = key.to_string();
        let value = value.to_string();
        self.execute(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
                params![key, value],
            )?;
            Ok(())
        })
        .await
    }

    /// Delete a key from the kv store. Deleting a missing key is fine.
    pub async fn kv_delete(&self, key: &str) -> Result<(), StoreError> {
        let key = key.to_string();
        self.execute(move |conn| {
            conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl SnapshotStore for Database {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.kv_get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.kv_set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.kv_delete(key).await
    }
}

fn migrate(conn: &mut Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS sessions (
            id           TEXT PRIMARY KEY,
            kind         TEXT NOT NULL,
            planned_secs INTEGER NOT NULL,
            started_at   TEXT NOT NULL,
            ended_at     TEXT,
            completed    INTEGER NOT NULL DEFAULT 0,
            end_reason   TEXT,
            task_id      TEXT,
            task_title   TEXT,
            app_usage    TEXT
        );

        CREATE TABLE IF NOT EXISTS kv (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_started_at ON sessions(started_at);
        CREATE INDEX IF NOT EXISTS idx_sessions_kind ON sessions(kind);",
    )?;
    Ok(())
}

type SessionParts = (
    String,
    String,
    u64,
    String,
    Option<String>,
    bool,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

fn row_to_parts(row: &rusqlite::Row<'_>) -> rusqlite::Result<SessionParts> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
    ))
}

fn session_from_parts(parts: SessionParts) -> Result<Session, StoreError> {
    let (id, kind, planned_secs, started_at, ended_at, completed, end_reason, task_id, task_title, app_usage) =
        parts;
    let task = task_id.map(|task_id| TaskMeta {
        task_id,
        title: task_title.unwrap_or_default(),
    });
    let app_usage: Option<Vec<UsageRecord>> = app_usage
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(|e| StoreError::Malformed(format!("app_usage: {e}")))?;
    Ok(Session {
        id,
        kind: kind_from_str(&kind)?,
        planned_secs,
        started_at: parse_datetime(&started_at)?,
        ended_at: ended_at.as_deref().map(parse_datetime).transpose()?,
        completed,
        end_reason: end_reason.as_deref().map(reason_from_str).transpose()?,
        task,
        app_usage,
    })
}

fn kind_from_str(value: &str) -> Result<SessionType, StoreError> {
    match value {
        "work" => Ok(SessionType::Work),
        "short_break" => Ok(SessionType::ShortBreak),
        "long_break" => Ok(SessionType::LongBreak),
        other => Err(StoreError::Malformed(format!("session kind: {other}"))),
    }
}

fn reason_from_str(value: &str) -> Result<EndReason, StoreError> {
    match value {
        "completed" => Ok(EndReason::Completed),
        "stopped" => Ok(EndReason::Stopped),
        "skipped" => Ok(EndReason::Skipped),
        other => Err(StoreError::Malformed(format!("end reason: {other}"))),
    }
}

fn parse_datetime(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Malformed(format!("timestamp '{value}': {e}")))
}
