//! Session records.
//!
//! A [`Session`] is one timed focus or break span. It is created when the
//! timer leaves idle, mutated only by the engine while active, and immutable
//! once it lands in history. Sessions round-trip through JSON for the
//! session log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::usage::UsageRecord;

/// The kind of a timed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Work,
    ShortBreak,
    LongBreak,
}

impl SessionType {
    pub fn is_break(self) -> bool {
        matches!(self, SessionType::ShortBreak | SessionType::LongBreak)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionType::Work => "work",
            SessionType::ShortBreak => "short_break",
            SessionType::LongBreak => "long_break",
        }
    }
}

impl std::fmt::Display for SessionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a session left the running state for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Countdown reached zero, or the host force-completed it.
    Completed,
    /// Abandoned by the user.
    Stopped,
    /// Abandoned to move on to the next session.
    Skipped,
}

impl EndReason {
    pub fn as_str(self) -> &'static str {
        match self {
            EndReason::Completed => "completed",
            EndReason::Stopped => "stopped",
            EndReason::Skipped => "skipped",
        }
    }
}

/// Optional link back to the task a session was started for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMeta {
    pub task_id: String,
    pub title: String,
}

/// One timed session, from start to terminal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// UUID v4, assigned at start.
    pub id: String,
    pub kind: SessionType,
    /// Configured (or advisor-overridden) duration in seconds.
    pub planned_secs: u64,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    /// True only when the session ran (or was forced) to completion.
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub end_reason: Option<EndReason>,
    #[serde(default)]
    pub task: Option<TaskMeta>,
    /// Per-app foreground usage, present on work sessions that tracked.
    /// Sorted descending by accumulated seconds.
    #[serde(default)]
    pub app_usage: Option<Vec<UsageRecord>>,
}

impl Session {
    /// Open a fresh session record. Called by the engine on idle -> running.
    pub(crate) fn begin(
        kind: SessionType,
        planned_secs: u64,
        task: Option<TaskMeta>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            planned_secs,
            started_at,
            ended_at: None,
            completed: false,
            end_reason: None,
            task,
            app_usage: None,
        }
    }
}
