use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{Session, SessionType};

/// Every state change in the engine produces an Event.
/// Hosts render or forward them; tests assert on them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        session_id: String,
        kind: SessionType,
        planned_secs: u64,
        /// True when the engine started this session itself after a
        /// completed one, false for caller-issued starts.
        auto_started: bool,
        at: DateTime<Utc>,
    },
    SessionPaused {
        session_id: String,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        session_id: String,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero or the host force-completed the session.
    /// Carries the closed session record, usage attached.
    SessionCompleted {
        session: Session,
        next_kind: SessionType,
        at: DateTime<Utc>,
    },
    SessionStopped {
        session: Session,
        at: DateTime<Utc>,
    },
    SessionSkipped {
        session: Session,
        next_kind: SessionType,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// The closed session carried by terminal events, if any.
    pub fn finished_session(&self) -> Option<&Session> {
        match self {
            Event::SessionCompleted { session, .. }
            | Event::SessionStopped { session, .. }
            | Event::SessionSkipped { session, .. } => Some(session),
            _ => None,
        }
    }
}
