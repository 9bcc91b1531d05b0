//! Append-only session history with recomputed aggregates.
//!
//! Every append recomputes the counters from the whole log. That is O(n)
//! per append on purpose: the aggregates can never drift from the sessions
//! they summarize, and session counts stay far too small for it to matter.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::session::{Session, SessionType};

/// Counters derived from the session log. `completed` time sums planned
/// durations, so a paused-and-resumed session still counts once at face
/// value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub total_sessions: u64,
    pub completed_sessions: u64,
    pub total_work_secs: u64,
    pub total_break_secs: u64,
    /// Consecutive calendar days ending today with at least one completed
    /// work session. Zero whenever today has none, regardless of the past.
    pub streak_days: u32,
    pub work_sessions_today: u64,
    pub work_sessions_this_week: u64,
    pub work_sessions_this_month: u64,
}

/// In-memory session log. The engine appends every session that reaches a
/// terminal state, completed or not.
#[derive(Debug, Clone, Default)]
pub struct History {
    sessions: Vec<Session>,
    stats: AggregateStats,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from previously recorded sessions.
    pub fn from_sessions(sessions: Vec<Session>, today: NaiveDate) -> Self {
        let mut history = Self {
            sessions,
            stats: AggregateStats::default(),
        };
        history.recompute(today);
        history
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn stats(&self) -> &AggregateStats {
        &self.stats
    }

    /// Append a closed session and recompute the aggregates from scratch.
    pub fn append(&mut self, session: Session, today: NaiveDate) {
        self.sessions.push(session);
        self.recompute(today);
    }

    /// Recompute every counter over the full log, anchored to `today`.
    pub fn recompute(&mut self, today: NaiveDate) {
        let mut stats = AggregateStats {
            total_sessions: self.sessions.len() as u64,
            ..AggregateStats::default()
        };
        let mut work_days: HashSet<NaiveDate> = HashSet::new();

        for session in &self.sessions {
            if !session.completed {
                continue;
            }
            stats.completed_sessions += 1;
            match session.kind {
                SessionType::Work => stats.total_work_secs += session.planned_secs,
                SessionType::ShortBreak | SessionType::LongBreak => {
                    stats.total_break_secs += session.planned_secs;
                }
            }
            if session.kind == SessionType::Work {
                let day = session.ended_at.unwrap_or(session.started_at).date_naive();
                work_days.insert(day);
                if day == today {
                    stats.work_sessions_today += 1;
                }
                if day.iso_week() == today.iso_week() {
                    stats.work_sessions_this_week += 1;
                }
                if day.year() == today.year() && day.month() == today.month() {
                    stats.work_sessions_this_month += 1;
                }
            }
        }

        stats.streak_days = streak(&work_days, today);
        self.stats = stats;
    }
}

/// Walk backward from today while each day has a completed work session.
fn streak(work_days: &HashSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut day = today;
    while work_days.contains(&day) {
        streak += 1;
        let Some(previous) = day.pred_opt() else {
            break;
        };
        day = previous;
    }
    streak
}
