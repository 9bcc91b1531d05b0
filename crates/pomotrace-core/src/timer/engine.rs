//! Session timer state machine.
//!
//! The engine is caller-driven: it runs no internal threads or timers. The
//! host invokes `tick()` once per second while a session is live and drives
//! probe sampling between ticks; everything else is synchronous state.
//!
//! ## State transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//! Running -> Completed -> Idle   (countdown reached zero / force-complete)
//! Running -> Idle                (stop / skip)
//! Paused  -> Idle                (stop / skip)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = FocusEngine::new(config, clock, tracker);
//! engine.start(SessionType::Work, None).await?;
//! // Once per second:
//! engine.tick().await; // Returns Some(Event) on state changes
//! ```

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::error::TimerError;
use crate::events::Event;
use crate::history::History;
use crate::notify::{Notifier, NullNotifier};
use crate::session::{EndReason, Session, SessionType, TaskMeta};
use crate::storage::Config;
use crate::tracker::{TrackerHealth, TrackerSnapshot, UsageTracker};
use crate::usage::{merge_usage, UsageRecord};

/// Seconds between a completed session and its auto-started successor.
pub const AUTO_START_DELAY_SECS: u64 = 3;

/// Where the engine is in a session's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    Idle,
    Running,
    Paused,
    Completed,
}

/// Opaque adaptive-duration collaborator.
///
/// Consulted once per `start()`; returning `None` keeps the configured
/// duration. How the advice is derived is not the engine's business.
pub trait DurationAdvisor: Send + Sync {
    fn advise(&self, kind: SessionType, configured_secs: u64) -> Option<u64>;
}

/// Read-only view of the engine as of one instant. Never persisted; a host
/// restart always comes back up idle and recovers only the tracking run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub phase: TimerPhase,
    pub session: Option<Session>,
    pub remaining_secs: u64,
    /// Completed work rounds in the current focus period.
    pub rounds_completed: u32,
    pub target_rounds: u32,
}

/// An auto-start decided at completion time, fired by `tick()` once due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingStart {
    kind: SessionType,
    due_at: DateTime<Utc>,
}

/// Owns the single active session and the work/break cadence.
///
/// Commands validate synchronously: `start` on a non-idle engine and
/// pause/resume/stop/skip without a matching session return a
/// [`TimerError`](crate::error::TimerError) to the caller, nothing is
/// retried. The [`UsageTracker`] is started and stopped in lock-step with
/// work sessions and never touched for breaks.
pub struct FocusEngine {
    config: Config,
    clock: Arc<dyn Clock>,
    tracker: UsageTracker,
    notifier: Arc<dyn Notifier>,
    advisor: Option<Arc<dyn DurationAdvisor>>,
    history: History,
    phase: TimerPhase,
    session: Option<Session>,
    remaining_secs: u64,
    rounds_completed: u32,
    /// Kind of the most recently *completed* session. Stopped and skipped
    /// sessions do not move it.
    last_completed: Option<SessionType>,
    pending_auto_start: Option<PendingStart>,
}

impl FocusEngine {
    pub fn new(config: Config, clock: Arc<dyn Clock>, tracker: UsageTracker) -> Self {
        Self {
            config,
            clock,
            tracker,
            notifier: Arc::new(NullNotifier),
            advisor: None,
            history: History::new(),
            phase: TimerPhase::Idle,
            session: None,
            remaining_secs: 0,
            rounds_completed: 0,
            last_completed: None,
            pending_auto_start: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_advisor(mut self, advisor: Arc<dyn DurationAdvisor>) -> Self {
        self.advisor = Some(advisor);
        self
    }

    /// Preload the session log, usually replayed from the database, so
    /// aggregate stats span past runs of the host.
    pub fn with_history(mut self, history: History) -> Self {
        self.history = history;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn rounds_completed(&self) -> u32 {
        self.rounds_completed
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            phase: self.phase,
            session: self.session.clone(),
            remaining_secs: self.remaining_secs,
            rounds_completed: self.rounds_completed,
            target_rounds: self.config.timer.target_rounds,
        }
    }

    /// What follows the last completed session: a long break after every
    /// `long_break_interval`-th completed work round, a short break after
    /// any other completed work round, and work after everything else.
    pub fn next_session_type(&self) -> SessionType {
        match self.last_completed {
            Some(SessionType::Work) => {
                let interval = self.config.timer.long_break_interval.max(1);
                if self.rounds_completed > 0 && self.rounds_completed % interval == 0 {
                    SessionType::LongBreak
                } else {
                    SessionType::ShortBreak
                }
            }
            _ => SessionType::Work,
        }
    }

    // ── Tracker surfaces for the host ────────────────────────────────
    //
    // The host reads tracker state and drives sampling through the engine;
    // start/stop of the tracker stays the engine's call alone.

    pub fn is_tracking(&self) -> bool {
        self.tracker.is_tracking()
    }

    pub fn tracker_snapshot(&mut self) -> TrackerSnapshot {
        self.tracker.snapshot()
    }

    pub fn tracker_health(&mut self) -> TrackerHealth {
        self.tracker.health()
    }

    /// True when the host should drive [`sample`](Self::sample) now.
    pub fn sample_due(&mut self, now: DateTime<Utc>) -> bool {
        self.tracker.sample_due(now)
    }

    /// Query the probe once and attribute elapsed foreground time.
    pub async fn sample(&mut self) {
        self.tracker.sample().await;
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Open a session of `kind`. Fails with `SessionAlreadyActive` unless
    /// the engine is idle. Work sessions start the usage tracker.
    pub async fn start(
        &mut self,
        kind: SessionType,
        task: Option<TaskMeta>,
    ) -> Result<Event, TimerError> {
        self.start_session(kind, task, false).await
    }

    /// Pause the running session. Work sessions stop the tracker and fold
    /// the usage collected so far into the open session record, so nothing
    /// is lost if the pause never resumes.
    pub async fn pause(&mut self) -> Result<Event, TimerError> {
        if self.phase != TimerPhase::Running {
            return Err(TimerError::NoActiveSession);
        }
        let Some(session) = self.session.as_mut() else {
            return Err(TimerError::NoActiveSession);
        };
        if session.kind == SessionType::Work {
            let usage = self.tracker.stop().await;
            fold_usage(session, usage);
        }
        self.phase = TimerPhase::Paused;
        debug!(session_id = %session.id, remaining_secs = self.remaining_secs, "session paused");
        Ok(Event::SessionPaused {
            session_id: session.id.clone(),
            remaining_secs: self.remaining_secs,
            at: self.clock.now(),
        })
    }

    /// Resume the paused session. Work sessions restart the tracker; the
    /// new run's usage merges by app id with what the pause folded in.
    pub async fn resume(&mut self) -> Result<Event, TimerError> {
        if self.phase != TimerPhase::Paused {
            return Err(TimerError::NoActiveSession);
        }
        let Some(session) = self.session.as_ref() else {
            return Err(TimerError::NoActiveSession);
        };
        if session.kind == SessionType::Work {
            self.tracker.start(self.config.tracking.interval_secs).await;
        }
        self.phase = TimerPhase::Running;
        debug!(session_id = %session.id, remaining_secs = self.remaining_secs, "session resumed");
        Ok(Event::SessionResumed {
            session_id: session.id.clone(),
            remaining_secs: self.remaining_secs,
            at: self.clock.now(),
        })
    }

    /// Force the active session to completion, as if the countdown had
    /// reached zero.
    pub async fn complete(&mut self) -> Result<Event, TimerError> {
        self.finish(EndReason::Completed).await
    }

    /// Abandon the active session. Flushes usage and records it like
    /// completion does, but the session counts as not completed and no
    /// auto-start is scheduled.
    pub async fn stop(&mut self) -> Result<Event, TimerError> {
        self.finish(EndReason::Stopped).await
    }

    /// Abandon the active session to move on. Same path as `stop()` with a
    /// different recorded reason.
    pub async fn skip(&mut self) -> Result<Event, TimerError> {
        self.finish(EndReason::Skipped).await
    }

    /// The host's 1 Hz heartbeat.
    ///
    /// While running, consumes exactly one second per call; the countdown
    /// never jumps, even if the host fell behind. Hitting zero runs the
    /// completion path. While idle, fires a due auto-start. Paused and
    /// idle-without-pending ticks are no-ops.
    pub async fn tick(&mut self) -> Option<Event> {
        match self.phase {
            TimerPhase::Running => {
                self.remaining_secs = self.remaining_secs.saturating_sub(1);
                if self.remaining_secs == 0 {
                    return self.finish(EndReason::Completed).await.ok();
                }
                None
            }
            TimerPhase::Idle => {
                let pending = self.pending_auto_start?;
                if self.clock.now() < pending.due_at {
                    return None;
                }
                self.pending_auto_start = None;
                match self.start_session(pending.kind, None, true).await {
                    Ok(event) => Some(event),
                    Err(err) => {
                        warn!("pending auto-start rejected: {err}");
                        None
                    }
                }
            }
            _ => None,
        }
    }

    /// Begin a new focus period: the round counter restarts and the next
    /// session type is work again.
    pub fn reset_rounds(&mut self) {
        self.rounds_completed = 0;
        self.last_completed = None;
    }

    // ── Internal ─────────────────────────────────────────────────────

    async fn start_session(
        &mut self,
        kind: SessionType,
        task: Option<TaskMeta>,
        auto_started: bool,
    ) -> Result<Event, TimerError> {
        if self.phase != TimerPhase::Idle {
            return Err(TimerError::SessionAlreadyActive);
        }
        // A caller-issued start supersedes whatever completion scheduled.
        self.pending_auto_start = None;

        let planned_secs = self.planned_secs(kind);
        let now = self.clock.now();
        let session = Session::begin(kind, planned_secs, task, now);

        if kind == SessionType::Work {
            self.tracker.start(self.config.tracking.interval_secs).await;
        }
        if let Err(err) = self.notifier.on_session_start(&session) {
            warn!("session start notification failed: {err}");
        }

        debug!(
            session_id = %session.id,
            kind = %kind,
            planned_secs,
            auto_started,
            "session started"
        );
        let event = Event::SessionStarted {
            session_id: session.id.clone(),
            kind,
            planned_secs,
            auto_started,
            at: now,
        };
        self.session = Some(session);
        self.remaining_secs = planned_secs;
        self.phase = TimerPhase::Running;
        Ok(event)
    }

    /// Terminal path shared by complete, stop and skip: flush the tracker
    /// for work sessions, close and record the session, land back in idle.
    /// Completion additionally advances the round cadence, notifies, and
    /// schedules the configured auto-start.
    async fn finish(&mut self, reason: EndReason) -> Result<Event, TimerError> {
        if !matches!(self.phase, TimerPhase::Running | TimerPhase::Paused) {
            return Err(TimerError::NoActiveSession);
        }
        let Some(mut session) = self.session.take() else {
            return Err(TimerError::NoActiveSession);
        };
        let now = self.clock.now();

        // Idempotent for sessions that were paused: the tracker already
        // stopped at pause time and returns nothing here.
        if session.kind == SessionType::Work {
            let usage = self.tracker.stop().await;
            fold_usage(&mut session, usage);
        }

        session.ended_at = Some(now);
        session.completed = reason == EndReason::Completed;
        session.end_reason = Some(reason);

        if session.completed {
            // Passes through Completed on the way back to Idle.
            self.phase = TimerPhase::Completed;
            if session.kind == SessionType::Work {
                self.rounds_completed += 1;
            }
            self.last_completed = Some(session.kind);
        }

        self.history.append(session.clone(), now.date_naive());
        self.remaining_secs = 0;
        self.phase = TimerPhase::Idle;
        debug!(
            session_id = %session.id,
            reason = %session.end_reason.map(|r| r.as_str()).unwrap_or("none"),
            "session closed"
        );

        match reason {
            EndReason::Completed => {
                if let Err(err) = self.notifier.on_session_complete(&session) {
                    warn!("session complete notification failed: {err}");
                }
                let next_kind = self.next_session_type();
                if self.auto_start_enabled(next_kind) {
                    self.pending_auto_start = Some(PendingStart {
                        kind: next_kind,
                        due_at: now + Duration::seconds(AUTO_START_DELAY_SECS as i64),
                    });
                    debug!(next = %next_kind, delay_secs = AUTO_START_DELAY_SECS, "auto-start scheduled");
                }
                Ok(Event::SessionCompleted {
                    session,
                    next_kind,
                    at: now,
                })
            }
            EndReason::Stopped => Ok(Event::SessionStopped { session, at: now }),
            EndReason::Skipped => Ok(Event::SessionSkipped {
                session,
                next_kind: self.next_session_type(),
                at: now,
            }),
        }
    }

    fn planned_secs(&self, kind: SessionType) -> u64 {
        let configured = self.config.durations.planned_secs(kind);
        match &self.advisor {
            Some(advisor) => advisor.advise(kind, configured).unwrap_or(configured),
            None => configured,
        }
    }

    fn auto_start_enabled(&self, next: SessionType) -> bool {
        match next {
            SessionType::Work => self.config.timer.auto_start_work,
            SessionType::ShortBreak | SessionType::LongBreak => self.config.timer.auto_start_breaks,
        }
    }
}

/// Merge a tracker flush into the session record. A session that never saw
/// a successful sample keeps `app_usage: None`.
fn fold_usage(session: &mut Session, usage: Vec<UsageRecord>) {
    if usage.is_empty() {
        return;
    }
    let records = session.app_usage.get_or_insert_with(Vec::new);
    merge_usage(records, usage);
}
