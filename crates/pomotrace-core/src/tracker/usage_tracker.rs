//! Foreground usage tracker.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::storage::TrackingConfig;
use crate::store::SnapshotStore;
use crate::tracker::checkpoint::TrackerCheckpoint;
use crate::tracker::probe::ForegroundProbe;
use crate::tracker::TRACKER_CHECKPOINT_KEY;
use crate::usage::{sort_usage, ForegroundApp, UsageRecord};

/// Tunables for failure handling and restart recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerSettings {
    /// Consecutive probe failures tolerated before sampling self-suspends.
    pub max_consecutive_errors: u32,
    /// Delay after suspension until the error counter clears.
    pub error_reset_secs: u64,
    /// Maximum checkpoint age eligible for restart recovery.
    pub resume_window_secs: u64,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            max_consecutive_errors: 10,
            error_reset_secs: 300,
            resume_window_secs: 3600,
        }
    }
}

impl From<&TrackingConfig> for TrackerSettings {
    fn from(cfg: &TrackingConfig) -> Self {
        Self {
            max_consecutive_errors: cfg.max_consecutive_errors,
            error_reset_secs: cfg.error_reset_secs,
            resume_window_secs: cfg.resume_window_secs,
        }
    }
}

/// Read-only view of a tracking run as of one instant.
///
/// `apps` already includes the unflushed slice for the current app, so two
/// snapshots taken back to back never miss the seconds between the last
/// sample and now. The underlying accounting is untouched; the real
/// attribution happens at the next sample or at stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerSnapshot {
    pub is_tracking: bool,
    /// Sorted descending by accumulated seconds.
    pub apps: Vec<UsageRecord>,
    pub current_app: Option<ForegroundApp>,
    pub session_started_at: Option<DateTime<Utc>>,
    pub last_sample_at: Option<DateTime<Utc>>,
    /// Seconds since tracking started.
    pub wall_clock_secs: u64,
    /// Seconds attributed to apps, unflushed slice included.
    pub total_tracked_secs: u64,
    pub error_count: u32,
    pub last_error: Option<String>,
    pub sampling_suspended: bool,
}

impl TrackerSnapshot {
    /// View over an already-recorded usage list, so the analytics functions
    /// work on closed sessions as well as live runs.
    pub fn from_records(mut apps: Vec<UsageRecord>, wall_clock_secs: u64) -> Self {
        sort_usage(&mut apps);
        let total_tracked_secs = apps.iter().map(|r| r.seconds).sum();
        Self {
            is_tracking: false,
            apps,
            current_app: None,
            session_started_at: None,
            last_sample_at: None,
            wall_clock_secs,
            total_tracked_secs,
            error_count: 0,
            last_error: None,
            sampling_suspended: false,
        }
    }
}

/// Probe health counters, for diagnostics surfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerHealth {
    pub is_tracking: bool,
    pub sampling_suspended: bool,
    pub error_count: u32,
    pub last_error: Option<String>,
    pub last_sample_at: Option<DateTime<Utc>>,
    pub interval_secs: u64,
}

/// Samples a [`ForegroundProbe`] on a cooperative cadence and accumulates
/// per-app foreground seconds.
///
/// There is no internal task. The host asks [`sample_due`](Self::sample_due)
/// on its own heartbeat and drives [`sample`](Self::sample) itself, so
/// samples never overlap and stopping leaves nothing to cancel. The timer
/// engine only calls [`start`](Self::start) and [`stop`](Self::stop).
pub struct UsageTracker {
    clock: Arc<dyn Clock>,
    probe: Arc<dyn ForegroundProbe>,
    store: Arc<dyn SnapshotStore>,
    settings: TrackerSettings,
    is_tracking: bool,
    interval_secs: u64,
    apps: HashMap<String, UsageRecord>,
    current_app: Option<ForegroundApp>,
    session_started_at: Option<DateTime<Utc>>,
    last_sample_at: Option<DateTime<Utc>>,
    total_tracked_secs: u64,
    error_count: u32,
    last_error: Option<String>,
    sampling_suspended: bool,
    error_reset_due: Option<DateTime<Utc>>,
}

impl UsageTracker {
    pub fn new(
        clock: Arc<dyn Clock>,
        probe: Arc<dyn ForegroundProbe>,
        store: Arc<dyn SnapshotStore>,
        settings: TrackerSettings,
    ) -> Self {
        Self {
            clock,
            probe,
            store,
            settings,
            is_tracking: false,
            interval_secs: 0,
            apps: HashMap::new(),
            current_app: None,
            session_started_at: None,
            last_sample_at: None,
            total_tracked_secs: 0,
            error_count: 0,
            last_error: None,
            sampling_suspended: false,
            error_reset_due: None,
        }
    }

    /// Reconstruct a tracker from the persisted checkpoint, if one exists
    /// and is young enough.
    ///
    /// Per-app usage is not persisted, so a resumed run starts with an
    /// empty map: only the fact, start time and cadence of the run survive
    /// a restart. Stale, future-dated or malformed checkpoints are
    /// discarded and the tracker comes up idle. Nothing is probed or
    /// written here; recovery must never block or fail host startup.
    pub async fn restore(
        clock: Arc<dyn Clock>,
        probe: Arc<dyn ForegroundProbe>,
        store: Arc<dyn SnapshotStore>,
        settings: TrackerSettings,
    ) -> Self {
        let mut tracker = Self::new(clock, probe, store, settings);
        let raw = match tracker.store.get(TRACKER_CHECKPOINT_KEY).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!("checkpoint read failed, starting idle: {err}");
                return tracker;
            }
        };
        let Some(raw) = raw else { return tracker };
        let checkpoint: TrackerCheckpoint = match serde_json::from_str(&raw) {
            Ok(checkpoint) => checkpoint,
            Err(err) => {
                debug!("discarding malformed tracker checkpoint: {err}");
                return tracker;
            }
        };
        let now = tracker.clock.now();
        if !checkpoint.is_tracking
            || !checkpoint.within_window(now, tracker.settings.resume_window_secs)
        {
            debug!("discarding stale tracker checkpoint");
            return tracker;
        }

        tracker.is_tracking = true;
        tracker.interval_secs = checkpoint.interval_secs;
        tracker.session_started_at = Some(checkpoint.session_started_at);
        tracker.last_sample_at = Some(checkpoint.last_sample_at);
        debug!(
            started_at = %checkpoint.session_started_at,
            interval_secs = checkpoint.interval_secs,
            "resumed tracking run from checkpoint"
        );
        tracker
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn is_tracking(&self) -> bool {
        self.is_tracking
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }

    /// True when the host should drive the next sample: tracking, not
    /// suspended, and at least one interval since the last sample. Applies
    /// a due error-counter reset first so the reset is observable even
    /// though a suspended run stays suspended.
    pub fn sample_due(&mut self, now: DateTime<Utc>) -> bool {
        self.apply_error_reset_if_due(now);
        if !self.is_tracking || self.sampling_suspended {
            return false;
        }
        match self.last_sample_at {
            Some(last) => (now - last).num_seconds() >= self.interval_secs as i64,
            None => true,
        }
    }

    /// Usage as of now, sorted descending by seconds.
    pub fn current_usage(&mut self) -> Vec<UsageRecord> {
        self.snapshot().apps
    }

    /// Full runtime view as of now; see [`TrackerSnapshot`].
    pub fn snapshot(&mut self) -> TrackerSnapshot {
        let now = self.clock.now();
        self.apply_error_reset_if_due(now);

        let mut apps: Vec<UsageRecord> = self.apps.values().cloned().collect();
        let mut total_tracked_secs = self.total_tracked_secs;

        // Fold the unflushed slice into the reported copy only.
        if self.is_tracking {
            if let (Some(app), Some(last)) = (&self.current_app, self.last_sample_at) {
                let tail = (now - last).num_seconds().max(0) as u64;
                if tail > 0 {
                    total_tracked_secs += tail;
                    match apps.iter_mut().find(|r| r.app_id == app.id) {
                        Some(record) => {
                            record.seconds += tail;
                            record.last_seen = now;
                        }
                        None => apps.push(UsageRecord {
                            app_id: app.id.clone(),
                            display_name: app.display_name.clone(),
                            seconds: tail,
                            first_seen: last,
                            last_seen: now,
                        }),
                    }
                }
            }
        }
        sort_usage(&mut apps);

        let wall_clock_secs = match self.session_started_at {
            Some(started) if self.is_tracking => (now - started).num_seconds().max(0) as u64,
            _ => 0,
        };

        TrackerSnapshot {
            is_tracking: self.is_tracking,
            apps,
            current_app: self.current_app.clone(),
            session_started_at: self.session_started_at,
            last_sample_at: self.last_sample_at,
            wall_clock_secs,
            total_tracked_secs,
            error_count: self.error_count,
            last_error: self.last_error.clone(),
            sampling_suspended: self.sampling_suspended,
        }
    }

    pub fn health(&mut self) -> TrackerHealth {
        let now = self.clock.now();
        self.apply_error_reset_if_due(now);
        TrackerHealth {
            is_tracking: self.is_tracking,
            sampling_suspended: self.sampling_suspended,
            error_count: self.error_count,
            last_error: self.last_error.clone(),
            last_sample_at: self.last_sample_at,
            interval_secs: self.interval_secs,
        }
    }

    // ── Commands ────────────────────────────────────────────────────────

    /// Begin a tracking run and take the first sample immediately.
    ///
    /// No-op when already tracking, so a run resumed across a host restart
    /// keeps accumulating instead of being clobbered by the next session
    /// start. A checkpoint write failure is logged and tracking continues
    /// in memory.
    pub async fn start(&mut self, interval_secs: u64) {
        if self.is_tracking {
            debug!("tracker already running; start ignored");
            return;
        }
        let now = self.clock.now();
        self.is_tracking = true;
        self.interval_secs = interval_secs;
        self.apps.clear();
        self.current_app = None;
        self.session_started_at = Some(now);
        self.last_sample_at = Some(now);
        self.total_tracked_secs = 0;
        self.error_count = 0;
        self.last_error = None;
        self.sampling_suspended = false;
        self.error_reset_due = None;

        let checkpoint = TrackerCheckpoint {
            is_tracking: true,
            session_started_at: now,
            last_sample_at: now,
            interval_secs,
        };
        self.write_checkpoint(&checkpoint).await;
        debug!(interval_secs, "usage tracking started");

        self.sample().await;
    }

    /// Query the probe once and attribute the elapsed slice.
    ///
    /// The slice since the last sample always goes to the app that was
    /// current *before* this observation; the newly seen app starts its
    /// clock now. On failure only the error counters move, so the next
    /// success attributes the whole gap to the previous app. Hitting the
    /// configured failure maximum suspends periodic sampling for the rest
    /// of the run.
    pub async fn sample(&mut self) {
        if !self.is_tracking || self.sampling_suspended {
            return;
        }
        match self.probe.foreground_app().await {
            Ok(app) => {
                let now = self.clock.now();
                self.attribute_elapsed(now);
                self.current_app = Some(app);
                self.last_sample_at = Some(now);
                self.error_count = 0;
            }
            Err(err) => {
                self.error_count += 1;
                self.last_error = Some(err.to_string());
                warn!(error_count = self.error_count, "foreground probe failed: {err}");
                if self.error_count >= self.settings.max_consecutive_errors {
                    let now = self.clock.now();
                    self.sampling_suspended = true;
                    self.error_reset_due =
                        Some(now + Duration::seconds(self.settings.error_reset_secs as i64));
                    warn!(
                        max = self.settings.max_consecutive_errors,
                        "sampling suspended after consecutive probe failures"
                    );
                }
            }
        }
    }

    /// Close the tracking run and return its usage, sorted descending.
    ///
    /// The slice since the last sample is flushed to the current app
    /// without touching the probe; a fresh observation could only rename
    /// time that already belongs to the app that was foregrounded.
    /// Idempotent: stopping an idle tracker returns an empty list.
    pub async fn stop(&mut self) -> Vec<UsageRecord> {
        if !self.is_tracking {
            return Vec::new();
        }
        let now = self.clock.now();
        self.attribute_elapsed(now);

        let mut usage: Vec<UsageRecord> = self.apps.drain().map(|(_, record)| record).collect();
        sort_usage(&mut usage);

        if let Err(err) = self.store.delete(TRACKER_CHECKPOINT_KEY).await {
            warn!("checkpoint delete failed: {err}");
        }

        self.is_tracking = false;
        self.interval_secs = 0;
        self.current_app = None;
        self.session_started_at = None;
        self.last_sample_at = None;
        self.total_tracked_secs = 0;
        self.error_count = 0;
        self.last_error = None;
        self.sampling_suspended = false;
        self.error_reset_due = None;

        debug!(apps = usage.len(), "usage tracking stopped");
        usage
    }

    // ── Internal ────────────────────────────────────────────────────────

    /// Persist the durable subset of the run under its well-known key.
    /// Failures are logged and swallowed; the run proceeds in memory.
    async fn write_checkpoint(&self, checkpoint: &TrackerCheckpoint) {
        let json = match serde_json::to_string(checkpoint) {
            Ok(json) => json,
            Err(err) => {
                warn!("checkpoint encode failed: {err}");
                return;
            }
        };
        if let Err(err) = self.store.set(TRACKER_CHECKPOINT_KEY, &json).await {
            warn!("checkpoint write failed: {err}");
        }
    }

    /// Add `now - last_sample_at` to the current app's record and advance
    /// the sample marker. The record is created on first attribution with
    /// `first_seen` at the moment the app became current; zero-length
    /// slices create no record.
    fn attribute_elapsed(&mut self, now: DateTime<Utc>) {
        let (Some(app), Some(last)) = (self.current_app.as_ref(), self.last_sample_at) else {
            return;
        };
        let elapsed = (now - last).num_seconds().max(0) as u64;
        if elapsed == 0 {
            return;
        }
        let record = self
            .apps
            .entry(app.id.clone())
            .or_insert_with(|| UsageRecord {
                app_id: app.id.clone(),
                display_name: app.display_name.clone(),
                seconds: 0,
                first_seen: last,
                last_seen: now,
            });
        record.seconds += elapsed;
        record.last_seen = now;
        self.total_tracked_secs += elapsed;
        self.last_sample_at = Some(now);
    }

    /// One-shot: clears the error counter once the reset delay has passed.
    /// The run stays suspended; only stop/start re-arms sampling.
    fn apply_error_reset_if_due(&mut self, now: DateTime<Utc>) {
        let Some(due) = self.error_reset_due else {
            return;
        };
        if now < due {
            return;
        }
        self.error_count = 0;
        self.error_reset_due = None;
        debug!("probe error counter reset; sampling remains suspended");
    }
}
