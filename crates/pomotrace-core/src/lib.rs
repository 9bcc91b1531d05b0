//! # Pomotrace Core Library
//!
//! This library is the engine behind a Pomodoro-style focus timer: one
//! active timed session, automatic work/break transitions, and concurrent
//! sampling of the foreground application into per-session usage
//! analytics. It is CLI-first: all operations are available through a
//! standalone binary, and any other host is a thin layer over the same
//! library.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a caller-driven state machine; the host invokes
//!   `tick()` once per second and drives probe sampling between ticks
//! - **Usage Tracker**: cooperative foreground sampling with a durable
//!   checkpoint so an interrupted run resumes after a host restart
//! - **Storage**: SQLite-based session log and key-value store behind a
//!   worker thread, TOML-based configuration
//! - **Analytics**: pure functions deriving statistics and productivity
//!   insights from a tracker snapshot
//!
//! ## Key Components
//!
//! - [`FocusEngine`]: session lifecycle state machine
//! - [`UsageTracker`]: foreground-app usage accounting
//! - [`History`]: append-only session log with recomputed aggregates
//! - [`Database`]: session and checkpoint persistence
//! - [`Config`]: application configuration management
//!
//! Everything fallible degrades instead of crashing the host: probe
//! failures are counted and eventually suspend sampling, persistence
//! failures fall back to in-memory state, and corrupt checkpoints are
//! discarded at startup.

pub mod analytics;
pub mod clock;
pub mod error;
pub mod events;
pub mod history;
pub mod notify;
pub mod session;
pub mod storage;
pub mod store;
pub mod timer;
pub mod tracker;
pub mod usage;

pub use clock::{Clock, SystemClock};
pub use error::{ConfigError, CoreError, ProbeError, Result, StoreError, TimerError};
pub use events::Event;
pub use history::{AggregateStats, History};
pub use notify::{Notifier, NullNotifier};
pub use session::{EndReason, Session, SessionType, TaskMeta};
pub use storage::{Config, Database};
pub use store::{MemoryStore, SnapshotStore};
pub use timer::{DurationAdvisor, FocusEngine, TimerPhase, TimerSnapshot};
pub use tracker::{
    ForegroundProbe, TrackerCheckpoint, TrackerHealth, TrackerSettings, TrackerSnapshot,
    UsageTracker, TRACKER_CHECKPOINT_KEY,
};
pub use usage::{ForegroundApp, UsageRecord};
