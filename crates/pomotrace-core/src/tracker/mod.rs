//! Application usage tracking.
//!
//! [`UsageTracker`] samples a [`ForegroundProbe`] on a cooperative cadence,
//! attributes elapsed time to whichever app was foregrounded, and persists a
//! minimal [`TrackerCheckpoint`] so an interrupted run can resume after the
//! host restarts.

mod checkpoint;
mod probe;
mod usage_tracker;

pub use checkpoint::{TrackerCheckpoint, TRACKER_CHECKPOINT_KEY};
pub use probe::ForegroundProbe;
pub use usage_tracker::{TrackerHealth, TrackerSettings, TrackerSnapshot, UsageTracker};
