//! Durable tracker checkpoint.
//!
//! The minimal subset of tracker state that survives a host restart: the
//! fact of an active run, when it started, when it last sampled, and the
//! sampling cadence. Per-app usage is deliberately not persisted, so a
//! restart always loses the pre-restart per-app breakdown.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store key the checkpoint lives under.
pub const TRACKER_CHECKPOINT_KEY: &str = "tracker_checkpoint";

/// Written on tracking start, cleared on stop. Not rewritten per sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerCheckpoint {
    pub is_tracking: bool,
    pub session_started_at: DateTime<Utc>,
    pub last_sample_at: DateTime<Utc>,
    pub interval_secs: u64,
}

impl TrackerCheckpoint {
    /// Whether the checkpoint is young enough to resume from. Checkpoints
    /// from the future (clock moved backwards) count as stale.
    pub fn within_window(&self, now: DateTime<Utc>, window_secs: u64) -> bool {
        let age = (now - self.session_started_at).num_seconds();
        age >= 0 && age as u64 <= window_secs
    }
}
