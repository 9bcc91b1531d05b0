//! Foreground application usage records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A foreground application as reported by a probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForegroundApp {
    /// Stable identifier: bundle id, executable name, or window class.
    pub id: String,
    pub display_name: String,
}

impl ForegroundApp {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// Accumulated foreground time for one application within a tracking run.
///
/// Unique per `app_id`; `seconds` never decreases while tracking is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub app_id: String,
    pub display_name: String,
    pub seconds: u64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// Merge `incoming` records into `base` by app id: seconds add, the
/// first/last seen window widens, the newer display name wins. `base` is
/// left sorted descending by seconds.
///
/// Used when a paused work session resumes and a second tracking run
/// contributes usage for apps the first run already saw.
pub fn merge_usage(base: &mut Vec<UsageRecord>, incoming: Vec<UsageRecord>) {
    for record in incoming {
        match base.iter_mut().find(|r| r.app_id == record.app_id) {
            Some(existing) => {
                existing.seconds += record.seconds;
                if record.first_seen < existing.first_seen {
                    existing.first_seen = record.first_seen;
                }
                if record.last_seen > existing.last_seen {
                    existing.last_seen = record.last_seen;
                }
                existing.display_name = record.display_name;
            }
            None => base.push(record),
        }
    }
    sort_usage(base);
}

/// Sort records descending by seconds, ties broken by app id so the order
/// is stable across runs.
pub fn sort_usage(records: &mut [UsageRecord]) {
    records.sort_by(|a, b| {
        b.seconds
            .cmp(&a.seconds)
            .then_with(|| a.app_id.cmp(&b.app_id))
    });
}
