//! Usage analytics.
//!
//! Pure functions over [`TrackerSnapshot`]: the same snapshot always yields
//! the same output. No clock reads, no state. Hosts run these on live
//! snapshots mid-session or on usage lists replayed from recorded sessions
//! via [`TrackerSnapshot::from_records`].

use serde::{Deserialize, Serialize};

use crate::tracker::TrackerSnapshot;
use crate::usage::UsageRecord;

/// How an application counts toward the focus score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppClass {
    Productive,
    Distraction,
    Neutral,
}

/// Matched as lowercase substrings against app id and display name.
const PRODUCTIVE_APPS: &[&str] = &[
    "code", "vim", "emacs", "intellij", "pycharm", "xcode", "terminal", "iterm", "alacritty",
    "kitty", "zed", "sublime", "jetbrains", "notion", "obsidian", "figma",
];

const DISTRACTION_APPS: &[&str] = &[
    "youtube", "twitter", "reddit", "instagram", "tiktok", "facebook", "netflix", "twitch",
    "steam", "discord", "telegram", "whatsapp",
];

/// Classify one usage record. Productive wins over distraction when both
/// tables match, unknown apps are neutral.
pub fn classify(record: &UsageRecord) -> AppClass {
    let id = record.app_id.to_lowercase();
    let name = record.display_name.to_lowercase();
    let matches = |table: &[&str]| table.iter().any(|p| id.contains(p) || name.contains(p));
    if matches(PRODUCTIVE_APPS) {
        AppClass::Productive
    } else if matches(DISTRACTION_APPS) {
        AppClass::Distraction
    } else {
        AppClass::Neutral
    }
}

/// Shape of a tracking run, without any judgement about the apps in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageStatistics {
    pub app_count: usize,
    pub total_tracked_secs: u64,
    pub most_used: Option<UsageRecord>,
    pub least_used: Option<UsageRecord>,
    pub average_secs_per_app: f64,
    /// Tracked time over wall-clock time, as a percentage capped at 100.
    /// Zero when no wall clock has elapsed.
    pub tracking_accuracy_pct: f64,
}

/// Descriptive statistics for one tracking run.
pub fn statistics(snapshot: &TrackerSnapshot) -> UsageStatistics {
    let apps = &snapshot.apps;
    let total: u64 = apps.iter().map(|r| r.seconds).sum();
    let average_secs_per_app = if apps.is_empty() {
        0.0
    } else {
        total as f64 / apps.len() as f64
    };
    let tracking_accuracy_pct = if snapshot.wall_clock_secs == 0 {
        0.0
    } else {
        (total as f64 / snapshot.wall_clock_secs as f64 * 100.0).min(100.0)
    };
    UsageStatistics {
        app_count: apps.len(),
        total_tracked_secs: total,
        most_used: apps.first().cloned(),
        least_used: apps.last().cloned(),
        average_secs_per_app,
        tracking_accuracy_pct,
    }
}

/// Focus scoring over classified usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductivityInsights {
    /// 0..=100. Productive share minus half the distraction share.
    pub focus_score: f64,
    pub productive_secs: u64,
    pub distraction_secs: u64,
    pub neutral_secs: u64,
    /// At most three, ordered by severity.
    pub recommendations: Vec<String>,
}

/// Score a tracking run and derive recommendations.
///
/// Deterministic: thresholds are fixed and the snapshot's usage is already
/// sorted, so equal snapshots produce byte-equal output.
pub fn productivity_insights(snapshot: &TrackerSnapshot) -> ProductivityInsights {
    let mut productive_secs = 0u64;
    let mut distraction_secs = 0u64;
    let mut neutral_secs = 0u64;
    for record in &snapshot.apps {
        match classify(record) {
            AppClass::Productive => productive_secs += record.seconds,
            AppClass::Distraction => distraction_secs += record.seconds,
            AppClass::Neutral => neutral_secs += record.seconds,
        }
    }
    let total = productive_secs + distraction_secs + neutral_secs;

    let focus_score = if total == 0 {
        0.0
    } else {
        let productive_ratio = productive_secs as f64 / total as f64;
        let distraction_ratio = distraction_secs as f64 / total as f64;
        ((productive_ratio - 0.5 * distraction_ratio) * 100.0).clamp(0.0, 100.0)
    };

    let mut recommendations = Vec::new();
    if total > 0 {
        let distraction_ratio = distraction_secs as f64 / total as f64;
        if distraction_ratio > 0.3 {
            if let Some(worst) = snapshot
                .apps
                .iter()
                .filter(|r| classify(r) == AppClass::Distraction)
                .max_by_key(|r| r.seconds)
            {
                recommendations.push(format!(
                    "{:.0}% of tracked time went to distracting apps; consider closing {} during work sessions",
                    distraction_ratio * 100.0,
                    worst.display_name
                ));
            }
        }
        if snapshot.apps.len() > 8 {
            recommendations.push(format!(
                "You used {} different apps in one run; fewer context switches usually means deeper focus",
                snapshot.apps.len()
            ));
        }
        if focus_score >= 70.0 {
            recommendations
                .push("Strong focus: most tracked time went to productive apps".to_string());
        } else if productive_secs == 0 {
            recommendations.push(
                "None of the tracked apps are classified as productive; check the foreground probe is seeing your work apps".to_string(),
            );
        }
        recommendations.truncate(3);
    }

    ProductivityInsights {
        focus_score,
        productive_secs,
        distraction_secs,
        neutral_secs,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn record(app_id: &str, display_name: &str, seconds: u64) -> UsageRecord {
        let at: DateTime<Utc> = "2026-03-01T09:00:00Z".parse().unwrap();
        UsageRecord {
            app_id: app_id.into(),
            display_name: display_name.into(),
            seconds,
            first_seen: at,
            last_seen: at,
        }
    }

    fn snapshot(records: Vec<UsageRecord>, wall_clock_secs: u64) -> TrackerSnapshot {
        TrackerSnapshot::from_records(records, wall_clock_secs)
    }

    #[test]
    fn classification_matches_substrings_case_insensitively() {
        assert_eq!(classify(&record("com.microsoft.VSCode", "Code", 1)), AppClass::Productive);
        assert_eq!(classify(&record("org.mozilla.firefox", "YouTube - Firefox", 1)), AppClass::Distraction);
        assert_eq!(classify(&record("org.gnome.Calculator", "Calculator", 1)), AppClass::Neutral);
    }

    #[test]
    fn statistics_over_empty_snapshot() {
        let stats = statistics(&snapshot(vec![], 0));
        assert_eq!(stats.app_count, 0);
        assert!(stats.most_used.is_none());
        assert!(stats.least_used.is_none());
        assert_eq!(stats.average_secs_per_app, 0.0);
        assert_eq!(stats.tracking_accuracy_pct, 0.0);
    }

    #[test]
    fn statistics_picks_extremes_and_average() {
        let stats = statistics(&snapshot(
            vec![
                record("code", "Code", 300),
                record("firefox", "Firefox", 100),
                record("slack", "Slack", 200),
            ],
            1000,
        ));
        assert_eq!(stats.app_count, 3);
        assert_eq!(stats.most_used.unwrap().app_id, "code");
        assert_eq!(stats.least_used.unwrap().app_id, "firefox");
        assert_eq!(stats.average_secs_per_app, 200.0);
        assert_eq!(stats.tracking_accuracy_pct, 60.0);
    }

    #[test]
    fn accuracy_caps_at_hundred() {
        let stats = statistics(&snapshot(vec![record("code", "Code", 500)], 400));
        assert_eq!(stats.tracking_accuracy_pct, 100.0);
    }

    #[test]
    fn insights_score_all_productive() {
        let insights = productivity_insights(&snapshot(vec![record("vim", "Vim", 600)], 600));
        assert_eq!(insights.focus_score, 100.0);
        assert_eq!(insights.productive_secs, 600);
        assert_eq!(insights.distraction_secs, 0);
    }

    #[test]
    fn insights_score_mixed() {
        // 300 productive, 100 distraction, 0 neutral:
        // (0.75 - 0.5 * 0.25) * 100 = 62.5
        let insights = productivity_insights(&snapshot(
            vec![record("code", "Code", 300), record("youtube", "YouTube", 100)],
            400,
        ));
        assert_eq!(insights.focus_score, 62.5);
    }

    #[test]
    fn insights_empty_scores_zero_without_recommendations() {
        let insights = productivity_insights(&snapshot(vec![], 0));
        assert_eq!(insights.focus_score, 0.0);
        assert!(insights.recommendations.is_empty());
    }

    #[test]
    fn heavy_distraction_names_the_worst_offender() {
        let insights = productivity_insights(&snapshot(
            vec![
                record("code", "Code", 100),
                record("youtube", "YouTube", 200),
                record("twitter", "Twitter", 150),
            ],
            450,
        ));
        assert!(insights.recommendations[0].contains("YouTube"));
    }

    #[test]
    fn insights_are_deterministic() {
        let make = || {
            productivity_insights(&snapshot(
                vec![
                    record("code", "Code", 120),
                    record("youtube", "YouTube", 90),
                    record("slack", "Slack", 30),
                ],
                300,
            ))
        };
        assert_eq!(make(), make());
    }
}
