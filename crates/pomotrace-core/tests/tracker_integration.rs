//! Tracker scenarios driven the way a real host drives them: a 1 Hz
//! heartbeat asking `sample_due` and sampling cooperatively, with host
//! restarts simulated by dropping one tracker and restoring another over
//! the same store.

mod common;

use std::sync::Arc;

use common::{app, FixedProbe, ManualClock, ScriptedProbe};
use pomotrace_core::{
    analytics, Clock, MemoryStore, SnapshotStore, TrackerCheckpoint, TrackerSettings,
    TrackerSnapshot, UsageTracker, TRACKER_CHECKPOINT_KEY,
};

/// One host heartbeat per second: advance the clock, sample when due.
async fn drive(tracker: &mut UsageTracker, clock: &ManualClock, seconds: u64) {
    for _ in 0..seconds {
        clock.advance(1);
        if tracker.sample_due(clock.now()) {
            tracker.sample().await;
        }
    }
}

#[tokio::test]
async fn test_attribution_follows_foreground_switches() {
    let clock = ManualClock::at("2026-03-02T09:00:00Z");
    let probe = ScriptedProbe::new(vec![
        Some(app("editor", "Editor")), // consumed by start()
        Some(app("editor", "Editor")),
        Some(app("editor", "Editor")),
        Some(app("browser", "Browser")),
        Some(app("browser", "Browser")),
        Some(app("editor", "Editor")), // repeats from here on
    ]);
    let mut tracker = UsageTracker::new(
        clock.clone(),
        probe,
        Arc::new(MemoryStore::new()),
        TrackerSettings::default(),
    );

    tracker.start(1).await;
    drive(&mut tracker, &clock, 6).await;
    let usage = tracker.stop().await;

    // Each sampled second lands on whichever app was foreground before
    // the observation: the switch to the browser still credits the
    // editor for the second that led up to it, and vice versa.
    assert_eq!(usage.len(), 2);
    assert_eq!(usage[0].app_id, "editor");
    assert_eq!(usage[0].seconds, 4);
    assert_eq!(usage[1].app_id, "browser");
    assert_eq!(usage[1].seconds, 2);
}

#[tokio::test]
async fn test_sparse_cadence_still_accounts_for_every_second() {
    let clock = ManualClock::at("2026-03-02T09:00:00Z");
    let mut tracker = UsageTracker::new(
        clock.clone(),
        Arc::new(FixedProbe(app("zed", "Zed"))),
        Arc::new(MemoryStore::new()),
        TrackerSettings::default(),
    );

    // Only every fifth heartbeat samples, and 47 is not a multiple of
    // five, so the final two seconds exist only as the unflushed tail.
    tracker.start(5).await;
    drive(&mut tracker, &clock, 47).await;
    let usage = tracker.stop().await;

    assert_eq!(usage.len(), 1);
    assert_eq!(usage[0].seconds, 47);

    let snapshot = TrackerSnapshot::from_records(usage, 47);
    let stats = analytics::statistics(&snapshot);
    assert_eq!(stats.total_tracked_secs, 47);
    assert_eq!(stats.tracking_accuracy_pct, 100.0);
}

#[tokio::test]
async fn test_suspended_run_keeps_counting_for_the_last_seen_app() {
    let clock = ManualClock::at("2026-03-02T09:00:00Z");
    let probe = ScriptedProbe::new(vec![Some(app("editor", "Editor")), None]);
    let settings = TrackerSettings {
        max_consecutive_errors: 3,
        ..TrackerSettings::default()
    };
    let mut tracker =
        UsageTracker::new(clock.clone(), probe, Arc::new(MemoryStore::new()), settings);

    tracker.start(1).await; // one good observation, then the probe dies
    drive(&mut tracker, &clock, 3).await;

    let health = tracker.health();
    assert!(health.sampling_suspended);
    assert_eq!(health.error_count, 3);
    assert!(health.last_error.is_some());
    assert!(tracker.is_tracking());
    assert!(!tracker.sample_due(clock.now()));

    // Failures never advanced the sample marker, so the editor has been
    // on the clock since the one successful observation.
    clock.advance(7);
    let usage = tracker.stop().await;
    assert_eq!(usage.len(), 1);
    assert_eq!(usage[0].app_id, "editor");
    assert_eq!(usage[0].seconds, 10);
}

#[tokio::test]
async fn test_restart_resumes_the_run_over_the_same_store() {
    let store = Arc::new(MemoryStore::new());
    let clock = ManualClock::at("2026-03-02T09:00:00Z");
    let mut first = UsageTracker::new(
        clock.clone(),
        Arc::new(FixedProbe(app("zed", "Zed"))),
        store.clone(),
        TrackerSettings::default(),
    );
    first.start(5).await;
    drive(&mut first, &clock, 20).await;
    drop(first); // host dies without stopping

    // Ten minutes later a new host restores from the checkpoint.
    clock.advance(600);
    let mut second = UsageTracker::restore(
        clock.clone(),
        Arc::new(FixedProbe(app("zed", "Zed"))),
        store.clone(),
        TrackerSettings::default(),
    )
    .await;
    assert!(second.is_tracking());
    assert_eq!(second.interval_secs(), 5);
    assert_eq!(
        second.snapshot().session_started_at,
        Some("2026-03-02T09:00:00Z".parse().unwrap())
    );

    // In-memory usage did not survive and the outage gap belongs to no
    // one: the first post-restart sample has no previous app to charge,
    // so thirty driven seconds yield 25 sampled plus a 4 second tail.
    drive(&mut second, &clock, 30).await;
    let usage = second.stop().await;
    assert_eq!(usage.len(), 1);
    assert_eq!(usage[0].app_id, "zed");
    assert_eq!(usage[0].seconds, 29);

    // stop() retired the checkpoint; the next restore comes up idle.
    assert!(store.get(TRACKER_CHECKPOINT_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn test_stale_checkpoint_gives_way_to_the_next_run() {
    let store = Arc::new(MemoryStore::new());
    let clock = ManualClock::at("2026-03-02T09:00:00Z");
    let mut first = UsageTracker::new(
        clock.clone(),
        Arc::new(FixedProbe(app("zed", "Zed"))),
        store.clone(),
        TrackerSettings::default(),
    );
    first.start(5).await;
    drop(first);

    // Two hours is past the resume window: the run is gone.
    clock.advance(7_200);
    let mut tracker = UsageTracker::restore(
        clock.clone(),
        Arc::new(FixedProbe(app("zed", "Zed"))),
        store.clone(),
        TrackerSettings::default(),
    )
    .await;
    assert!(!tracker.is_tracking());

    // Starting fresh overwrites the stale checkpoint in place.
    tracker.start(5).await;
    let raw = store.get(TRACKER_CHECKPOINT_KEY).await.unwrap().unwrap();
    let checkpoint: TrackerCheckpoint = serde_json::from_str(&raw).unwrap();
    assert!(checkpoint.is_tracking);
    assert_eq!(
        checkpoint.session_started_at,
        "2026-03-02T11:00:00Z".parse::<chrono::DateTime<chrono::Utc>>().unwrap()
    );
}
