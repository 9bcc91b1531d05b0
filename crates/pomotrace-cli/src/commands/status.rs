use pomotrace_core::{Config, TrackerCheckpoint, TRACKER_CHECKPOINT_KEY};

use super::{block_on, open_database};

/// Inspect the persisted tracking checkpoint without touching it. Whether
/// a restarted host would resume the run depends on the configured window,
/// so the verdict is computed here the same way the tracker computes it.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let raw = block_on(async {
        let db = open_database()?;
        db.kv_get(TRACKER_CHECKPOINT_KEY).await
    })??;

    let Some(raw) = raw else {
        println!("no tracking run persisted");
        return Ok(());
    };

    let checkpoint: TrackerCheckpoint = match serde_json::from_str(&raw) {
        Ok(checkpoint) => checkpoint,
        Err(e) => {
            println!("malformed checkpoint, a restarted host will discard it: {e}");
            return Ok(());
        }
    };

    let config = Config::load_or_default();
    let now = chrono::Utc::now();
    let view = serde_json::json!({
        "checkpoint": checkpoint,
        "resumable": checkpoint.is_tracking
            && checkpoint.within_window(now, config.tracking.resume_window_secs),
    });
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
