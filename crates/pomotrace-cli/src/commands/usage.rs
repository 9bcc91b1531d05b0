use clap::Args;
use pomotrace_core::analytics;
use pomotrace_core::TrackerSnapshot;

use super::{block_on, open_database};

#[derive(Args)]
pub struct UsageArgs {
    /// Session id to analyze
    #[arg(required_unless_present = "last", conflicts_with = "last")]
    pub session_id: Option<String>,

    /// Analyze the most recently started session instead
    #[arg(long)]
    pub last: bool,
}

/// Replay a recorded session's usage list through the analytics layer.
pub fn run(args: UsageArgs) -> Result<(), Box<dyn std::error::Error>> {
    let session = block_on(async {
        let db = open_database()?;
        match &args.session_id {
            Some(id) => db.session_by_id(id).await,
            None => db.last_session().await,
        }
    })??;

    let Some(session) = session else {
        eprintln!("no matching session recorded");
        std::process::exit(1);
    };

    let Some(usage) = session.app_usage.clone() else {
        eprintln!(
            "session {} has no app usage (breaks are not tracked)",
            session.id
        );
        std::process::exit(1);
    };

    // Closed sessions know their true wall clock; a session that never
    // closed falls back to its planned length.
    let wall_clock_secs = session
        .ended_at
        .map(|ended| (ended - session.started_at).num_seconds().max(0) as u64)
        .unwrap_or(session.planned_secs);
    let snapshot = TrackerSnapshot::from_records(usage, wall_clock_secs);

    let view = serde_json::json!({
        "session_id": session.id,
        "kind": session.kind,
        "statistics": analytics::statistics(&snapshot),
        "insights": analytics::productivity_insights(&snapshot),
    });
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
