use clap::Subcommand;
use pomotrace_core::{History, StoreError};

use super::{block_on, open_database};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's stats
    Today,
    /// All-time stats
    All,
    /// Recent sessions, newest first
    Sessions {
        /// How many sessions to list
        #[arg(long, default_value = "10")]
        limit: usize,
    },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let today = chrono::Utc::now().date_naive();
    let history = block_on(async {
        let db = open_database()?;
        let sessions = db.all_sessions().await?;
        Ok::<_, StoreError>(History::from_sessions(sessions, today))
    })??;

    match action {
        StatsAction::Today => {
            let stats = history.stats();
            let view = serde_json::json!({
                "date": today,
                "work_sessions_today": stats.work_sessions_today,
                "work_sessions_this_week": stats.work_sessions_this_week,
                "streak_days": stats.streak_days,
            });
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        StatsAction::All => {
            println!("{}", serde_json::to_string_pretty(history.stats())?);
        }
        StatsAction::Sessions { limit } => {
            let rows: Vec<_> = history
                .sessions()
                .iter()
                .rev()
                .take(limit)
                .map(|session| {
                    serde_json::json!({
                        "id": session.id,
                        "kind": session.kind,
                        "completed": session.completed,
                        "started_at": session.started_at,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }
    Ok(())
}
