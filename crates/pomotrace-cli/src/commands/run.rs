use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use pomotrace_core::{
    Clock, Config, Database, Event, FocusEngine, History, SessionType, SnapshotStore, SystemClock,
    TaskMeta, TimerPhase, TrackerSettings, UsageTracker,
};
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::probe::probe_from_env;

#[derive(Args)]
pub struct RunArgs {
    /// Start a session of this kind immediately
    #[arg(long, value_enum)]
    pub kind: Option<KindArg>,

    /// Task to attach to the started session
    #[arg(long, requires = "kind")]
    pub task_id: Option<String>,

    /// Task title
    #[arg(long, requires = "task_id")]
    pub title: Option<String>,
}

#[derive(Clone, Copy, clap::ValueEnum)]
pub enum KindArg {
    Work,
    ShortBreak,
    LongBreak,
}

impl From<KindArg> for SessionType {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Work => SessionType::Work,
            KindArg::ShortBreak => SessionType::ShortBreak,
            KindArg::LongBreak => SessionType::LongBreak,
        }
    }
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    super::block_on(host(args))?
}

/// Live engine host: builds the collaborators, resumes any persisted
/// tracking run, then drives the engine at 1 Hz until Ctrl-C. Engine events
/// go to stdout as JSON lines; finished sessions land in the database.
async fn host(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = super::open_database()?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store: Arc<dyn SnapshotStore> = Arc::new(db.clone());

    let tracker = UsageTracker::restore(
        clock.clone(),
        probe_from_env(),
        store,
        TrackerSettings::from(&config.tracking),
    )
    .await;
    if tracker.is_tracking() {
        debug!("resumed a tracking run from a previous host");
    }

    let history = History::from_sessions(db.all_sessions().await?, clock.now().date_naive());
    let mut engine = FocusEngine::new(config, clock.clone(), tracker).with_history(history);

    if let Some(kind) = args.kind {
        let task = args.task_id.map(|task_id| TaskMeta {
            task_id,
            title: args.title.unwrap_or_default(),
        });
        let event = engine.start(kind.into(), task).await?;
        emit(&event)?;
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick fires immediately; consume it so a session is not a
    // second short.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Some(event) = engine.tick().await {
                    record(&db, &event).await;
                    emit(&event)?;
                }
                if engine.sample_due(clock.now()) {
                    engine.sample().await;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupt received, shutting down");
                if matches!(engine.phase(), TimerPhase::Running | TimerPhase::Paused) {
                    match engine.stop().await {
                        Ok(event) => {
                            record(&db, &event).await;
                            emit(&event)?;
                        }
                        Err(e) => warn!("stop on shutdown failed: {e}"),
                    }
                }
                break;
            }
        }
    }
    Ok(())
}

async fn record(db: &Database, event: &Event) {
    if let Some(session) = event.finished_session() {
        if let Err(e) = db.record_session(session).await {
            warn!("failed to record session {}: {e}", session.id);
        }
    }
}

fn emit(event: &Event) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}
