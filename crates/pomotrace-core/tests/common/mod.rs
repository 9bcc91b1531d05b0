//! Shared collaborators for the integration tests: a hand-cranked clock
//! and scripted probes, so every scenario is deterministic.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use pomotrace_core::{
    Clock, Event, FocusEngine, ForegroundApp, ForegroundProbe, ProbeError,
};

pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at(start: &str) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(start.parse().expect("valid RFC 3339 start")),
        })
    }

    pub fn advance(&self, secs: i64) {
        let mut now = self.now.lock().unwrap();
        *now += Duration::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

pub fn app(id: &str, name: &str) -> ForegroundApp {
    ForegroundApp::new(id, name)
}

/// Always reports the same app.
pub struct FixedProbe(pub ForegroundApp);

#[async_trait]
impl ForegroundProbe for FixedProbe {
    async fn foreground_app(&self) -> Result<ForegroundApp, ProbeError> {
        Ok(self.0.clone())
    }
}

/// Never sees anything.
pub struct FailingProbe;

#[async_trait]
impl ForegroundProbe for FailingProbe {
    async fn foreground_app(&self) -> Result<ForegroundApp, ProbeError> {
        Err(ProbeError::NoForegroundApp)
    }
}

/// Replays a scripted sequence of replies, where `None` is a probe
/// failure. Once the script runs out the last reply repeats.
pub struct ScriptedProbe {
    state: Mutex<ScriptState>,
}

struct ScriptState {
    replies: Vec<Option<ForegroundApp>>,
    next: usize,
}

impl ScriptedProbe {
    pub fn new(replies: Vec<Option<ForegroundApp>>) -> Arc<Self> {
        assert!(!replies.is_empty(), "script needs at least one reply");
        Arc::new(Self {
            state: Mutex::new(ScriptState { replies, next: 0 }),
        })
    }
}

#[async_trait]
impl ForegroundProbe for ScriptedProbe {
    async fn foreground_app(&self) -> Result<ForegroundApp, ProbeError> {
        let mut state = self.state.lock().unwrap();
        let index = state.next.min(state.replies.len() - 1);
        state.next += 1;
        match &state.replies[index] {
            Some(app) => Ok(app.clone()),
            None => Err(ProbeError::NoForegroundApp),
        }
    }
}

/// Drive the engine the way the CLI host does: advance the clock one
/// second, tick, then let the tracker sample if one is due. Returns every
/// event the ticks produced.
pub async fn host_ticks(
    engine: &mut FocusEngine,
    clock: &ManualClock,
    seconds: u64,
) -> Vec<Event> {
    let mut events = Vec::new();
    for _ in 0..seconds {
        clock.advance(1);
        if let Some(event) = engine.tick().await {
            events.push(event);
        }
        if engine.sample_due(clock.now()) {
            engine.sample().await;
        }
    }
    events
}
