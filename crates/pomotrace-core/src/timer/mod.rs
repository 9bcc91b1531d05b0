//! Session timer state machine.
//!
//! [`FocusEngine`] owns the single active session: the six lifecycle
//! commands, the work/break cadence, and starting/stopping the usage
//! tracker in lock-step with work sessions. The host supplies the 1-second
//! heartbeat by calling [`FocusEngine::tick`].

mod engine;

pub use engine::{
    DurationAdvisor, FocusEngine, TimerPhase, TimerSnapshot, AUTO_START_DELAY_SECS,
};
