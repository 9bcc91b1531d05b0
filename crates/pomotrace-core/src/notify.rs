use crate::session::Session;

/// Outbound notification hooks, fire-and-forget.
///
/// Delivery is a host concern. The engine invokes these at session start
/// and completion, logs failures at warn level, and never propagates them.
pub trait Notifier: Send + Sync {
    /// Called when a session starts (caller-issued or auto-started).
    fn on_session_start(&self, _session: &Session) -> Result<(), Box<dyn std::error::Error>> {
        Ok(()) // default no-op
    }

    /// Called when a session completes. Not called for stop/skip.
    fn on_session_complete(&self, _session: &Session) -> Result<(), Box<dyn std::error::Error>> {
        Ok(()) // default no-op
    }
}

/// Notifier that does nothing. For embedders that consume events instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {}
