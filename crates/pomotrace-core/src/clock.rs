//! Wall-clock abstraction.
//!
//! The engine and tracker never call `Utc::now()` directly; they read time
//! through a [`Clock`] handed in at construction. Production code uses
//! [`SystemClock`], tests drive a manual clock forward explicitly.

use chrono::{DateTime, Utc};

/// Injected wall-clock source.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// System clock backed by `Utc::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
