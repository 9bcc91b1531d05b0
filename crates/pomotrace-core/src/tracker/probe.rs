use async_trait::async_trait;

use crate::error::ProbeError;
use crate::usage::ForegroundApp;

/// Reports the application currently holding input focus.
///
/// Implementations live in hosts (platform lookups) and tests (scripted
/// sequences). Failures are expected to be transient; the tracker counts
/// them and suspends its own sampling past the configured maximum.
#[async_trait]
pub trait ForegroundProbe: Send + Sync {
    async fn foreground_app(&self) -> Result<ForegroundApp, ProbeError>;
}
