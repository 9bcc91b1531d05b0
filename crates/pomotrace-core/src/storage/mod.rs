mod config;
pub mod database;

pub use config::{Config, DurationsConfig, TimerConfig, TrackingConfig};
pub use database::Database;

use std::path::PathBuf;

/// Returns `~/.config/pomotrace[-dev]/` based on POMOTRACE_ENV.
///
/// Set POMOTRACE_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("POMOTRACE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("pomotrace-dev")
    } else {
        base_dir.join("pomotrace")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
