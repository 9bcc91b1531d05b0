//! Core error types for pomotrace-core.
//!
//! One umbrella enum plus per-domain enums, all thiserror-derived. The
//! fallible collaborators (probe, store) get their own error types so hosts
//! can implement those traits without pulling in the umbrella.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for pomotrace-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Timer command rejected by the state machine
    #[error("Timer error: {0}")]
    Timer(#[from] TimerError),

    /// Foreground probe failure
    #[error("Probe error: {0}")]
    Probe(#[from] ProbeError),

    /// Persisted store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Command rejections from the session timer state machine.
///
/// These are synchronous validation failures: the caller fixes the call
/// site, nothing is retried.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// A session is already running or paused
    #[error("a session is already active")]
    SessionAlreadyActive,

    /// The command needs an active session and there is none
    #[error("no active session")]
    NoActiveSession,
}

/// Foreground probe failures.
///
/// Transient by contract. The tracker counts consecutive failures and
/// suspends its own sampling once they reach the configured maximum.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// No application currently holds input focus
    #[error("no foreground application detected")]
    NoForegroundApp,

    /// The platform backend is missing or not usable
    #[error("probe backend unavailable: {0}")]
    Unavailable(String),

    /// The query itself failed
    #[error("probe query failed: {0}")]
    QueryFailed(String),
}

/// Persisted snapshot store failures.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// The backing database is locked
    #[error("Store is locked")]
    Locked,

    /// The worker thread is gone or unreachable
    #[error("Store worker unavailable: {0}")]
    WorkerUnavailable(String),

    /// A stored value did not decode
    #[error("Malformed stored value: {0}")]
    Malformed(String),

    /// Filesystem problem around the store file
    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The data directory could not be located or created
    #[error("Data directory unavailable: {0}")]
    DirUnavailable(#[from] std::io::Error),

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

// Helper implementations for converting from other error types

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for CoreError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        CoreError::Custom(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
