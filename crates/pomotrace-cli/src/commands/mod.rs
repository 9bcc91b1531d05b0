pub mod config;
pub mod probe;
pub mod run;
pub mod stats;
pub mod status;
pub mod usage;

use pomotrace_core::storage::data_dir;
use pomotrace_core::{Database, StoreError};

/// Commands are synchronous at the clap boundary; each one that needs the
/// database or the probe hosts its own single-threaded runtime.
pub(crate) fn block_on<F: std::future::Future>(future: F) -> Result<F::Output, std::io::Error> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(future))
}

/// Open the shared database under the data directory.
pub(crate) fn open_database() -> Result<Database, StoreError> {
    let dir = data_dir()?;
    Database::open(dir.join("pomotrace.db"))
}
