//! Log output setup.
//!
//! The library only emits `tracing` events. Test binaries that want to see
//! them call [`init_tracing`] once; later calls are no-ops.

use crate::result::{PageError, PageResult};
use tracing_subscriber::EnvFilter;

/// Filter variable read before `RUST_LOG`
pub const LOG_ENV: &str = "PAGEBIND_LOG";

/// Filter used when neither variable is set
pub const DEFAULT_FILTER: &str = "pagebind=info";

/// Output format of [`init_tracing`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Build the filter from `PAGEBIND_LOG`, then `RUST_LOG`, then the default
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install a global fmt subscriber.
///
/// Returns `Ok(false)` if a subscriber was already installed.
pub fn init_tracing(format: LogFormat) -> PageResult<bool> {
    if tracing::dispatcher::has_been_set() {
        return Ok(false);
    }
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .with_test_writer();
    let installed = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    match installed {
        Ok(()) => Ok(true),
        Err(e) => Err(PageError::Config {
            message: format!("cannot install log subscriber: {e}"),
        }),
    }
}
