//! Logging and observability
//!
//! Structured console logging built on `tracing`. Pipeline stages emit
//! debug/info events (claim numbers, segment counts, report tallies);
//! semantic outcomes always travel through reports, never through the
//! log.
//!
//! # Example
//!
//! ```no_run
//! kaizen::logging::init_logging("info").expect("Failed to initialize logging");
//! tracing::info!("starting conversion");
//! ```

use crate::domain::{KaizenError, Result};
use tracing_subscriber::EnvFilter;

/// Initializes console logging at the given level
///
/// The `RUST_LOG` environment variable overrides `level` when set.
/// Calling this twice returns an error from the subscriber registry.
pub fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| KaizenError::Configuration(format!("Invalid log level '{level}': {e}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| KaizenError::Configuration(format!("Failed to initialize logging: {e}")))?;

    Ok(())
}
