//! Bootstrap utilities for take-turns binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LOG_ENV_VAR;

/// Default filter when `TAKE_TURNS_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Build the log filter from `TAKE_TURNS_LOG`, falling back to "info".
pub fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Initialize tracing with the `TAKE_TURNS_LOG` environment variable.
///
/// Logs go to stderr so command output on stdout stays parseable.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
