//! Subscriber setup for hosts.
//!
//! The filter comes from `CHATDECK_LOG` (same syntax as `RUST_LOG`) and
//! defaults to `info`. Both initialisers are no-ops once a global
//! subscriber exists, so tests may call them repeatedly.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "CHATDECK_LOG";
const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Human-readable output on stderr. Returns `false` if a subscriber was
/// already installed.
pub fn init() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

/// One JSON object per event on stderr.
pub fn init_json() -> bool {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
