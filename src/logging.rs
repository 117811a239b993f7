//! Log subscriber setup for the binary.

use crate::config::LoggingConfig;
use std::env;
use tracing_subscriber::EnvFilter;

/// Install a stderr fmt subscriber.
///
/// Filter precedence: `STINT_LOG` (EnvFilter syntax), then `STINT_DEBUG_LOG`
/// set to a truthy value, then the configured level. Safe to call more than
/// once; later calls are no-ops.
pub fn init(config: &LoggingConfig) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter_for(config))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn filter_for(config: &LoggingConfig) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_env("STINT_LOG") {
        return filter;
    }

    let debug_enabled = env::var("STINT_DEBUG_LOG")
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    if debug_enabled {
        return EnvFilter::new("debug");
    }

    EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("warn"))
}
