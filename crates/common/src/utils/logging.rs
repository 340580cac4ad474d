use std::io;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info,store=info";

fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Initialize tracing subscriber with compact human-readable output.
/// - Respects `RUST_LOG` if set
/// - Falls back to `info,store=info`
pub fn init_logging_default() {
    init_logging_compact(DEFAULT_FILTER);
}

/// Compact output with an explicit fallback filter (used when `RUST_LOG` is unset).
pub fn init_logging_compact(fallback: &str) {
    let _ = fmt()
        .with_env_filter(env_filter(fallback))
        .with_target(false)
        .compact()
        .with_writer(io::stderr)
        .try_init();
}

/// Initialize tracing subscriber with JSON structured output.
/// - Respects `RUST_LOG` if set, otherwise uses `fallback`
/// - Writes to stderr so stdout stays reserved for map contents
pub fn init_logging_json(fallback: &str) {
    let _ = fmt()
        .with_env_filter(env_filter(fallback))
        .with_target(true)
        .json()
        .with_writer(io::stderr)
        .try_init();
}
