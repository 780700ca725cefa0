use std::io;
use tracing_subscriber::{fmt, EnvFilter};

/// Default filter when neither `RUST_LOG` nor configuration provides one.
pub const DEFAULT_FILTER: &str = "info,service=info";

fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(fallback).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    })
}

/// Initialize the tracing subscriber once for the process.
/// - Respects `RUST_LOG` if set, otherwise uses `fallback_filter`
/// - `json` selects structured JSON lines instead of the compact format
/// - Writes to stderr so stdout stays free for command output
///
/// Calling it again is a no-op; the first subscriber stays installed.
pub fn init_logging(json: bool, fallback_filter: &str) {
    let filter = env_filter(fallback_filter);
    let builder = fmt().with_env_filter(filter).with_target(false).with_writer(io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
}

/// Compact human-readable output with [`DEFAULT_FILTER`].
pub fn init_logging_default() {
    init_logging(false, DEFAULT_FILTER);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        init_logging(true, "debug");
        init_logging_default();
        tracing::info!(event = "logger_test", "still logging");
    }

    #[test]
    fn invalid_fallback_filter_does_not_panic() {
        let _ = env_filter("not a [valid filter");
    }
}
