//! Observability: tracing init.
//!
//! Uses config::ObservabilityConfig for INTERPLAY_QUIET, INTERPLAY_LOG_LEVEL, INTERPLAY_LOG_JSON.
//! Logs always go to stderr so stdout stays free for artifacts and the stdio transport.

use tracing_subscriber::{prelude::*, EnvFilter};

/// Tracing initialization mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TracingMode {
    /// Default: use INTERPLAY_LOG_LEVEL / INTERPLAY_QUIET from env
    Default,
    /// Stdio host: the peer reads stdout, keep bridge chatter at warn unless RUST_LOG says otherwise
    Daemon,
}

/// Initialize tracing. Call at process startup; later calls are no-ops.
pub fn init_tracing(mode: TracingMode) {
    let cfg = crate::config::ObservabilityConfig::from_env();
    let level = filter_directive(mode, cfg.quiet, &cfg.log_level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let _ = if cfg.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .try_init()
    };
}

fn filter_directive(mode: TracingMode, quiet: bool, log_level: &str) -> String {
    let base = if quiet {
        "interplay=warn".to_string()
    } else {
        log_level.to_string()
    };
    match mode {
        TracingMode::Default => base,
        TracingMode::Daemon => format!("{},interplay_bridge=warn", base),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_overrides_level() {
        assert_eq!(
            filter_directive(TracingMode::Default, true, "interplay=debug"),
            "interplay=warn"
        );
    }

    #[test]
    fn test_daemon_mode_quiets_bridge() {
        assert_eq!(
            filter_directive(TracingMode::Daemon, false, "interplay=info"),
            "interplay=info,interplay_bridge=warn"
        );
    }
}
