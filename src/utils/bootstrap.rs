//! Bootstrap utilities for the resolver binary.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LOG_ENV_VAR, LOG_FORMAT_ENV_VAR};

/// Build the log filter from `DATAPOINTS_LOG`, defaulting to "info".
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Whether `DATAPOINTS_LOG_FORMAT` asks for JSON lines.
pub fn json_logs() -> bool {
    std::env::var(LOG_FORMAT_ENV_VAR)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Initialize tracing.
///
/// Output goes to stdout without ANSI colors so CloudWatch keeps it
/// readable. Set `DATAPOINTS_LOG_FORMAT=json` for structured lines.
pub fn init_tracing() {
    let registry = tracing_subscriber::registry().with(env_filter());

    if json_logs() {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_target(false),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_ansi(false))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn test_json_logs_flag() {
        std::env::remove_var(LOG_FORMAT_ENV_VAR);
        assert!(!json_logs());

        std::env::set_var(LOG_FORMAT_ENV_VAR, "JSON");
        assert!(json_logs());

        std::env::set_var(LOG_FORMAT_ENV_VAR, "text");
        assert!(!json_logs());

        std::env::remove_var(LOG_FORMAT_ENV_VAR);
    }

    #[test]
    #[serial]
    fn test_env_filter_default() {
        std::env::remove_var(LOG_ENV_VAR);
        assert_eq!(env_filter().to_string(), "info");
    }
}
