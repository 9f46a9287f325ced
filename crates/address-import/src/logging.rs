//! Structured JSON logging setup using tracing.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ImportConfig;

/// Initialize the tracing subscriber with JSON output.
///
/// `RUST_LOG` takes precedence over `filter` when set.
///
/// # Errors
///
/// Returns an error if the filter directive is invalid or a global subscriber
/// is already installed.
pub fn init_logging(filter: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter_layer = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(filter))?;

    let fmt_layer = fmt::layer()
        .json()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter_layer)
        .try_init()?;

    tracing::info!(filter = %filter, "Logging initialized");
    Ok(())
}

/// Initialize logging with the configured fallback filter.
///
/// # Errors
///
/// See [`init_logging`].
pub fn init_logging_from_config(
    config: &ImportConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_logging(&config.log_filter)
}

/// Initialize logging for tests (with simpler output).
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_test_logging_does_not_panic() {
        init_test_logging();
        init_test_logging();
    }

    #[test]
    fn test_invalid_filter_is_rejected() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        assert!(init_logging("address_import=notalevel").is_err());
    }

    #[test]
    fn test_config_filter_is_used() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let mut config = ImportConfig::new(crate::config::FeedCredentials::new("test-key"));
        config.log_filter = "address_import=notalevel".to_string();
        assert!(init_logging_from_config(&config).is_err());
    }
}
