//! Process-wide `tracing` subscriber setup.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{config::LoggingConfig, error::TernError};

/// Build the filter used by [`init`].
///
/// `RUST_LOG` wins when set; otherwise the configured level applies to the
/// Tern crates and `warn` to everything else.
pub fn filter_for(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,tern_core={level},tern_xmpp={level}",
            level = config.level
        ))
    })
}

/// Install the global subscriber.
///
/// Fails with [`TernError::Logging`] if a global subscriber is already set.
pub fn init(config: &LoggingConfig) -> Result<(), TernError> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(filter_for(config))
        .with(fmt_layer)
        .try_init()
        .map_err(|e| TernError::Logging(e.to_string()))?;

    tracing::debug!(level = %config.level, "logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_reports_logging_error() {
        let config = LoggingConfig {
            level: "debug".to_string(),
        };
        // The first call may race with other tests installing a subscriber;
        // either way the second call must fail.
        let _ = init(&config);
        let err = init(&config).unwrap_err();
        assert!(matches!(err, TernError::Logging(_)));
    }

    #[test]
    fn filter_mentions_configured_level() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let filter = filter_for(&LoggingConfig {
            level: "trace".to_string(),
        });
        assert!(filter.to_string().contains("tern_xmpp=trace"));
    }
}
