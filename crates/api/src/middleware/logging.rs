//! Logging initialization.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::LoggingConfig;

/// Initializes the tracing subscriber from configuration.
///
/// `RUST_LOG` wins over the configured level when set. The configured
/// format selects the output layer: `pretty` or `compact` for local
/// development, anything else (the default) emits structured JSON for
/// log aggregation.
pub fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter);

    match config.format.as_str() {
        "pretty" => {
            registry
                .with(fmt::layer().pretty().with_target(true))
                .init();
        }
        "compact" => {
            registry
                .with(fmt::layer().compact().with_target(false))
                .init();
        }
        _ => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_span_events(FmtSpan::CLOSE)
                        .with_current_span(true)
                        .with_target(true),
                )
                .init();
        }
    }
}
