//! Logging infrastructure built on the `tracing` ecosystem.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingSettings;

/// Initialize the global tracing subscriber.
///
/// Respects `RUST_LOG` when set, otherwise uses the configured filter.
/// Outputs to stderr. Should be called once at application startup.
pub fn init_tracing(settings: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.filter.clone()));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false);

    if settings.compact {
        tracing_subscriber::registry()
            .with(layer.compact())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry().with(layer).with(filter).init();
    }
}
