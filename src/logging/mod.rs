use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Installs the global subscriber with `info` as the default level.
pub fn init_logging() {
    init_logging_with_level("info");
}

/// Installs the global subscriber. `RUST_LOG` wins over `default_level`.
///
/// Only the first call in a process takes effect.
pub fn init_logging_with_level(default_level: &str) {
    let filter: EnvFilter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let formatting_layer = fmt::layer()
        .with_timer(UtcTime::rfc_3339())
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_target(true)
        .compact();

    let subscriber = Registry::default().with(filter).with(formatting_layer);

    // A subscriber installed earlier (tests, embedding apps) stays in place.
    let _ = tracing::subscriber::set_global_default(subscriber);
}
