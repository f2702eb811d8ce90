use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, EnvFilter,
};

/// Output format for structured logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines for local development
    Human,
    /// Newline-delimited JSON for log aggregation
    Json,
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence over `level` when set. This panics if a global subscriber is
/// already installed.
pub fn init_logging(format: LogFormat, level: &str) {
    if let Err(err) = try_init_logging(format, level) {
        panic!("failed to install tracing subscriber: {err}");
    }
}

/// Install the global tracing subscriber, failing if one is already installed
pub fn try_init_logging(format: LogFormat, level: &str) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Human => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).with_thread_ids(true))
            .try_init(),
    }
}
