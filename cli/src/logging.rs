//! Tracing / logging initialisation for the CLI.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging options resolved from the command line.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter directives, e.g. "info" or "info,attestindex_source=debug".
    pub level: String,
    /// Emit JSON structured logs (true) or human-readable text (false).
    pub json: bool,
}

/// Initialise tracing with the given log config.
/// Should be called once at application startup.
pub fn init_tracing(config: &LogConfig) {
    let filter =
        EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}
