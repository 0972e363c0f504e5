//! Log output setup for the binary

use tracing::debug;

use crate::config::LoggingConfig;

/// Installs a stderr subscriber at the configured level
///
/// Unknown level names fall back to `info`. Stdout is left for command output.
pub fn init_logging(config: &LoggingConfig) {
    let log_level = config.level.parse().unwrap_or(tracing::Level::INFO);

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .with_max_level(log_level)
        .with_ansi(false)
        .init();

    debug!("Logging initialized at level: {}", config.level);
}
