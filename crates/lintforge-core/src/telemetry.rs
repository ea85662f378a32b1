//! Tracing setup for the lintforge binary.
//!
//! Logs go to stderr. Stdout belongs to the custom executable, whose report
//! is the tool's real output.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    /// Newline-delimited JSON
    Json,
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `level` when set. Only the first call in a process
/// has any effect.
pub fn init_tracing(format: LogFormat, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = match format {
        LogFormat::Pretty => registry.with(layer).try_init(),
        LogFormat::Json => registry.with(layer.json()).try_init(),
    };
    installed.ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice_is_harmless() {
        init_tracing(LogFormat::Pretty, Level::INFO);
        init_tracing(LogFormat::Json, Level::DEBUG);
        tracing::info!("still logging");
    }
}
