//! Logging subscriber setup
//!
//! Layers a fmt layer (text or JSON) over an `EnvFilter`. `RUST_LOG` wins
//! over the level passed on the command line.
//!
//! ```text
//! Registry
//!   ├── EnvFilter (RUST_LOG, else --log-level)
//!   └── Fmt Layer (stderr, text or json)
//! ```

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

/// Errors that can occur during subscriber initialization
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter '{0}'")]
    InvalidFilter(String),

    #[error("Failed to set global subscriber (may already be initialized): {0}")]
    AlreadyInitialized(String),
}

/// Console output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Build the filter from `RUST_LOG`, falling back to `default_level`
pub fn env_filter(default_level: &str) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_level.to_lowercase())
            .map_err(|_| TelemetryError::InvalidFilter(default_level.to_string())),
    }
}

/// Install the global subscriber
pub fn init_subscriber(default_level: &str, format: LogFormat) -> Result<(), TelemetryError> {
    let env_filter = env_filter(default_level)?;

    let result = match format {
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_writer(std::io::stderr);
            let subscriber = tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer);
            tracing::subscriber::set_global_default(subscriber)
        }
        LogFormat::Text => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true)
                .with_writer(std::io::stderr);
            let subscriber = tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt_layer);
            tracing::subscriber::set_global_default(subscriber)
        }
    };

    result.map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_accepts_levels() {
        for level in ["trace", "DEBUG", "info", "warn", "error"] {
            assert!(env_filter(level).is_ok(), "level {} should parse", level);
        }
    }

    #[test]
    fn test_subscriber_init_twice() {
        let first = init_subscriber("info", LogFormat::Text);
        // May fail if another test already installed a subscriber
        let _ = first;
        let second = init_subscriber("info", LogFormat::Json);
        assert!(matches!(
            second,
            Err(TelemetryError::AlreadyInitialized(_))
        ));
    }
}
