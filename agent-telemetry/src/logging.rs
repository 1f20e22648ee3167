//! Tracing subscriber bootstrap.

use agent_config::LoggingConfig;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Result alias for telemetry setup.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Errors raised while installing the tracing subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directive string could not be parsed.
    #[error("invalid log filter `{filter}`: {reason}")]
    InvalidFilter {
        /// Directive string from the configuration.
        filter: String,
        /// Parser message.
        reason: String,
    },
    /// A global subscriber was already installed.
    #[error("tracing subscriber already installed: {reason}")]
    AlreadyInstalled {
        /// Message from `tracing-subscriber`.
        reason: String,
    },
}

/// Installs a global fmt subscriber according to `config`.
///
/// Returns `Ok(false)` without touching global state when logging is
/// disabled, and `Ok(true)` once a subscriber has been installed. The filter
/// comes solely from the configuration; environment variables are ignored.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] for malformed directives and
/// [`TelemetryError::AlreadyInstalled`] when another subscriber owns the
/// global slot.
pub fn init_tracing(config: &LoggingConfig) -> TelemetryResult<bool> {
    if !config.enabled {
        return Ok(false);
    }

    let filter = EnvFilter::try_new(&config.filter).map_err(|err| TelemetryError::InvalidFilter {
        filter: config.filter.clone(),
        reason: err.to_string(),
    })?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.ansi)
        .with_target(config.with_target)
        .try_init()
        .map_err(|err| TelemetryError::AlreadyInstalled {
            reason: err.to_string(),
        })?;

    Ok(true)
}
