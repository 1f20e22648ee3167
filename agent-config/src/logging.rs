//! Logging configuration.

use serde::{Deserialize, Serialize};

/// Explicit tracing toggle and filter directives.
///
/// Library code never inspects the process environment; whoever owns the
/// process decides whether a subscriber is installed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether a tracing subscriber should be installed at all.
    pub enabled: bool,
    /// `EnvFilter`-style directive string, e.g. `info,agent_tools=debug`.
    pub filter: String,
    /// Emit ANSI colour codes.
    pub ansi: bool,
    /// Include the event target (module path) in each line.
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            filter: "info".to_owned(),
            ansi: true,
            with_target: true,
        }
    }
}

impl LoggingConfig {
    /// Returns an enabled configuration using the supplied filter.
    #[must_use]
    pub fn enabled(filter: impl Into<String>) -> Self {
        Self {
            enabled: true,
            filter: filter.into(),
            ..Self::default()
        }
    }
}
