//! Guard and sandbox configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default wall-clock budget for one tool execution.
pub const DEFAULT_MAX_EXECUTION_TIME: Duration = Duration::from_millis(30_000);
/// Default number of simultaneously running sandboxed executions.
pub const DEFAULT_MAX_CONCURRENT_CALLS: usize = 10;
/// Default output ceiling in estimated bytes (1 MiB).
pub const DEFAULT_MAX_OUTPUT_SIZE: usize = 1024 * 1024;

/// Configuration shared by the security guard and the execution sandbox.
///
/// Every field is optional when deserialising; missing fields take the
/// documented defaults. Clearing [`enabled`](Self::enabled) bypasses all
/// checks in both components.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Master switch for every guard and sandbox check.
    pub enabled: bool,
    /// Whether parameters are validated against tool schemas.
    pub validate_params: bool,
    /// Whether executions are wrapped with sandbox limits.
    pub sandbox_execution: bool,
    /// Wall-clock budget per execution, serialised in milliseconds.
    #[serde(with = "duration_ms")]
    pub max_execution_time: Duration,
    /// Ceiling on simultaneously running sandboxed executions.
    pub max_concurrent_calls: usize,
    /// Tools that are always rejected.
    pub denied_tools: Vec<String>,
    /// Optional whitelist; when present only listed tools may run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_tools: Option<Vec<String>>,
    /// Ceiling on the estimated size of a tool result, in bytes.
    pub max_output_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            validate_params: true,
            sandbox_execution: true,
            max_execution_time: DEFAULT_MAX_EXECUTION_TIME,
            max_concurrent_calls: DEFAULT_MAX_CONCURRENT_CALLS,
            denied_tools: Vec::new(),
            allowed_tools: None,
            max_output_size: DEFAULT_MAX_OUTPUT_SIZE,
        }
    }
}

impl SecurityConfig {
    /// Returns a configuration with every check switched off.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Toggles the master switch.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Toggles parameter validation.
    #[must_use]
    pub fn with_validate_params(mut self, validate: bool) -> Self {
        self.validate_params = validate;
        self
    }

    /// Toggles sandboxed execution.
    #[must_use]
    pub fn with_sandbox_execution(mut self, sandbox: bool) -> Self {
        self.sandbox_execution = sandbox;
        self
    }

    /// Sets the execution time budget.
    #[must_use]
    pub fn with_max_execution_time(mut self, timeout: Duration) -> Self {
        self.max_execution_time = timeout;
        self
    }

    /// Sets the concurrency ceiling.
    #[must_use]
    pub fn with_max_concurrent_calls(mut self, limit: usize) -> Self {
        self.max_concurrent_calls = limit;
        self
    }

    /// Sets the output size ceiling.
    #[must_use]
    pub fn with_max_output_size(mut self, bytes: usize) -> Self {
        self.max_output_size = bytes;
        self
    }

    /// Replaces the deny list.
    #[must_use]
    pub fn with_denied_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.denied_tools = tools.into_iter().map(Into::into).collect();
        self
    }

    /// Installs a whitelist.
    #[must_use]
    pub fn with_allowed_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_tools = Some(tools.into_iter().map(Into::into).collect());
        self
    }

    /// Returns `true` when `name` is on the deny list.
    #[must_use]
    pub fn is_denied(&self, name: &str) -> bool {
        self.denied_tools.iter().any(|tool| tool == name)
    }

    /// Returns `true` when a whitelist is configured and omits `name`.
    #[must_use]
    pub fn is_outside_allowlist(&self, name: &str) -> bool {
        self.allowed_tools
            .as_ref()
            .is_some_and(|allowed| !allowed.iter().any(|tool| tool == name))
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
