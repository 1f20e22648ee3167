//! Security event payloads.

use std::fmt::{self, Display, Formatter};

use agent_primitives::ExecutionId;
use serde::{Deserialize, Serialize};

/// Notification raised by the guard or the sandbox.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SecurityEvent {
    /// Parameters or arguments failed validation.
    ValidationFailed {
        /// Tool whose input was rejected.
        tool: String,
        /// Human-readable failure description.
        message: String,
    },
    /// A deny rule prevented the tool from running.
    ExecutionBlocked {
        /// Blocked tool.
        tool: String,
        /// Why the tool was blocked.
        reason: String,
    },
    /// Untrusted arguments carried prototype-pollution keys.
    PrototypePollution {
        /// Tool whose arguments were rejected.
        tool: String,
    },
    /// The sandbox was already running its maximum number of executions.
    ConcurrencyExceeded {
        /// Tool that was turned away.
        tool: String,
        /// Executions in flight when the call arrived.
        active: usize,
    },
    /// An execution exceeded its time budget.
    Timeout {
        /// Tool that timed out.
        tool: String,
        /// Budget that elapsed, in milliseconds.
        timeout_ms: u64,
    },
    /// A result exceeded the output size ceiling.
    OutputSizeExceeded {
        /// Tool that produced the result.
        tool: String,
        /// Estimated result size in bytes.
        size: usize,
        /// Configured ceiling in bytes.
        max_size: usize,
    },
    /// An execution was cancelled before settling.
    Cancelled {
        /// Identifier of the cancelled execution.
        execution_id: ExecutionId,
    },
}

/// Discriminant of [`SecurityEvent`], handy for filtering and assertions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SecurityEventKind {
    /// See [`SecurityEvent::ValidationFailed`].
    ValidationFailed,
    /// See [`SecurityEvent::ExecutionBlocked`].
    ExecutionBlocked,
    /// See [`SecurityEvent::PrototypePollution`].
    PrototypePollution,
    /// See [`SecurityEvent::ConcurrencyExceeded`].
    ConcurrencyExceeded,
    /// See [`SecurityEvent::Timeout`].
    Timeout,
    /// See [`SecurityEvent::OutputSizeExceeded`].
    OutputSizeExceeded,
    /// See [`SecurityEvent::Cancelled`].
    Cancelled,
}

impl SecurityEvent {
    /// Returns the event discriminant.
    #[must_use]
    pub const fn kind(&self) -> SecurityEventKind {
        match self {
            Self::ValidationFailed { .. } => SecurityEventKind::ValidationFailed,
            Self::ExecutionBlocked { .. } => SecurityEventKind::ExecutionBlocked,
            Self::PrototypePollution { .. } => SecurityEventKind::PrototypePollution,
            Self::ConcurrencyExceeded { .. } => SecurityEventKind::ConcurrencyExceeded,
            Self::Timeout { .. } => SecurityEventKind::Timeout,
            Self::OutputSizeExceeded { .. } => SecurityEventKind::OutputSizeExceeded,
            Self::Cancelled { .. } => SecurityEventKind::Cancelled,
        }
    }

    /// Returns the tool the event concerns, when known.
    #[must_use]
    pub fn tool(&self) -> Option<&str> {
        match self {
            Self::ValidationFailed { tool, .. }
            | Self::ExecutionBlocked { tool, .. }
            | Self::PrototypePollution { tool }
            | Self::ConcurrencyExceeded { tool, .. }
            | Self::Timeout { tool, .. }
            | Self::OutputSizeExceeded { tool, .. } => Some(tool),
            Self::Cancelled { .. } => None,
        }
    }
}

impl Display for SecurityEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed { tool, message } => {
                write!(f, "validation failed for `{tool}`: {message}")
            }
            Self::ExecutionBlocked { tool, reason } => {
                write!(f, "execution of `{tool}` blocked: {reason}")
            }
            Self::PrototypePollution { tool } => {
                write!(f, "prototype pollution attempt in arguments for `{tool}`")
            }
            Self::ConcurrencyExceeded { tool, active } => {
                write!(f, "`{tool}` rejected with {active} executions in flight")
            }
            Self::Timeout { tool, timeout_ms } => {
                write!(f, "`{tool}` timed out after {timeout_ms}ms")
            }
            Self::OutputSizeExceeded {
                tool,
                size,
                max_size,
            } => write!(f, "`{tool}` output of {size} bytes exceeds {max_size}"),
            Self::Cancelled { execution_id } => write!(f, "execution {execution_id} cancelled"),
        }
    }
}
