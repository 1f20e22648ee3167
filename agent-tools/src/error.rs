//! Errors produced by tool registration and execution.

use agent_policy::{ArgumentError, ValidationFailure};
use agent_primitives::ExecutionId;
use thiserror::Error;

/// Result alias for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Errors produced by tool registration and invocation.
///
/// Messages carry stable substrings so callers can classify failures, and
/// [`ToolError::kind`] offers the same classification without string
/// matching.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Tool definition failed static validation.
    #[error("invalid tool definition `{name}`: {reason}")]
    InvalidDefinition {
        /// Name of the offending tool (may be blank).
        name: String,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Requested tool does not exist.
    #[error("Tool not found: {name}")]
    NotFound {
        /// Name of the missing tool.
        name: String,
    },

    /// Guard policy rejected the tool.
    #[error("Tool `{name}` is not allowed: {reason}")]
    NotAllowed {
        /// Name of the rejected tool.
        name: String,
        /// Rule that rejected it.
        reason: &'static str,
    },

    /// Parameters failed schema validation.
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    /// Untrusted argument text could not be accepted.
    #[error("{source}")]
    InvalidArguments {
        /// Tool the arguments were produced for.
        tool: String,
        /// Parse or screening failure.
        #[source]
        source: ArgumentError,
    },

    /// The sandbox is already running its maximum number of executions.
    #[error("Too many concurrent tool executions ({active} active, limit {limit})")]
    ConcurrencyLimit {
        /// Executions in flight when the call arrived.
        active: usize,
        /// Configured ceiling.
        limit: usize,
    },

    /// A caller-supplied execution id is already in flight.
    #[error("execution {execution_id} is already active")]
    DuplicateExecution {
        /// Conflicting identifier.
        execution_id: ExecutionId,
    },

    /// The execution exceeded its time budget.
    #[error("Tool execution timed out after {timeout_ms}ms")]
    Timeout {
        /// Budget that elapsed, in milliseconds.
        timeout_ms: u64,
    },

    /// The execution was cancelled before it settled.
    #[error("Tool execution was cancelled")]
    Cancelled {
        /// Identifier of the cancelled execution.
        execution_id: ExecutionId,
    },

    /// The result exceeded the output size ceiling and was discarded.
    #[error("Tool output exceeded maximum size limit ({size} > {max_size} bytes)")]
    OutputTooLarge {
        /// Estimated size of the discarded result.
        size: usize,
        /// Configured ceiling.
        max_size: usize,
    },

    /// Tool execution failed.
    #[error("tool execution failed: {reason}")]
    Execution {
        /// Human-readable error returned by the tool implementation.
        reason: String,
    },
}

/// Coarse classification of [`ToolError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolErrorKind {
    /// Malformed definition at registration.
    InvalidDefinition,
    /// Unknown tool name.
    NotFound,
    /// Deny/allow list rejection.
    NotAllowed,
    /// Schema or argument rejection.
    Validation,
    /// Concurrency, timeout, or output-size ceiling.
    ResourceLimit,
    /// Explicit cancellation.
    Cancelled,
    /// Failure raised by the tool itself.
    Execution,
}

impl ToolError {
    /// Creates an execution error from the supplied reason.
    #[must_use]
    pub fn execution(reason: impl Into<String>) -> Self {
        Self::Execution {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_definition(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            name: name.to_owned(),
            reason: reason.into(),
        }
    }

    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ToolErrorKind {
        match self {
            Self::InvalidDefinition { .. } => ToolErrorKind::InvalidDefinition,
            Self::NotFound { .. } => ToolErrorKind::NotFound,
            Self::NotAllowed { .. } => ToolErrorKind::NotAllowed,
            Self::Validation(_) | Self::InvalidArguments { .. } => ToolErrorKind::Validation,
            Self::ConcurrencyLimit { .. } | Self::Timeout { .. } | Self::OutputTooLarge { .. } => {
                ToolErrorKind::ResourceLimit
            }
            Self::Cancelled { .. } => ToolErrorKind::Cancelled,
            Self::Execution { .. } | Self::DuplicateExecution { .. } => ToolErrorKind::Execution,
        }
    }

    /// Returns true for concurrency, timeout, and output-size failures.
    #[must_use]
    pub const fn is_resource_limit(&self) -> bool {
        matches!(self.kind(), ToolErrorKind::ResourceLimit)
    }
}
