//! Shared error definitions for agent primitives.

use thiserror::Error;
use uuid::Error as UuidError;

/// Result alias used throughout the toolkit primitives.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while manipulating primitive types.
#[derive(Debug, Error)]
pub enum Error {
    /// The provided execution identifier could not be parsed.
    #[error("invalid execution id: {source}")]
    InvalidExecutionId {
        /// Source parsing error from the UUID library.
        #[from]
        source: UuidError,
    },

    /// Parameter schema failed structural validation.
    #[error("invalid parameter schema: {reason}")]
    InvalidSchema {
        /// Human-readable reason for rejection.
        reason: String,
    },
}

impl Error {
    pub(crate) fn schema(reason: impl Into<String>) -> Self {
        Self::InvalidSchema {
            reason: reason.into(),
        }
    }
}
