//! Errors raised while parsing untrusted tool arguments.

use thiserror::Error;

/// Reasons untrusted argument text was rejected.
#[derive(Debug, Error)]
pub enum ArgumentError {
    /// The text is not valid JSON.
    #[error("Invalid JSON in tool arguments")]
    InvalidJson {
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },
    /// The text parsed to an array, `null`, or a scalar.
    #[error("Tool arguments must be a JSON object")]
    NotAnObject,
    /// The document carries prototype-pollution keys.
    #[error("Invalid tool arguments: potentially malicious content detected")]
    MaliciousContent,
}
