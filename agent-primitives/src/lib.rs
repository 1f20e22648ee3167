//! Core shared types for agent tool orchestration.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod ids;
mod schema;

/// Error type and result alias shared across the SDK.
pub use error::{Error, Result};
/// Unique identifier for a single sandboxed tool run.
pub use ids::ExecutionId;
/// Parameter shapes and the validation seam used by the guard.
pub use schema::{ParameterSchema, PropertySchema, PropertyType, Schema, Violation};
