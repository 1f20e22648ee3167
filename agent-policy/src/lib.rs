//! Policy gate evaluated before a tool is allowed to run.
//!
//! [`SecurityGuard`] combines deny/allow list membership, schema-based
//! parameter validation, and screening of untrusted JSON arguments.

#![warn(missing_docs, clippy::pedantic)]

pub mod arguments;
pub mod decision;
pub mod guard;
pub mod pollution;

pub use arguments::ArgumentError;
pub use decision::{AccessDecision, DenyRule};
pub use guard::{SecurityGuard, ValidationFailure};
pub use pollution::{DANGEROUS_KEYS, MAX_SCAN_DEPTH, contains_dangerous_keys};
