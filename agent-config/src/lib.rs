//! Configuration management for the tool orchestration runtime.
//!
//! [`SecurityConfig`] is the surface shared by the guard and the sandbox;
//! [`LoggingConfig`] carries the explicit tracing toggle. Both are grouped in
//! [`ToolkitConfig`], which can be loaded from JSON or TOML documents.

#![warn(missing_docs, clippy::pedantic)]

pub mod loader;
pub mod logging;
pub mod security;

pub use loader::{ConfigError, ConfigResult, ToolkitConfig};
pub use logging::LoggingConfig;
pub use security::{
    DEFAULT_MAX_CONCURRENT_CALLS, DEFAULT_MAX_EXECUTION_TIME, DEFAULT_MAX_OUTPUT_SIZE,
    SecurityConfig,
};
