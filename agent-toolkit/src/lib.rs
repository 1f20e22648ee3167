//! Guarded, sandboxed tool orchestration for agent workflows.
//!
//! Depend on this crate via `cargo add agent-toolkit`. It bundles the
//! internal crates behind feature flags so downstream users can enable or
//! disable components as needed.
//!
//! A typical setup loads a [`config::ToolkitConfig`], installs tracing with
//! [`telemetry::init_tracing`], and builds a [`tools::ToolRegistry`] with a
//! [`policy::SecurityGuard`] and a [`tools::ToolSandbox`] sharing the same
//! security settings.

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared primitives for convenience.
pub use agent_primitives as primitives;

/// Tool registry and sandbox (enabled by `tools` feature).
#[cfg(feature = "tools")]
pub use agent_tools as tools;

/// Guard policy (enabled by `policy` feature).
#[cfg(feature = "policy")]
pub use agent_policy as policy;

/// Security events and tracing setup (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use agent_telemetry as telemetry;

/// Configuration management (enabled by `config` feature).
#[cfg(feature = "config")]
pub use agent_config as config;
