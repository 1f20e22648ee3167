//! Tool registration, sandboxed execution, and usage accounting.
//!
//! [`ToolRegistry`](registry::ToolRegistry) is the caller-facing surface: it
//! stores [`ToolDefinition`](tool::ToolDefinition)s, runs calls through an
//! optional [`SecurityGuard`](agent_policy::SecurityGuard) and an optional
//! [`ToolSandbox`](sandbox::ToolSandbox), and keeps per-tool usage counters.

#![warn(missing_docs, clippy::pedantic)]

pub mod context;
pub mod error;
pub mod export;
pub mod registry;
pub mod sandbox;
pub mod stats;
pub mod tool;

pub use context::{ExecutionContext, SandboxContext};
pub use error::{ToolError, ToolErrorKind, ToolResult};
pub use export::{AnthropicTool, OpenAiFunction, OpenAiTool};
pub use registry::{ToolCall, ToolRegistry};
pub use sandbox::{ExecutionHooks, ExecutionOptions, ToolSandbox, estimate_output_size};
pub use stats::UsageStats;
pub use tool::{CostTier, Tool, ToolDefinition, ToolExample};
