//! Wires configuration, tracing, guard, sandbox and registry around a few
//! small tools, then prints usage statistics and the provider exports.

use std::sync::Arc;
use std::time::Duration;

use agent_toolkit::config::{LoggingConfig, ToolkitConfig};
use agent_toolkit::policy::SecurityGuard;
use agent_toolkit::primitives::{ParameterSchema, PropertySchema};
use agent_toolkit::telemetry::init_tracing;
use agent_toolkit::tools::{CostTier, ToolCall, ToolDefinition, ToolExample, ToolRegistry, ToolSandbox};
use anyhow::Result;
use serde_json::json;
use tracing::info;

const CONFIG: &str = r#"
[security]
max_execution_time = 200
max_concurrent_calls = 4
denied_tools = ["shell"]
"#;

#[tokio::main]
async fn main() -> Result<()> {
    let mut config = ToolkitConfig::from_toml_str(CONFIG)?;
    config.logging = LoggingConfig::enabled("info,agent_tools=debug");
    config.validate()?;
    init_tracing(&config.logging)?;

    info!("=== Tool orchestration demo ===");

    let registry = build_registry(&config)?;

    // Example 1: direct calls
    direct_calls(&registry).await;

    // Example 2: untrusted argument text
    untrusted_arguments(&registry).await;

    // Example 3: batch with failures
    batch(&registry).await;

    for usage in registry.most_used(3) {
        info!(
            tool = %usage.name,
            calls = usage.calls,
            failures = usage.failures,
            success_rate = usage.success_rate(),
            "usage"
        );
    }
    info!("openai export: {}", serde_json::to_string_pretty(&registry.to_openai_format())?);

    Ok(())
}

fn build_registry(config: &ToolkitConfig) -> Result<ToolRegistry> {
    let guard = SecurityGuard::new(config.security.clone());
    let sandbox = ToolSandbox::new(config.security.clone()).with_allowed_operations(["read"]);
    let registry = ToolRegistry::new()
        .with_guard(Arc::new(guard))
        .with_sandbox(Arc::new(sandbox));

    registry.register(
        ToolDefinition::from_fn(
            "echo",
            "Echo the value parameter",
            ParameterSchema::new()
                .with_required_property("value", PropertySchema::string("Text to echo")),
            |params, _| async move { Ok(params["value"].clone()) },
        )
        .with_category("utility")
        .with_example(ToolExample::new("Say hello", json!({ "value": "hello" })))
        .with_parameter_validation(),
    )?;

    registry.register(
        ToolDefinition::from_fn(
            "slow",
            "Takes longer than the time budget",
            ParameterSchema::new(),
            |_, _| async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok(json!("too late"))
            },
        )
        .with_cost(CostTier::Expensive),
    )?;

    registry.register(ToolDefinition::from_fn(
        "shell",
        "Runs a command",
        ParameterSchema::new().with_required_property("cmd", PropertySchema::string("Command")),
        |_, _| async { Ok(json!("never runs")) },
    ))?;

    Ok(registry)
}

/// Example 1: successful and rejected direct calls
async fn direct_calls(registry: &ToolRegistry) {
    info!("--- Example 1: direct calls ---");
    for (name, params) in [
        ("echo", json!({ "value": "hello" })),
        ("echo", json!({})),
        ("slow", json!({})),
        ("shell", json!({ "cmd": "ls" })),
    ] {
        match registry.execute(name, params).await {
            Ok(value) => info!(tool = name, %value, "ok"),
            Err(err) => info!(tool = name, kind = ?err.kind(), "rejected: {err}"),
        }
    }
}

/// Example 2: JSON text as produced by a model
async fn untrusted_arguments(registry: &ToolRegistry) {
    info!("--- Example 2: untrusted arguments ---");
    for text in [r#"{"value":"from a model"}"#, r#"{"__proto__":{"admin":true}}"#, "not json"] {
        match registry.execute_from_json("echo", text).await {
            Ok(value) => info!(%value, "ok"),
            Err(err) => info!("rejected: {err}"),
        }
    }
}

/// Example 3: a batch keeps going past failures
async fn batch(registry: &ToolRegistry) {
    info!("--- Example 3: batch ---");
    let results = registry
        .execute_batch([
            ToolCall::new("echo", json!({ "value": "a" })),
            ToolCall::new("missing", json!({})),
            ToolCall::new("echo", json!({ "value": "b" })),
        ])
        .await;
    for (index, result) in results.iter().enumerate() {
        match result {
            Ok(value) => info!(index, %value, "ok"),
            Err(err) => info!(index, "failed: {err}"),
        }
    }
}
