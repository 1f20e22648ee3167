//! Runtime registry for tool definitions and execution.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use agent_policy::{ArgumentError, SecurityGuard};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::context::ExecutionContext;
use crate::error::{ToolError, ToolResult};
use crate::export::{AnthropicTool, OpenAiTool};
use crate::sandbox::{ExecutionOptions, ToolSandbox};
use crate::stats::{UsageCounters, UsageStats};
use crate::tool::ToolDefinition;

/// One entry of a batch submitted to [`ToolRegistry::execute_batch`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool to invoke.
    pub name: String,
    /// Parameters passed to the tool.
    #[serde(default)]
    pub params: Value,
}

impl ToolCall {
    /// Creates a call of `name` with `params`.
    #[must_use]
    pub fn new(name: impl Into<String>, params: Value) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }
}

struct Entry {
    definition: Arc<ToolDefinition>,
    usage: UsageCounters,
}

#[derive(Default)]
struct Tools {
    entries: HashMap<String, Entry>,
    order: Vec<String>,
}

impl Tools {
    fn ordered(&self) -> impl Iterator<Item = &Entry> {
        self.order.iter().filter_map(|name| self.entries.get(name))
    }
}

/// Registry that stores tool definitions keyed by name and runs them.
///
/// Calls pass through the optional [`SecurityGuard`] (allow/deny lists and
/// parameter validation) and the optional [`ToolSandbox`] (time, concurrency
/// and output limits). Every call that reaches a registered tool is counted
/// in its [`UsageStats`].
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<Tools>,
    context: RwLock<ExecutionContext>,
    guard: RwLock<Option<Arc<SecurityGuard>>>,
    sandbox: RwLock<Option<Arc<ToolSandbox>>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("registered", &self.names())
            .field("guard_configured", &self.guard().is_some())
            .field("sandbox_configured", &self.sandbox().is_some())
            .finish_non_exhaustive()
    }
}

impl ToolRegistry {
    /// Creates an empty registry with no guard and no sandbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a guard.
    #[must_use]
    pub fn with_guard(self, guard: Arc<SecurityGuard>) -> Self {
        self.set_guard(Some(guard));
        self
    }

    /// Attaches a sandbox.
    #[must_use]
    pub fn with_sandbox(self, sandbox: Arc<ToolSandbox>) -> Self {
        self.set_sandbox(Some(sandbox));
        self
    }

    /// Replaces or removes the guard.
    pub fn set_guard(&self, guard: Option<Arc<SecurityGuard>>) {
        *self.guard.write().unwrap_or_else(PoisonError::into_inner) = guard;
    }

    /// Replaces or removes the sandbox.
    pub fn set_sandbox(&self, sandbox: Option<Arc<ToolSandbox>>) {
        *self.sandbox.write().unwrap_or_else(PoisonError::into_inner) = sandbox;
    }

    /// Returns the guard, if attached.
    #[must_use]
    pub fn guard(&self) -> Option<Arc<SecurityGuard>> {
        self.guard
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the sandbox, if attached.
    #[must_use]
    pub fn sandbox(&self) -> Option<Arc<ToolSandbox>> {
        self.sandbox
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Registers a tool definition.
    ///
    /// Registering a name that already exists replaces the previous
    /// definition in place and resets its usage counters.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidDefinition`] when the name or description
    /// is blank or the parameter schema is malformed.
    pub fn register(&self, definition: ToolDefinition) -> ToolResult<()> {
        definition.check()?;

        let name = definition.name().to_owned();
        let entry = Entry {
            definition: Arc::new(definition),
            usage: UsageCounters::default(),
        };

        let mut tools = self.tools.write().unwrap_or_else(PoisonError::into_inner);
        if tools.entries.insert(name.clone(), entry).is_some() {
            warn!(tool = %name, "tool re-registered, previous definition replaced");
        } else {
            tools.order.push(name.clone());
            info!(tool = %name, "tool registered");
        }

        Ok(())
    }

    /// Removes a tool and its usage counters.
    ///
    /// Returns `false` when the name was not registered.
    pub fn unregister(&self, name: &str) -> bool {
        let mut tools = self.tools.write().unwrap_or_else(PoisonError::into_inner);
        if tools.entries.remove(name).is_none() {
            return false;
        }
        tools.order.retain(|registered| registered != name);
        debug!(tool = name, "tool unregistered");
        true
    }

    /// Removes every tool.
    pub fn clear(&self) {
        let mut tools = self.tools.write().unwrap_or_else(PoisonError::into_inner);
        tools.entries.clear();
        tools.order.clear();
    }

    /// Returns the definition registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<ToolDefinition>> {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .get(name)
            .map(|entry| Arc::clone(&entry.definition))
    }

    /// Returns `true` when `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .contains_key(name)
    }

    /// Registered names, in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .order
            .clone()
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    /// Returns `true` when no tool is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered definitions, in registration order.
    #[must_use]
    pub fn definitions(&self) -> Vec<Arc<ToolDefinition>> {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .ordered()
            .map(|entry| Arc::clone(&entry.definition))
            .collect()
    }

    /// Definitions whose category equals `category`, in registration order.
    #[must_use]
    pub fn by_category(&self, category: &str) -> Vec<Arc<ToolDefinition>> {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .ordered()
            .filter(|entry| entry.definition.category() == Some(category))
            .map(|entry| Arc::clone(&entry.definition))
            .collect()
    }

    /// Returns a copy of the registry context.
    #[must_use]
    pub fn context(&self) -> ExecutionContext {
        self.context
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Shallow-merges `patch` into the registry context.
    pub fn update_context(&self, patch: ExecutionContext) {
        self.context
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .merge(patch);
    }

    /// Executes `name` with default sandbox options.
    ///
    /// # Errors
    ///
    /// See [`ToolRegistry::execute_with_options`].
    pub async fn execute(&self, name: &str, params: Value) -> ToolResult<Value> {
        self.execute_with_options(name, params, ExecutionOptions::default())
            .await
    }

    /// Executes `name`, applying `options` when a sandbox is attached.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::NotFound`] for unknown names,
    /// [`ToolError::NotAllowed`] or [`ToolError::Validation`] when the guard
    /// rejects the call, any sandbox limit error, or the tool's own error.
    pub async fn execute_with_options(
        &self,
        name: &str,
        params: Value,
        options: ExecutionOptions,
    ) -> ToolResult<Value> {
        let definition = self.get(name).ok_or_else(|| {
            debug!(tool = name, "execution requested for unknown tool");
            ToolError::NotFound {
                name: name.to_owned(),
            }
        })?;

        let started = Instant::now();
        let outcome = self.run(&definition, params, options).await;
        self.record(&definition, started.elapsed(), outcome.is_ok());

        debug!(tool = name, ok = outcome.is_ok(), "tool execution finished");
        outcome
    }

    /// Parses untrusted argument text, then executes `name`.
    ///
    /// With a guard attached the text is screened by
    /// [`SecurityGuard::parse_tool_arguments`]; otherwise it is parsed as
    /// plain JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidArguments`] when the text is rejected, or
    /// any error from [`ToolRegistry::execute`].
    pub async fn execute_from_json(&self, name: &str, text: &str) -> ToolResult<Value> {
        let parsed = match self.guard() {
            Some(guard) => guard.parse_tool_arguments(name, text),
            None => serde_json::from_str(text).map_err(|source| ArgumentError::InvalidJson { source }),
        };
        let params = parsed.map_err(|source| ToolError::InvalidArguments {
            tool: name.to_owned(),
            source,
        })?;

        self.execute(name, params).await
    }

    /// Executes `calls` one after another.
    ///
    /// Each slot of the returned vector holds the outcome of the call at the
    /// same position; a failed call never stops the batch.
    pub async fn execute_batch<I>(&self, calls: I) -> Vec<ToolResult<Value>>
    where
        I: IntoIterator<Item = ToolCall>,
    {
        let calls: Vec<ToolCall> = calls.into_iter().collect();
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            results.push(self.execute(&call.name, call.params).await);
        }
        results
    }

    /// Registered tools in the OpenAI tool-calling format.
    #[must_use]
    pub fn to_openai_format(&self) -> Vec<OpenAiTool> {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .ordered()
            .map(|entry| OpenAiTool::from(entry.definition.as_ref()))
            .collect()
    }

    /// Registered tools in the Anthropic tool-use format.
    #[must_use]
    pub fn to_anthropic_format(&self) -> Vec<AnthropicTool> {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .ordered()
            .map(|entry| AnthropicTool::from(entry.definition.as_ref()))
            .collect()
    }

    /// Usage of every registered tool, keyed by name.
    #[must_use]
    pub fn usage_stats(&self) -> HashMap<String, UsageStats> {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .iter()
            .map(|(name, entry)| (name.clone(), entry.usage.snapshot(name)))
            .collect()
    }

    /// Usage of one tool.
    #[must_use]
    pub fn tool_usage(&self, name: &str) -> Option<UsageStats> {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .get(name)
            .map(|entry| entry.usage.snapshot(name))
    }

    /// The `limit` most called tools, busiest first.
    ///
    /// Ties keep registration order.
    #[must_use]
    pub fn most_used(&self, limit: usize) -> Vec<UsageStats> {
        let tools = self.tools.read().unwrap_or_else(PoisonError::into_inner);
        let mut ranked: Vec<_> = tools.ordered().collect();
        ranked.sort_by(|a, b| b.usage.calls().cmp(&a.usage.calls()));
        ranked
            .into_iter()
            .take(limit)
            .map(|entry| entry.usage.snapshot(entry.definition.name()))
            .collect()
    }

    /// Zeroes the usage counters of every tool.
    pub fn reset_usage_stats(&self) {
        let mut tools = self.tools.write().unwrap_or_else(PoisonError::into_inner);
        for entry in tools.entries.values_mut() {
            entry.usage = UsageCounters::default();
        }
    }

    async fn run(
        &self,
        definition: &ToolDefinition,
        params: Value,
        options: ExecutionOptions,
    ) -> ToolResult<Value> {
        let name = definition.name();

        let params = match self.guard() {
            Some(guard) => {
                if let Some(rule) = guard.evaluate_tool(name).rule() {
                    return Err(ToolError::NotAllowed {
                        name: name.to_owned(),
                        reason: rule.reason(),
                    });
                }
                match definition.schema() {
                    Some(schema) => guard.validate_params(name, params, schema)?,
                    None => params,
                }
            }
            None => params,
        };

        let context = self.context();
        let executor = definition.executor();
        match self.sandbox() {
            Some(sandbox) => {
                sandbox
                    .execute(name, params, &context, options, move |params, ctx| async move {
                        executor.execute(params, &ctx).await
                    })
                    .await
            }
            None => executor.execute(params, &context).await,
        }
    }

    fn record(&self, definition: &Arc<ToolDefinition>, elapsed: Duration, success: bool) {
        let mut tools = self.tools.write().unwrap_or_else(PoisonError::into_inner);
        // A call that outlived its definition must not touch the replacement.
        if let Some(entry) = tools
            .entries
            .get_mut(definition.name())
            .filter(|entry| Arc::ptr_eq(&entry.definition, definition))
        {
            entry.usage.record(elapsed, success);
        }
    }
}
