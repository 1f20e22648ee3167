//! Resource-bounded executor for a single tool call.
//!
//! The sandbox enforces cooperative limits only: a time budget, a ceiling on
//! simultaneous executions, and a ceiling on the estimated result size. Each
//! run receives a [`CancellationToken`] through its [`SandboxContext`]; when
//! the run is cancelled or times out the sandbox stops waiting and drops the
//! wrapped future. It does not isolate the tool from ambient resources.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use agent_config::SecurityConfig;
use agent_primitives::ExecutionId;
use agent_telemetry::{EventDispatcher, SecurityEvent, SecurityObserver};
use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::context::{ExecutionContext, SandboxContext};
use crate::error::{ToolError, ToolResult};

/// Hooks invoked around every sandboxed run.
#[async_trait]
pub trait ExecutionHooks: Send + Sync {
    /// Runs before the tool starts. An error aborts the call.
    async fn before_execute(&self, tool: &str, params: &Value) -> ToolResult<()> {
        let _ = (tool, params);
        Ok(())
    }

    /// Runs exactly once after the call settles, with its final outcome.
    async fn after_execute(&self, tool: &str, outcome: &ToolResult<Value>) {
        let _ = (tool, outcome);
    }
}

/// Per-call overrides for sandbox limits.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionOptions {
    /// Replaces the configured time budget.
    pub timeout: Option<Duration>,
    /// Replaces the configured output ceiling.
    pub max_output_size: Option<usize>,
    /// Pre-assigned identifier, so the caller can target [`ToolSandbox::cancel`].
    pub execution_id: Option<ExecutionId>,
}

impl ExecutionOptions {
    /// Overrides the time budget.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Overrides the output ceiling.
    #[must_use]
    pub fn with_max_output_size(mut self, bytes: usize) -> Self {
        self.max_output_size = Some(bytes);
        self
    }

    /// Pre-assigns the execution identifier.
    #[must_use]
    pub fn with_execution_id(mut self, execution_id: ExecutionId) -> Self {
        self.execution_id = Some(execution_id);
        self
    }
}

/// Estimates the in-memory footprint of a tool result, in bytes.
///
/// Strings count two bytes per UTF-16 unit, numbers eight, booleans four;
/// anything else counts two bytes per unit of its JSON rendering. The figure
/// is a conservative heuristic, not an exact measurement.
#[must_use]
pub fn estimate_output_size(value: &Value) -> usize {
    match value {
        Value::String(text) => text.encode_utf16().count() * 2,
        Value::Number(_) => 8,
        Value::Bool(_) => 4,
        other => serde_json::to_string(other).map_or(0, |json| json.encode_utf16().count() * 2),
    }
}

#[derive(Debug)]
struct ActiveEntry {
    token: CancellationToken,
    slot: u64,
}

type ActiveMap = Mutex<HashMap<ExecutionId, ActiveEntry>>;

/// Removes its execution from the active set when dropped, on every path.
struct ActiveSlot<'a> {
    active: &'a ActiveMap,
    execution_id: ExecutionId,
    slot: u64,
}

impl Drop for ActiveSlot<'_> {
    fn drop(&mut self) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active
            .get(&self.execution_id)
            .is_some_and(|entry| entry.slot == self.slot)
        {
            active.remove(&self.execution_id);
        }
    }
}

/// Resource-bounded executor shared by every call routed through a registry.
pub struct ToolSandbox {
    config: RwLock<SecurityConfig>,
    active: ActiveMap,
    next_slot: AtomicU64,
    allowed_operations: BTreeSet<String>,
    hooks: Option<Arc<dyn ExecutionHooks>>,
    events: EventDispatcher,
}

impl std::fmt::Debug for ToolSandbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSandbox")
            .field("config", &self.config())
            .field("active", &self.active_count())
            .field("allowed_operations", &self.allowed_operations)
            .field("hooks_configured", &self.hooks.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for ToolSandbox {
    fn default() -> Self {
        Self::new(SecurityConfig::default())
    }
}

impl ToolSandbox {
    /// Creates a sandbox that reports events through tracing.
    #[must_use]
    pub fn new(config: SecurityConfig) -> Self {
        Self {
            config: RwLock::new(config),
            active: Mutex::new(HashMap::new()),
            next_slot: AtomicU64::new(0),
            allowed_operations: BTreeSet::new(),
            hooks: None,
            events: EventDispatcher::tracing(),
        }
    }

    /// Routes security events to `observer` instead of tracing.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn SecurityObserver>) -> Self {
        self.events = EventDispatcher::new(observer);
        self
    }

    /// Replaces the event dispatcher.
    #[must_use]
    pub fn with_dispatcher(mut self, events: EventDispatcher) -> Self {
        self.events = events;
        self
    }

    /// Installs before/after hooks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn ExecutionHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Declares the operations advertised to tools through their context.
    #[must_use]
    pub fn with_allowed_operations<I, S>(mut self, operations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_operations = operations.into_iter().map(Into::into).collect();
        self
    }

    /// Returns a copy of the current configuration.
    #[must_use]
    pub fn config(&self) -> SecurityConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the configuration; running executions keep their limits.
    pub fn set_config(&self, config: SecurityConfig) {
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
    }

    /// Number of executions currently in flight.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Identifiers of executions currently in flight.
    #[must_use]
    pub fn active_executions(&self) -> Vec<ExecutionId> {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }

    /// Returns `true` while `execution_id` is in flight.
    #[must_use]
    pub fn is_active(&self, execution_id: ExecutionId) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&execution_id)
    }

    /// Signals cancellation to one execution.
    ///
    /// Returns `false` when the identifier is not in flight.
    pub fn cancel(&self, execution_id: ExecutionId) -> bool {
        let active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        match active.get(&execution_id) {
            Some(entry) => {
                entry.token.cancel();
                debug!(%execution_id, "cancellation requested");
                true
            }
            None => false,
        }
    }

    /// Signals cancellation to every execution and clears the active set.
    ///
    /// Returns the number of executions signalled. The cancelled futures may
    /// still be unwinding when this returns.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<_> = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .collect();

        for (execution_id, entry) in &drained {
            entry.token.cancel();
            debug!(%execution_id, "cancellation requested");
        }
        drained.len()
    }

    /// Runs `call` under the sandbox limits.
    ///
    /// With the guard switch or sandboxing disabled, `call` runs directly with
    /// an unmodified clone of `ctx`. Otherwise the call is admitted against
    /// the concurrency ceiling, raced against its time budget and
    /// cancellation, and its result is checked against the output ceiling.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::ConcurrencyLimit`], [`ToolError::DuplicateExecution`],
    /// [`ToolError::Timeout`], [`ToolError::Cancelled`],
    /// [`ToolError::OutputTooLarge`], an error from the before hook, or the
    /// error produced by `call` itself, unchanged.
    pub async fn execute<F, Fut>(
        &self,
        tool: &str,
        params: Value,
        ctx: &ExecutionContext,
        options: ExecutionOptions,
        call: F,
    ) -> ToolResult<Value>
    where
        F: FnOnce(Value, ExecutionContext) -> Fut,
        Fut: Future<Output = ToolResult<Value>>,
    {
        let config = self.config();
        if !config.enabled || !config.sandbox_execution {
            return call(params, ctx.clone()).await;
        }

        let execution_id = options.execution_id.unwrap_or_default();
        let token = CancellationToken::new();
        let _slot = self.admit(tool, execution_id, &token, config.max_concurrent_calls)?;

        let timeout = options.timeout.unwrap_or(config.max_execution_time);
        let max_output_size = options.max_output_size.unwrap_or(config.max_output_size);
        let sandboxed = ctx.with_sandbox(SandboxContext::new(
            self.allowed_operations.clone(),
            max_output_size,
            execution_id,
            token.clone(),
        ));

        if let Some(hooks) = &self.hooks {
            hooks.before_execute(tool, &params).await?;
        }

        debug!(tool, %execution_id, timeout_ms = duration_ms(timeout), "sandboxed execution started");

        let outcome = tokio::select! {
            biased;
            () = token.cancelled() => {
                self.events.emit(SecurityEvent::Cancelled { execution_id });
                Err(ToolError::Cancelled { execution_id })
            }
            result = call(params, sandboxed) => result,
            () = tokio::time::sleep(timeout) => {
                token.cancel();
                let timeout_ms = duration_ms(timeout);
                self.events.emit(SecurityEvent::Timeout {
                    tool: tool.to_owned(),
                    timeout_ms,
                });
                Err(ToolError::Timeout { timeout_ms })
            }
        };

        let outcome = outcome.and_then(|value| self.enforce_output_size(tool, value, max_output_size));

        if let Some(hooks) = &self.hooks {
            hooks.after_execute(tool, &outcome).await;
        }

        debug!(tool, %execution_id, ok = outcome.is_ok(), "sandboxed execution finished");
        outcome
    }

    fn admit<'a>(
        &'a self,
        tool: &str,
        execution_id: ExecutionId,
        token: &CancellationToken,
        limit: usize,
    ) -> ToolResult<ActiveSlot<'a>> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);

        if active.len() >= limit {
            let in_flight = active.len();
            drop(active);
            self.events.emit(SecurityEvent::ConcurrencyExceeded {
                tool: tool.to_owned(),
                active: in_flight,
            });
            return Err(ToolError::ConcurrencyLimit {
                active: in_flight,
                limit,
            });
        }

        if active.contains_key(&execution_id) {
            return Err(ToolError::DuplicateExecution { execution_id });
        }

        let slot = self.next_slot.fetch_add(1, Ordering::Relaxed);
        active.insert(
            execution_id,
            ActiveEntry {
                token: token.clone(),
                slot,
            },
        );

        Ok(ActiveSlot {
            active: &self.active,
            execution_id,
            slot,
        })
    }

    fn enforce_output_size(&self, tool: &str, value: Value, max_size: usize) -> ToolResult<Value> {
        let size = estimate_output_size(&value);
        if size <= max_size {
            return Ok(value);
        }

        drop(value);
        self.events.emit(SecurityEvent::OutputSizeExceeded {
            tool: tool.to_owned(),
            size,
            max_size,
        });
        Err(ToolError::OutputTooLarge { size, max_size })
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    use agent_telemetry::{CollectingObserver, SecurityEventKind};
    use serde_json::json;

    fn sandbox(config: SecurityConfig) -> (Arc<ToolSandbox>, Arc<CollectingObserver>) {
        let collector = CollectingObserver::new();
        let sandbox = ToolSandbox::new(config).with_observer(collector.clone());
        (Arc::new(sandbox), collector)
    }

    async fn sleep_then(value: Value, delay: Duration) -> ToolResult<Value> {
        tokio::time::sleep(delay).await;
        Ok(value)
    }

    async fn wait_for_active(sandbox: &ToolSandbox, expected: usize) {
        for _ in 0..200 {
            if sandbox.active_count() == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("expected {expected} active executions");
    }

    #[test]
    fn estimates_sizes() {
        assert_eq!(estimate_output_size(&json!("abc")), 6);
        assert_eq!(estimate_output_size(&json!(12.5)), 8);
        assert_eq!(estimate_output_size(&json!(true)), 4);
        assert_eq!(estimate_output_size(&json!(null)), 8);
        assert_eq!(estimate_output_size(&json!({ "a": 1 })), 14);
    }

    #[tokio::test]
    async fn returns_result_and_clears_active_set() {
        let (sandbox, events) = sandbox(SecurityConfig::default());
        let ctx = ExecutionContext::new();

        let out = sandbox
            .execute("echo", json!("hi"), &ctx, ExecutionOptions::default(), |p, _| async move {
                Ok(p)
            })
            .await
            .unwrap();

        assert_eq!(out, json!("hi"));
        assert_eq!(sandbox.active_count(), 0);
        assert!(events.events().is_empty());
    }

    #[tokio::test]
    async fn tool_sees_sandbox_context() {
        let sandbox = ToolSandbox::new(SecurityConfig::default()).with_allowed_operations(["read"]);
        let id = ExecutionId::random();
        let options = ExecutionOptions::default()
            .with_execution_id(id)
            .with_max_output_size(512);

        let out = sandbox
            .execute("inspect", Value::Null, &ExecutionContext::new(), options, |_, ctx| async move {
                let sandbox = ctx.sandbox().expect("sandbox context");
                Ok(json!({
                    "id": sandbox.execution_id().to_string(),
                    "max": sandbox.max_output_size(),
                    "read": sandbox.allows("read"),
                }))
            })
            .await
            .unwrap();

        assert_eq!(out["id"], json!(id.to_string()));
        assert_eq!(out["max"], 512);
        assert_eq!(out["read"], true);
    }

    #[tokio::test]
    async fn tool_errors_pass_through_unchanged() {
        let (sandbox, _) = sandbox(SecurityConfig::default());
        let err = sandbox
            .execute("fail", Value::Null, &ExecutionContext::new(), ExecutionOptions::default(), |_, _| async {
                Err(ToolError::execution("boom"))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ToolError::Execution { ref reason } if reason == "boom"));
        assert_eq!(sandbox.active_count(), 0);
    }

    #[tokio::test]
    async fn times_out_before_slow_result() {
        let (sandbox, events) = sandbox(
            SecurityConfig::default().with_max_execution_time(Duration::from_millis(20)),
        );

        let err = sandbox
            .execute("slow", Value::Null, &ExecutionContext::new(), ExecutionOptions::default(), |_, _| {
                sleep_then(json!("late"), Duration::from_millis(500))
            })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Tool execution timed out after 20ms");
        assert_eq!(events.count(SecurityEventKind::Timeout), 1);
        assert_eq!(sandbox.active_count(), 0);
    }

    #[tokio::test]
    async fn per_call_timeout_overrides_config() {
        let (sandbox, _) = sandbox(SecurityConfig::default());
        let options = ExecutionOptions::default().with_timeout(Duration::from_millis(10));

        let err = sandbox
            .execute("slow", Value::Null, &ExecutionContext::new(), options, |_, _| {
                sleep_then(json!("late"), Duration::from_millis(500))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ToolError::Timeout { timeout_ms: 10 }));
    }

    #[tokio::test]
    async fn rejects_calls_beyond_concurrency_ceiling() {
        let (sandbox, events) =
            sandbox(SecurityConfig::default().with_max_concurrent_calls(2));

        let mut running = Vec::new();
        for _ in 0..2 {
            let sandbox = Arc::clone(&sandbox);
            running.push(tokio::spawn(async move {
                sandbox
                    .execute("slow", Value::Null, &ExecutionContext::new(), ExecutionOptions::default(), |_, _| {
                        sleep_then(json!("done"), Duration::from_millis(100))
                    })
                    .await
            }));
        }
        wait_for_active(&sandbox, 2).await;

        let err = sandbox
            .execute("slow", Value::Null, &ExecutionContext::new(), ExecutionOptions::default(), |p, _| async move {
                Ok(p)
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Too many concurrent tool executions"));
        assert_eq!(events.count(SecurityEventKind::ConcurrencyExceeded), 1);

        for handle in running {
            assert_eq!(handle.await.unwrap().unwrap(), json!("done"));
        }
        assert_eq!(sandbox.active_count(), 0);
    }

    #[tokio::test]
    async fn cancel_stops_waiting_and_notifies_once() {
        let (sandbox, events) = sandbox(SecurityConfig::default());
        let id = ExecutionId::random();

        let task = {
            let sandbox = Arc::clone(&sandbox);
            tokio::spawn(async move {
                let options = ExecutionOptions::default().with_execution_id(id);
                sandbox
                    .execute("slow", Value::Null, &ExecutionContext::new(), options, |_, _| {
                        sleep_then(json!("late"), Duration::from_secs(5))
                    })
                    .await
            })
        };
        wait_for_active(&sandbox, 1).await;

        assert!(sandbox.is_active(id));
        assert!(sandbox.cancel(id));
        assert!(sandbox.cancel(id));

        let err = task.await.unwrap().unwrap_err();
        assert_eq!(err.to_string(), "Tool execution was cancelled");
        assert_eq!(events.count(SecurityEventKind::Cancelled), 1);
        assert!(!sandbox.cancel(id));
        assert!(!sandbox.is_active(id));
    }

    #[tokio::test]
    async fn cancel_all_clears_bookkeeping() {
        let (sandbox, events) = sandbox(SecurityConfig::default());

        let mut tasks = Vec::new();
        for _ in 0..3 {
            let sandbox = Arc::clone(&sandbox);
            tasks.push(tokio::spawn(async move {
                sandbox
                    .execute("slow", Value::Null, &ExecutionContext::new(), ExecutionOptions::default(), |_, _| {
                        sleep_then(json!("late"), Duration::from_secs(5))
                    })
                    .await
            }));
        }
        wait_for_active(&sandbox, 3).await;

        assert_eq!(sandbox.cancel_all(), 3);
        assert_eq!(sandbox.active_count(), 0);

        for task in tasks {
            let err = task.await.unwrap().unwrap_err();
            assert!(matches!(err, ToolError::Cancelled { .. }));
        }
        assert_eq!(events.count(SecurityEventKind::Cancelled), 3);
    }

    #[tokio::test]
    async fn cooperative_tools_observe_cancellation() {
        let (sandbox, _) = sandbox(SecurityConfig::default());
        let observed = Arc::new(AtomicUsize::new(0));
        let id = ExecutionId::random();

        let task = {
            let sandbox = Arc::clone(&sandbox);
            let observed = Arc::clone(&observed);
            tokio::spawn(async move {
                let options = ExecutionOptions::default().with_execution_id(id);
                sandbox
                    .execute("watcher", Value::Null, &ExecutionContext::new(), options, move |_, ctx| async move {
                        let token = ctx.sandbox().expect("sandbox").cancellation().clone();
                        tokio::spawn(async move {
                            token.cancelled().await;
                            observed.fetch_add(1, Ordering::SeqCst);
                        });
                        tokio::time::sleep(Duration::from_secs(5)).await;
                        Ok(Value::Null)
                    })
                    .await
            })
        };
        wait_for_active(&sandbox, 1).await;

        sandbox.cancel(id);
        assert!(task.await.unwrap().is_err());
        for _ in 0..100 {
            if observed.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(observed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn oversized_output_is_discarded() {
        let (sandbox, events) = sandbox(SecurityConfig::default().with_max_output_size(10));

        let err = sandbox
            .execute("big", Value::Null, &ExecutionContext::new(), ExecutionOptions::default(), |_, _| async {
                Ok(json!("this string is far too long"))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ToolError::OutputTooLarge { size: 54, max_size: 10 }));
        assert!(err.to_string().contains("Tool output exceeded maximum size limit"));
        assert_eq!(events.count(SecurityEventKind::OutputSizeExceeded), 1);
        assert_eq!(sandbox.active_count(), 0);
    }

    #[tokio::test]
    async fn rejects_duplicate_execution_ids() {
        let (sandbox, _) = sandbox(SecurityConfig::default());
        let id = ExecutionId::random();

        let task = {
            let sandbox = Arc::clone(&sandbox);
            tokio::spawn(async move {
                let options = ExecutionOptions::default().with_execution_id(id);
                sandbox
                    .execute("slow", Value::Null, &ExecutionContext::new(), options, |_, _| {
                        sleep_then(json!("done"), Duration::from_millis(100))
                    })
                    .await
            })
        };
        wait_for_active(&sandbox, 1).await;

        let options = ExecutionOptions::default().with_execution_id(id);
        let err = sandbox
            .execute("slow", Value::Null, &ExecutionContext::new(), options, |p, _| async move { Ok(p) })
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::DuplicateExecution { .. }));

        assert_eq!(task.await.unwrap().unwrap(), json!("done"));
    }

    #[derive(Default)]
    struct RecordingHooks {
        before: AtomicUsize,
        after: AtomicUsize,
        reject: bool,
    }

    #[async_trait]
    impl ExecutionHooks for RecordingHooks {
        async fn before_execute(&self, _tool: &str, _params: &Value) -> ToolResult<()> {
            self.before.fetch_add(1, Ordering::SeqCst);
            if self.reject {
                return Err(ToolError::execution("rejected by hook"));
            }
            Ok(())
        }

        async fn after_execute(&self, _tool: &str, _outcome: &ToolResult<Value>) {
            self.after.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn hooks_run_around_success_and_failure() {
        let hooks = Arc::new(RecordingHooks::default());
        let sandbox = ToolSandbox::new(
            SecurityConfig::default().with_max_execution_time(Duration::from_millis(10)),
        )
        .with_hooks(hooks.clone());
        let ctx = ExecutionContext::new();

        sandbox
            .execute("ok", Value::Null, &ctx, ExecutionOptions::default(), |p, _| async move { Ok(p) })
            .await
            .unwrap();
        sandbox
            .execute("slow", Value::Null, &ctx, ExecutionOptions::default(), |_, _| {
                sleep_then(Value::Null, Duration::from_millis(200))
            })
            .await
            .unwrap_err();

        assert_eq!(hooks.before.load(Ordering::SeqCst), 2);
        assert_eq!(hooks.after.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failing_before_hook_aborts_and_cleans_up() {
        let hooks = Arc::new(RecordingHooks {
            reject: true,
            ..RecordingHooks::default()
        });
        let sandbox = ToolSandbox::new(SecurityConfig::default()).with_hooks(hooks.clone());
        let ran = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&ran);
        let err = sandbox
            .execute("guarded", Value::Null, &ExecutionContext::new(), ExecutionOptions::default(), move |p, _| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(p)
            })
            .await
            .unwrap_err();

        assert!(err.to_string().contains("rejected by hook"));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert_eq!(hooks.after.load(Ordering::SeqCst), 0);
        assert_eq!(sandbox.active_count(), 0);
    }

    #[tokio::test]
    async fn disabled_sandbox_calls_directly() {
        for config in [
            SecurityConfig::disabled(),
            SecurityConfig::default().with_sandbox_execution(false),
        ] {
            let (sandbox, events) = sandbox(
                config
                    .with_max_output_size(1)
                    .with_max_execution_time(Duration::from_millis(1)),
            );

            let out = sandbox
                .execute("plain", Value::Null, &ExecutionContext::new(), ExecutionOptions::default(), |_, ctx| async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok(json!({ "sandboxed": ctx.sandbox().is_some() }))
                })
                .await
                .unwrap();

            assert_eq!(out, json!({ "sandboxed": false }));
            assert!(events.events().is_empty());
        }
    }
}
