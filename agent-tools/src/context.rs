//! Ambient data handed to every tool call.

use std::any::Any;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use agent_primitives::ExecutionId;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::Span;

/// Ambient context passed to tools.
///
/// The registry owns one context and hands each call a clone. Conventional
/// entries (working directory, storage handle, logging span) have dedicated
/// slots; anything else lives in the free-form metadata bag. The sandbox
/// extends the clone with a [`SandboxContext`] for the duration of one run.
#[derive(Clone, Default)]
pub struct ExecutionContext {
    working_dir: Option<PathBuf>,
    storage: Option<Arc<dyn Any + Send + Sync>>,
    span: Option<Span>,
    metadata: Map<String, Value>,
    sandbox: Option<SandboxContext>,
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("working_dir", &self.working_dir)
            .field("storage_configured", &self.storage.is_some())
            .field("metadata", &self.metadata)
            .field("sandbox", &self.sandbox)
            .finish_non_exhaustive()
    }
}

impl ExecutionContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the working directory.
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Attaches an opaque storage handle.
    #[must_use]
    pub fn with_storage<T>(mut self, storage: Arc<T>) -> Self
    where
        T: Any + Send + Sync,
    {
        self.storage = Some(storage);
        self
    }

    /// Attaches the span tools should log under.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Adds a metadata entry and returns the updated context.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.insert_metadata(key, value);
        self
    }

    /// Inserts a metadata entry, replacing any previous value.
    pub fn insert_metadata(&mut self, key: impl Into<String>, value: Value) {
        self.metadata.insert(key.into(), value);
    }

    /// Returns the working directory, if set.
    #[must_use]
    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    /// Returns the storage handle when it has type `T`.
    #[must_use]
    pub fn storage<T>(&self) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        self.storage.clone()?.downcast::<T>().ok()
    }

    /// Returns the logging span, or a disabled span when none is set.
    #[must_use]
    pub fn span(&self) -> Span {
        self.span.clone().unwrap_or_else(Span::none)
    }

    /// Returns the metadata bag.
    #[must_use]
    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Returns a single metadata entry.
    #[must_use]
    pub fn metadata_value(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// Returns sandbox details when the call runs inside a sandbox.
    #[must_use]
    pub fn sandbox(&self) -> Option<&SandboxContext> {
        self.sandbox.as_ref()
    }

    /// Returns `true` once the sandbox has asked this call to stop.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.sandbox
            .as_ref()
            .is_some_and(|sandbox| sandbox.cancellation.is_cancelled())
    }

    /// Shallow-merges `patch` into this context.
    ///
    /// Slots set in `patch` replace the current ones and metadata keys in
    /// `patch` overwrite existing keys. Sandbox details are never merged.
    pub fn merge(&mut self, patch: ExecutionContext) {
        let ExecutionContext {
            working_dir,
            storage,
            span,
            metadata,
            sandbox: _,
        } = patch;

        if working_dir.is_some() {
            self.working_dir = working_dir;
        }
        if storage.is_some() {
            self.storage = storage;
        }
        if span.is_some() {
            self.span = span;
        }
        self.metadata.extend(metadata);
    }

    pub(crate) fn with_sandbox(&self, sandbox: SandboxContext) -> Self {
        let mut context = self.clone();
        context.sandbox = Some(sandbox);
        context
    }
}

/// Limits and identity of one sandboxed run, visible to the tool.
#[derive(Debug, Clone)]
pub struct SandboxContext {
    allowed_operations: BTreeSet<String>,
    max_output_size: usize,
    execution_id: ExecutionId,
    cancellation: CancellationToken,
}

impl SandboxContext {
    pub(crate) fn new(
        allowed_operations: BTreeSet<String>,
        max_output_size: usize,
        execution_id: ExecutionId,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            allowed_operations,
            max_output_size,
            execution_id,
            cancellation,
        }
    }

    /// Operations the sandbox declares available to the tool.
    #[must_use]
    pub fn allowed_operations(&self) -> &BTreeSet<String> {
        &self.allowed_operations
    }

    /// Returns `true` when `operation` is declared available.
    #[must_use]
    pub fn allows(&self, operation: &str) -> bool {
        self.allowed_operations.contains(operation)
    }

    /// Output ceiling applied to this run, in bytes.
    #[must_use]
    pub const fn max_output_size(&self) -> usize {
        self.max_output_size
    }

    /// Identifier of this run.
    #[must_use]
    pub const fn execution_id(&self) -> ExecutionId {
        self.execution_id
    }

    /// Token tripped when the run is cancelled or the caller stops waiting.
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }
}
