//! Tool definitions and the executor trait.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use agent_primitives::{ParameterSchema, Schema};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::ExecutionContext;
use crate::error::{ToolError, ToolResult};

/// Trait implemented by tool executors.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Runs the tool with validated parameters and the ambient context.
    async fn execute(&self, params: Value, ctx: &ExecutionContext) -> ToolResult<Value>;
}

/// Adapts an async closure into a [`Tool`].
struct FnTool<F>(F);

#[async_trait]
impl<F, Fut> Tool for FnTool<F>
where
    F: Fn(Value, ExecutionContext) -> Fut + Send + Sync,
    Fut: Future<Output = ToolResult<Value>> + Send,
{
    async fn execute(&self, params: Value, ctx: &ExecutionContext) -> ToolResult<Value> {
        (self.0)(params, ctx.clone()).await
    }
}

/// Relative cost of invoking a tool, surfaced to planners.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostTier {
    /// Negligible cost.
    #[default]
    Cheap,
    /// Noticeable latency or spend.
    Moderate,
    /// Slow or costly; use sparingly.
    Expensive,
}

/// Example invocation shown to models and operators.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolExample {
    /// What the example demonstrates.
    pub description: String,
    /// Parameters for the example call.
    pub params: Value,
}

impl ToolExample {
    /// Creates an example.
    #[must_use]
    pub fn new(description: impl Into<String>, params: Value) -> Self {
        Self {
            description: description.into(),
            params,
        }
    }
}

/// A named, schema-described async capability.
///
/// Definitions are immutable once registered; the registry shares them
/// behind an [`Arc`].
#[derive(Clone)]
pub struct ToolDefinition {
    name: String,
    description: String,
    parameters: ParameterSchema,
    executor: Arc<dyn Tool>,
    category: Option<String>,
    cost: CostTier,
    examples: Vec<ToolExample>,
    schema: Option<Arc<dyn Schema>>,
}

impl fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .field("category", &self.category)
            .field("cost", &self.cost)
            .field("examples", &self.examples.len())
            .field("schema_configured", &self.schema.is_some())
            .finish_non_exhaustive()
    }
}

impl ToolDefinition {
    /// Creates a definition backed by a [`Tool`] implementation.
    #[must_use]
    pub fn new<T>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ParameterSchema,
        executor: T,
    ) -> Self
    where
        T: Tool + 'static,
    {
        Self::from_executor(name, description, parameters, Arc::new(executor))
    }

    /// Creates a definition backed by a shared executor.
    #[must_use]
    pub fn from_executor(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ParameterSchema,
        executor: Arc<dyn Tool>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            executor,
            category: None,
            cost: CostTier::default(),
            examples: Vec::new(),
            schema: None,
        }
    }

    /// Creates a definition backed by an async closure.
    #[must_use]
    pub fn from_fn<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ParameterSchema,
        handler: F,
    ) -> Self
    where
        F: Fn(Value, ExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolResult<Value>> + Send + 'static,
    {
        Self::new(name, description, parameters, FnTool(handler))
    }

    /// Sets the category used for grouping.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Sets the cost tier.
    #[must_use]
    pub fn with_cost(mut self, cost: CostTier) -> Self {
        self.cost = cost;
        self
    }

    /// Appends a usage example.
    #[must_use]
    pub fn with_example(mut self, example: ToolExample) -> Self {
        self.examples.push(example);
        self
    }

    /// Attaches the schema the guard validates parameters against.
    #[must_use]
    pub fn with_schema<S>(mut self, schema: S) -> Self
    where
        S: Schema + 'static,
    {
        self.schema = Some(Arc::new(schema));
        self
    }

    /// Uses the declared parameter shape as the validation schema.
    #[must_use]
    pub fn with_parameter_validation(self) -> Self {
        let schema = self.parameters.clone();
        self.with_schema(schema)
    }

    /// Returns the tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description shown to models.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the declared parameter shape.
    #[must_use]
    pub fn parameters(&self) -> &ParameterSchema {
        &self.parameters
    }

    /// Returns the category, if any.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Returns the cost tier.
    #[must_use]
    pub const fn cost(&self) -> CostTier {
        self.cost
    }

    /// Returns the usage examples.
    #[must_use]
    pub fn examples(&self) -> &[ToolExample] {
        &self.examples
    }

    /// Returns the validation schema, if any.
    #[must_use]
    pub fn schema(&self) -> Option<&dyn Schema> {
        self.schema.as_deref()
    }

    /// Returns the executor.
    #[must_use]
    pub fn executor(&self) -> Arc<dyn Tool> {
        Arc::clone(&self.executor)
    }

    /// Checks the static shape of the definition.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidDefinition`] when the name or description
    /// is blank or the parameter schema is malformed.
    pub fn check(&self) -> ToolResult<()> {
        if self.name.trim().is_empty() {
            return Err(ToolError::invalid_definition(
                &self.name,
                "tool name cannot be empty",
            ));
        }
        if self.description.trim().is_empty() {
            return Err(ToolError::invalid_definition(
                &self.name,
                "tool description cannot be empty",
            ));
        }
        self.parameters
            .check_shape()
            .map_err(|err| ToolError::invalid_definition(&self.name, err.to_string()))
    }
}
