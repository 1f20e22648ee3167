//! Provider-facing tool descriptions.

use agent_primitives::ParameterSchema;
use serde::Serialize;

use crate::tool::ToolDefinition;

/// Function description in the OpenAI tool-calling format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenAiFunction {
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// JSON schema of the arguments object.
    pub parameters: ParameterSchema,
}

/// Tool entry in the OpenAI tool-calling format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenAiTool {
    /// Always `"function"`.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Function description.
    pub function: OpenAiFunction,
}

/// Tool entry in the Anthropic tool-use format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnthropicTool {
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// JSON schema of the input object.
    pub input_schema: ParameterSchema,
}

impl From<&ToolDefinition> for OpenAiTool {
    fn from(definition: &ToolDefinition) -> Self {
        Self {
            kind: "function",
            function: OpenAiFunction {
                name: definition.name().to_owned(),
                description: definition.description().to_owned(),
                parameters: definition.parameters().clone(),
            },
        }
    }
}

impl From<&ToolDefinition> for AnthropicTool {
    fn from(definition: &ToolDefinition) -> Self {
        Self {
            name: definition.name().to_owned(),
            description: definition.description().to_owned(),
            input_schema: definition.parameters().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_primitives::PropertySchema;
    use serde_json::json;

    fn search() -> ToolDefinition {
        ToolDefinition::from_fn(
            "search",
            "Search the index",
            ParameterSchema::new()
                .with_required_property("query", PropertySchema::string("Query text"))
                .with_property("limit", PropertySchema::integer("Maximum hits")),
            |_, _| async { Ok(json!([])) },
        )
    }

    #[test]
    fn openai_shape() {
        let exported = serde_json::to_value(OpenAiTool::from(&search())).unwrap();
        assert_eq!(
            exported,
            json!({
                "type": "function",
                "function": {
                    "name": "search",
                    "description": "Search the index",
                    "parameters": {
                        "type": "object",
                        "properties": {
                            "limit": { "type": "integer", "description": "Maximum hits" },
                            "query": { "type": "string", "description": "Query text" }
                        },
                        "required": ["query"]
                    }
                }
            })
        );
    }

    #[test]
    fn anthropic_shape_omits_empty_required() {
        let definition = ToolDefinition::from_fn(
            "ping",
            "Health check",
            ParameterSchema::new(),
            |_, _| async { Ok(json!("pong")) },
        );
        let exported = serde_json::to_value(AnthropicTool::from(&definition)).unwrap();
        assert_eq!(
            exported,
            json!({
                "name": "ping",
                "description": "Health check",
                "input_schema": { "type": "object", "properties": {} }
            })
        );
    }
}
