use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::llm::ToolDefinition;
use crate::orders::OrderApiError;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool `{0}`")]
    UnknownTool(String),
    #[error("invalid arguments for `{tool}`: {source}")]
    InvalidArguments { tool: &'static str, source: serde_json::Error },
    #[error(transparent)]
    OrderApi(#[from] OrderApiError),
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// JSON Schema object describing the arguments.
    fn parameters(&self) -> Value;
    async fn execute(&self, input: Value) -> Result<Value, ToolError>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// Decodes tool arguments, treating a missing argument object as `{}`.
pub fn parse_arguments<T>(tool: &'static str, input: Value) -> Result<T, ToolError>
where
    T: DeserializeOwned,
{
    let input = if input.is_null() { Value::Object(Default::default()) } else { input };
    serde_json::from_value(input).map_err(|source| ToolError::InvalidArguments { tool, source })
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.tools.insert(tool.name().to_string(), Box::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(Box::as_ref)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|tool| tool.definition()).collect()
    }

    pub async fn execute(&self, name: &str, input: Value) -> Result<Value, ToolError> {
        let tool = self.get(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tool.execute(input).await
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::{json, Value};

    use super::{parse_arguments, Tool, ToolError, ToolRegistry};

    struct Echo;

    #[derive(Deserialize)]
    struct EchoArgs {
        text: String,
    }

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn description(&self) -> &'static str {
            "Echo the text back."
        }

        fn parameters(&self) -> Value {
            json!({"type": "object", "properties": {"text": {"type": "string"}}, "required": ["text"]})
        }

        async fn execute(&self, input: Value) -> Result<Value, ToolError> {
            let args: EchoArgs = parse_arguments(self.name(), input)?;
            Ok(json!({"text": args.text}))
        }
    }

    #[tokio::test]
    async fn executes_registered_tool_by_name() {
        let mut registry = ToolRegistry::default();
        registry.register(Echo);

        let result = registry.execute("echo", json!({"text": "hello"})).await;
        assert_eq!(result.ok(), Some(json!({"text": "hello"})));
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error() {
        let registry = ToolRegistry::default();

        let result = registry.execute("launch_rocket", json!({})).await;
        assert!(matches!(result, Err(ToolError::UnknownTool(ref name)) if name == "launch_rocket"));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn missing_argument_names_tool_and_field() {
        let mut registry = ToolRegistry::default();
        registry.register(Echo);

        let error = registry.execute("echo", Value::Null).await.err().map(|e| e.to_string());
        let message = error.unwrap_or_default();
        assert!(message.contains("invalid arguments for `echo`"));
        assert!(message.contains("text"));
    }

    #[test]
    fn definitions_carry_schema() {
        let mut registry = ToolRegistry::default();
        registry.register(Echo);

        let definitions = registry.definitions();
        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions[0].name, "echo");
        assert_eq!(definitions[0].parameters["required"], json!(["text"]));
    }
}
