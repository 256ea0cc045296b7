use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::models::{FunctionDef, Tool};

/// Primitive parameter types accepted in a tool schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
    /// Array of a primitive element type
    Array(Box<ParamType>),
}

impl ParamType {
    fn type_name(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Integer => "integer",
            ParamType::Boolean => "boolean",
            ParamType::Array(_) => "array",
        }
    }

    fn to_schema(&self, description: &str) -> Value {
        match self {
            ParamType::Array(item) => serde_json::json!({
                "type": "array",
                "items": { "type": item.type_name() },
                "description": description,
            }),
            _ => serde_json::json!({
                "type": self.type_name(),
                "description": description,
            }),
        }
    }
}

/// One declared parameter of a tool, in declaration order.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    pub name: String,
    pub param_type: ParamType,
    pub description: String,
    pub required: bool,
}

/// Immutable description of a registered tool: schema plus the two
/// independent termination flags.
///
/// `ends_conversation` makes the tool's invocation terminate the run and
/// surface the assistant message that issued it; `arguments_only` makes the
/// parsed arguments themselves the final result, with no execution. Both
/// default to false (normal tool, result fed back to the model).
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParameterSpec>,
    pub ends_conversation: bool,
    pub arguments_only: bool,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
            ends_conversation: false,
            arguments_only: false,
        }
    }

    /// Append a required parameter (declaration order is preserved).
    pub fn required_param(
        mut self,
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
    ) -> Self {
        self.parameters.push(ParameterSpec {
            name: name.into(),
            param_type,
            description: description.into(),
            required: true,
        });
        self
    }

    /// Append an optional parameter.
    pub fn optional_param(
        mut self,
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
    ) -> Self {
        self.parameters.push(ParameterSpec {
            name: name.into(),
            param_type,
            description: description.into(),
            required: false,
        });
        self
    }

    pub fn ends_conversation(mut self) -> Self {
        self.ends_conversation = true;
        self
    }

    pub fn arguments_only(mut self) -> Self {
        self.arguments_only = true;
        self
    }

    /// Serialize to the chat API tool definition format.
    pub fn to_definition(&self) -> Tool {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();

        for param in &self.parameters {
            properties.insert(
                param.name.clone(),
                param.param_type.to_schema(&param.description),
            );
            if param.required {
                required.push(Value::String(param.name.clone()));
            }
        }

        Tool {
            tool_type: "function".to_string(),
            function: FunctionDef {
                name: self.name.clone(),
                description: self.description.clone(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": properties,
                    "required": required,
                }),
            },
        }
    }
}

/// Resolved arguments for one tool invocation.
#[derive(Debug, Clone, Default)]
pub struct ToolArguments {
    values: Map<String, Value>,
}

impl ToolArguments {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.values
    }

    pub fn get_required<T>(&self, key: &str) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| anyhow::anyhow!("Required parameter '{}' missing", key))?;

        serde_json::from_value(value.clone())
            .map_err(|e| anyhow::anyhow!("Failed to parse parameter '{}': {}", key, e))
    }

    pub fn get_optional<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        match self.values.get(key) {
            Some(value) => {
                let parsed: T = serde_json::from_value(value.clone())
                    .map_err(|e| anyhow::anyhow!("Failed to parse parameter '{}': {}", key, e))?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    /// Resolve values in the tool's declared parameter order; absent
    /// parameters yield null. This is the positional view a plain-function
    /// callable consumes.
    pub fn ordered(&self, spec: &ToolSpec) -> Vec<Value> {
        spec.parameters
            .iter()
            .map(|param| self.values.get(&param.name).cloned().unwrap_or(Value::Null))
            .collect()
    }
}

/// String-coerced tool output: structures are serialized, scalars
/// stringified, nothing becomes the empty string.
#[derive(Debug, Clone)]
pub enum ToolOutput {
    Text(String),
    Json(Value),
    None,
}

impl ToolOutput {
    pub fn into_text(self) -> String {
        match self {
            ToolOutput::Text(text) => text,
            ToolOutput::Json(Value::String(s)) => s,
            ToolOutput::Json(value) => serde_json::to_string(&value).unwrap_or_default(),
            ToolOutput::None => String::new(),
        }
    }
}

/// Callable side of a registered tool.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: &ToolArguments) -> Result<ToolOutput>;
}
