use std::sync::Arc;

use crate::error::ChatError;
use crate::models::Tool;

use super::tool::{ToolHandler, ToolSpec};

/// A registered tool: its immutable specification plus the callable.
#[derive(Clone)]
pub struct ToolEntry {
    pub spec: ToolSpec,
    pub handler: Arc<dyn ToolHandler>,
}

/// Registry resolving tool names to their contract and callable.
///
/// Registration order is preserved; the serialized tool list always comes
/// out in the order tools were added.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    entries: Vec<ToolEntry>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new tool. Names are unique within a conversation;
    /// re-registering an existing name is a configuration error.
    pub fn register(
        &mut self,
        spec: ToolSpec,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<(), ChatError> {
        if self.has_tool(&spec.name) {
            return Err(ChatError::Configuration(format!(
                "tool '{}' is already registered",
                spec.name
            )));
        }
        self.entries.push(ToolEntry { spec, handler });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ToolEntry> {
        self.entries.iter().find(|entry| entry.spec.name == name)
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.spec.name.clone())
            .collect()
    }

    /// Serialized tool definitions in registration order.
    pub fn definitions(&self) -> Vec<Tool> {
        self.entries
            .iter()
            .map(|entry| entry.spec.to_definition())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tool::{ToolArguments, ToolOutput};
    use anyhow::Result;
    use async_trait::async_trait;

    struct MockTool;

    #[async_trait]
    impl ToolHandler for MockTool {
        async fn call(&self, _args: &ToolArguments) -> Result<ToolOutput> {
            Ok(ToolOutput::Text("mock result".to_string()))
        }
    }

    #[tokio::test]
    async fn register_and_resolve() {
        let mut registry = ToolRegistry::new();
        registry
            .register(ToolSpec::new("test_tool", "A test tool"), Arc::new(MockTool))
            .unwrap();

        assert!(registry.has_tool("test_tool"));
        assert!(!registry.has_tool("other_tool"));

        let entry = registry.get("test_tool").unwrap();
        let output = entry.handler.call(&ToolArguments::default()).await.unwrap();
        assert_eq!(output.into_text(), "mock result");
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut registry = ToolRegistry::new();
        registry
            .register(ToolSpec::new("dup", "first"), Arc::new(MockTool))
            .unwrap();
        let err = registry
            .register(ToolSpec::new("dup", "second"), Arc::new(MockTool))
            .unwrap_err();
        assert!(matches!(err, ChatError::Configuration(_)));
    }

    #[test]
    fn definitions_keep_registration_order() {
        let mut registry = ToolRegistry::new();
        registry
            .register(ToolSpec::new("zeta", ""), Arc::new(MockTool))
            .unwrap();
        registry
            .register(ToolSpec::new("alpha", ""), Arc::new(MockTool))
            .unwrap();

        let names: Vec<String> = registry
            .definitions()
            .into_iter()
            .map(|t| t.function.name)
            .collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }
}
