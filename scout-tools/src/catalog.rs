//! The closed tool registry, modeled on `neuron-tool::ToolRegistry`:
//! `name -> Arc<dyn ToolSpec>`, registered once at startup and dispatched by
//! name from the MCP transport layer.

use crate::spec::{envelope, validate_input, ToolSpec};
use scout_errors::ScoutError;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A single tool's schema + annotations, as surfaced to an upstream client
/// listing the catalog.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ToolDescriptor {
    /// The tool's wire name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema inputs are validated against.
    pub input_schema: Value,
}

/// The registered set of tools this server process exposes.
#[derive(Default, Clone)]
pub struct ToolCatalog {
    tools: HashMap<String, Arc<dyn ToolSpec>>,
}

impl ToolCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        ToolCatalog { tools: HashMap::new() }
    }

    /// Register a tool. Replaces any prior registration under the same name.
    pub fn register(&mut self, tool: Arc<dyn ToolSpec>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolSpec>> {
        self.tools.get(name).cloned()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the catalog has no registered tools.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Descriptors for every registered tool, for an upstream `tools/list`.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        let mut out: Vec<ToolDescriptor> = self
            .tools
            .values()
            .map(|tool| ToolDescriptor {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                input_schema: tool.input_schema(),
            })
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Validate `input` against the named tool's schema, then dispatch.
    /// Unknown tool names and schema-validation failures both resolve to
    /// the error envelope rather than panicking the dispatch loop.
    pub async fn call(&self, name: &str, input: Value) -> Value {
        let Some(tool) = self.get(name) else {
            return envelope(Err(ScoutError::ApiNotFound(format!("unknown tool: {name}"))));
        };
        if let Err(err) = validate_input(&input, &tool.input_schema()) {
            return envelope(Err(err));
        }
        tool.call(input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::ToolAnnotations;
    use std::future::Future;
    use std::pin::Pin;

    struct EchoTool;

    impl ToolSpec for EchoTool {
        fn name(&self) -> &'static str {
            "echo"
        }
        fn description(&self) -> &'static str {
            "echoes its input"
        }
        fn input_schema(&self) -> Value {
            serde_json::json!({"type": "object", "required": ["text"]})
        }
        fn annotations(&self) -> ToolAnnotations {
            ToolAnnotations::read_only()
        }
        fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Value> + Send + '_>> {
            Box::pin(async move { input })
        }
    }

    fn catalog_with_echo() -> ToolCatalog {
        let mut catalog = ToolCatalog::new();
        catalog.register(Arc::new(EchoTool));
        catalog
    }

    #[tokio::test]
    async fn calling_unknown_tool_returns_not_found_envelope() {
        let catalog = ToolCatalog::new();
        let result = catalog.call("nope", serde_json::json!({})).await;
        assert_eq!(result["category"], "API_NOT_FOUND");
    }

    #[tokio::test]
    async fn calling_known_tool_dispatches_to_handler() {
        let catalog = catalog_with_echo();
        let result = catalog.call("echo", serde_json::json!({"text": "hi"})).await;
        assert_eq!(result["text"], "hi");
    }

    #[tokio::test]
    async fn input_failing_schema_never_reaches_the_handler() {
        let catalog = catalog_with_echo();
        let result = catalog.call("echo", serde_json::json!({})).await;
        assert_eq!(result["category"], "API_INVALID_ARGUMENT");
    }

    #[test]
    fn descriptors_are_sorted_by_name() {
        let mut catalog = ToolCatalog::new();
        catalog.register(Arc::new(EchoTool));
        let descriptors = catalog.descriptors();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].name, "echo");
    }
}
