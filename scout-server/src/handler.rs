//! MCP server that exposes a [`ToolCatalog`] over stdio.
//!
//! Mirrors `neuron-mcp::server::McpServer` almost unchanged, generalized to
//! dispatch into [`ToolCatalog`] instead of `neuron_tool::ToolRegistry`: the
//! catalog already turns every outcome (success, validation failure,
//! unknown tool, handler error) into a plain JSON envelope, so
//! `call_tool` here never has a failure branch of its own to report —
//! it always returns [`CallToolResult::success`].

use std::borrow::Cow;
use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, Implementation, ListToolsResult, PaginatedRequestParams,
    ProtocolVersion, ServerCapabilities, ServerInfo, Tool as McpTool,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::transport::io::stdio;
use rmcp::{ErrorData, ServerHandler, ServiceExt};

use scout_tools::ToolCatalog;

/// MCP server wrapping a [`ToolCatalog`].
///
/// Call [`serve_stdio`](ScoutServer::serve_stdio) to start serving via
/// stdin/stdout; it blocks until the client disconnects.
pub struct ScoutServer {
    catalog: Arc<ToolCatalog>,
    name: String,
    version: String,
}

impl ScoutServer {
    /// Wrap a catalog for MCP service under `name`/`version`.
    pub fn new(catalog: Arc<ToolCatalog>, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self { catalog, name: name.into(), version: version.into() }
    }

    /// Serve the catalog over stdio until the client disconnects.
    pub async fn serve_stdio(self) -> Result<(), scout_errors::ScoutError> {
        let transport = stdio();
        let handler = ScoutMcpHandler { catalog: self.catalog, name: self.name, version: self.version };
        let service = handler
            .serve(transport)
            .await
            .map_err(|e| scout_errors::ScoutError::Other(Box::new(e)))?;
        service
            .waiting()
            .await
            .map_err(|e| scout_errors::ScoutError::Other(Box::new(e)))?;
        Ok(())
    }
}

struct ScoutMcpHandler {
    catalog: Arc<ToolCatalog>,
    name: String,
    version: String,
}

impl ServerHandler for ScoutMcpHandler {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation { name: self.name.clone(), version: self.version.clone(), ..Default::default() },
            instructions: None,
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        let tools: Vec<McpTool> = self
            .catalog
            .descriptors()
            .into_iter()
            .map(|descriptor| {
                let schema_obj = descriptor.input_schema.as_object().cloned().unwrap_or_default();
                McpTool {
                    name: Cow::Owned(descriptor.name),
                    title: None,
                    description: Some(Cow::Owned(descriptor.description)),
                    input_schema: Arc::new(schema_obj),
                    output_schema: None,
                    annotations: None,
                    execution: None,
                    icons: None,
                    meta: None,
                }
            })
            .collect();

        Ok(ListToolsResult::with_all_items(tools))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let tool_name = request.name.to_string();
        let input = match request.arguments {
            Some(map) => serde_json::Value::Object(map),
            None => serde_json::Value::Object(serde_json::Map::new()),
        };

        let result = scout_tracing::trace(&tool_name, scout_tracing::TOOL_SPAN, self.catalog.call(&tool_name, input)).await;

        let text = serde_json::to_string_pretty(&result).unwrap_or_else(|_| result.to_string());
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_tools::{ToolAnnotations, ToolSpec};
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
        fn input_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object"})
        }
        fn annotations(&self) -> ToolAnnotations {
            ToolAnnotations::read_only()
        }
        fn call(&self, input: serde_json::Value) -> Pin<Box<dyn Future<Output = serde_json::Value> + Send + '_>> {
            Box::pin(async move { input })
        }
    }

    fn catalog_with_echo() -> Arc<ToolCatalog> {
        let mut catalog = ToolCatalog::new();
        catalog.register(Arc::new(EchoTool));
        Arc::new(catalog)
    }

    #[test]
    fn server_constructs_and_reports_its_identity() {
        let server = ScoutServer::new(catalog_with_echo(), "scout-mcp", "0.1.0");
        assert_eq!(server.name, "scout-mcp");
        assert_eq!(server.version, "0.1.0");
    }

    #[tokio::test]
    async fn dispatch_through_the_wrapped_catalog_matches_a_direct_call() {
        let catalog = catalog_with_echo();
        let direct = catalog.call("echo", serde_json::json!({"text": "hi"})).await;
        let traced = scout_tracing::trace(
            "echo",
            scout_tracing::TOOL_SPAN,
            catalog.call("echo", serde_json::json!({"text": "hi"})),
        )
        .await;
        assert_eq!(direct, traced);
    }

    #[tokio::test]
    async fn dispatch_to_an_unknown_tool_resolves_to_an_error_envelope_not_a_panic() {
        let catalog = catalog_with_echo();
        let result = catalog.call("missing", serde_json::json!({})).await;
        assert_eq!(result["category"], "API_NOT_FOUND");
    }
}
