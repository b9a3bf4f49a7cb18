//! The standalone web search tool, backed by the generative backend's
//! request-scoped grounding-search tool wiring rather than a bespoke HTTP
//! client.

use crate::context::ToolContext;
use crate::spec::{envelope, ToolAnnotations, ToolSpec};
use crate::util::system_instruction;
use scout_errors::ScoutError;
use scout_generative::{RequestContent, RequestMessage};
use scout_types::ThinkingLevel;
use serde_json::{json, Value};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

fn results_schema() -> Value {
    json!({
        "type": "object",
        "required": ["results"],
        "properties": {
            "results": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["title", "url"],
                    "properties": {"title": {"type": "string"}, "url": {"type": "string"}, "snippet": {"type": "string"}}
                }
            }
        }
    })
}

/// `web_search`: grounded web search via the generative backend's search tool.
pub struct WebSearch {
    pub ctx: Arc<ToolContext>,
}

impl ToolSpec for WebSearch {
    fn name(&self) -> &'static str {
        "web_search"
    }
    fn description(&self) -> &'static str {
        "Search the web and return structured results (title, url, snippet)."
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["query"],
            "properties": {"query": {"type": "string", "minLength": 1}, "limit": {"type": "integer", "minimum": 1, "maximum": 50}}
        })
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::read_only()
    }
    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Value> + Send + '_>> {
        Box::pin(async move { envelope(web_search(&self.ctx, &input).await) })
    }
}

async fn web_search(ctx: &ToolContext, input: &Value) -> Result<Value, ScoutError> {
    let query = input["query"].as_str().unwrap_or_default();
    let limit = input.get("limit").and_then(Value::as_u64).unwrap_or(10);
    let flash_model = ctx.flash_model();

    let prompt = format!("Search the web for: {query}\n\nReturn up to {limit} of the most relevant results.");
    let messages = vec![RequestMessage { role: "user".to_string(), content: RequestContent::Text(prompt) }];
    let tools = vec![json!({"type": "web_search"})];

    let result = ctx
        .generative
        .generate_structured(messages, &flash_model, ThinkingLevel::Low, 0.2, Some(&system_instruction("web_search")), &results_schema(), tools)
        .await?;

    let query_hash = blake3::hash(query.as_bytes()).to_hex().to_string();
    ctx.knowledge_sink.store_web_search_result(&query_hash, result.clone()).await;

    Ok(json!({"query": query, "query_hash": query_hash, "results": result["results"]}))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_schema_requires_title_and_url() {
        let schema = results_schema();
        let item_schema = &schema["properties"]["results"]["items"];
        let required: Vec<&str> = item_schema["required"].as_array().unwrap().iter().map(|v| v.as_str().unwrap()).collect();
        assert!(required.contains(&"title"));
        assert!(required.contains(&"url"));
    }
}
