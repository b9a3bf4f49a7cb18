//! The knowledge store tool family: search, relation lookup, stats, fetch,
//! ingest, question answering, and raw querying across the fixed seven
//! collections.

use crate::context::ToolContext;
use crate::spec::{envelope, ToolAnnotations, ToolSpec};
use crate::util::system_instruction;
use scout_errors::ScoutError;
use scout_generative::{RequestContent, RequestMessage};
use scout_knowledge::{default_schema, search as run_search, SearchFilters};
use scout_types::{SearchType, ThinkingLevel};
use serde_json::{json, Value};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use uuid::Uuid;

fn collection_names() -> Vec<String> {
    default_schema().into_iter().map(|c| c.name).collect()
}

fn require_client(ctx: &ToolContext) -> Result<Arc<scout_knowledge::KnowledgeClient>, ScoutError> {
    ctx.knowledge_client.clone().ok_or_else(|| ScoutError::KnowledgeConnection("knowledge store is not configured".to_string()))
}

fn search_type_from(input: &Value) -> SearchType {
    match input.get("search_type").and_then(Value::as_str) {
        Some("semantic") => SearchType::Semantic,
        Some("keyword") => SearchType::Keyword,
        _ => SearchType::Hybrid,
    }
}

fn filters_from(input: &Value) -> SearchFilters {
    SearchFilters {
        evidence_tier: input.get("evidence_tier").and_then(Value::as_str).map(String::from),
        source_tool: input.get("source_tool").and_then(Value::as_str).map(String::from),
        date_from: input.get("date_from").and_then(Value::as_str).map(String::from),
        date_to: input.get("date_to").and_then(Value::as_str).map(String::from),
        category: input.get("category").and_then(Value::as_str).map(String::from),
        video_id: input.get("video_id").and_then(Value::as_str).map(String::from),
    }
}

fn collections_from(input: &Value) -> Vec<String> {
    input
        .get("collections")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .filter(|v: &Vec<String>| !v.is_empty())
        .unwrap_or_else(collection_names)
}

fn filters_schema_properties() -> Value {
    json!({
        "evidence_tier": {"type": "string", "enum": ["CONFIRMED", "STRONG_INDICATOR", "INFERENCE", "SPECULATION", "UNKNOWN"]},
        "source_tool": {"type": "string"},
        "date_from": {"type": "string"},
        "date_to": {"type": "string"},
        "category": {"type": "string"},
        "video_id": {"type": "string"}
    })
}

fn hits_to_json(hits: Vec<scout_types::KnowledgeHit>) -> Vec<Value> {
    hits.into_iter()
        .map(|h| json!({"collection": h.collection, "object_id": h.object_id, "score": h.score, "rerank_score": h.rerank_score, "summary": h.summary, "properties": h.properties}))
        .collect()
}

/// `knowledge_search`: semantic/keyword/hybrid search across the knowledge store.
pub struct KnowledgeSearch {
    pub ctx: Arc<ToolContext>,
}

impl ToolSpec for KnowledgeSearch {
    fn name(&self) -> &'static str {
        "knowledge_search"
    }
    fn description(&self) -> &'static str {
        "Search the knowledge store by query text, optionally restricted to specific collections and facet filters."
    }
    fn input_schema(&self) -> Value {
        let mut properties = filters_schema_properties();
        properties["query"] = json!({"type": "string", "minLength": 1});
        properties["collections"] = json!({"type": "array", "items": {"type": "string"}});
        properties["search_type"] = json!({"type": "string", "enum": ["hybrid", "semantic", "keyword"]});
        properties["limit"] = json!({"type": "integer", "minimum": 1, "maximum": 100});
        json!({"type": "object", "required": ["query"], "properties": properties})
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::read_only()
    }
    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Value> + Send + '_>> {
        Box::pin(async move { envelope(knowledge_search(&self.ctx, &input).await) })
    }
}

async fn knowledge_search(ctx: &ToolContext, input: &Value) -> Result<Value, ScoutError> {
    let client = require_client(ctx)?;
    let config = ctx.config.get();
    let query = input["query"].as_str().unwrap_or_default();
    let collections = collections_from(input);
    let search_type = search_type_from(input);
    let limit = input.get("limit").and_then(Value::as_u64).unwrap_or(10) as usize;
    let filters = filters_from(input);
    let flash_model = ctx.flash_model();

    let result = run_search(
        &client,
        query,
        &collections,
        search_type,
        limit,
        0.5,
        &filters,
        config.reranker_enabled,
        config.flash_summarize,
        Some(&ctx.generative),
        &flash_model,
    )
    .await?;

    Ok(json!({
        "reranked": result.reranked,
        "flash_processed": result.flash_processed,
        "filters_applied": result.filters_applied,
        "hits": hits_to_json(result.hits),
    }))
}

/// `knowledge_related`: find objects related to an existing object, by
/// re-querying its own collection using that object's rerank property as
/// the search text.
pub struct KnowledgeRelated {
    pub ctx: Arc<ToolContext>,
}

impl ToolSpec for KnowledgeRelated {
    fn name(&self) -> &'static str {
        "knowledge_related"
    }
    fn description(&self) -> &'static str {
        "Find knowledge store objects related to an existing object, within its own collection."
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["collection", "object_id"],
            "properties": {
                "collection": {"type": "string"},
                "object_id": {"type": "string"},
                "limit": {"type": "integer", "minimum": 1, "maximum": 100}
            }
        })
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::read_only()
    }
    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Value> + Send + '_>> {
        Box::pin(async move { envelope(knowledge_related(&self.ctx, &input).await) })
    }
}

async fn knowledge_related(ctx: &ToolContext, input: &Value) -> Result<Value, ScoutError> {
    let client = require_client(ctx)?;
    let config = ctx.config.get();
    let collection = input["collection"].as_str().unwrap_or_default();
    let object_id = input["object_id"].as_str().unwrap_or_default();
    let limit = input.get("limit").and_then(Value::as_u64).unwrap_or(10) as usize;

    let schema = default_schema();
    let def = schema
        .iter()
        .find(|c| c.name == collection)
        .ok_or_else(|| ScoutError::ApiInvalidArgument(format!("unknown collection: {collection}")))?;

    let object = client
        .get_object(collection, object_id)
        .await?
        .ok_or_else(|| ScoutError::ApiNotFound(format!("{collection}/{object_id}")))?;

    let query = object
        .get(&def.rerank_property)
        .and_then(Value::as_str)
        .ok_or_else(|| ScoutError::ApiInvalidArgument(format!("object has no usable {} text", def.rerank_property)))?;

    let flash_model = ctx.flash_model();
    let result = run_search(
        &client,
        query,
        std::slice::from_ref(&collection.to_string()),
        SearchType::Hybrid,
        limit + 1,
        0.5,
        &SearchFilters::default(),
        config.reranker_enabled,
        config.flash_summarize,
        Some(&ctx.generative),
        &flash_model,
    )
    .await?;

    let hits: Vec<_> = result.hits.into_iter().filter(|h| h.object_id != object_id).take(limit).collect();
    Ok(json!({"collection": collection, "object_id": object_id, "hits": hits_to_json(hits)}))
}

/// `knowledge_stats`: aggregate per-collection object counts from the backend.
pub struct KnowledgeStats {
    pub ctx: Arc<ToolContext>,
}

impl ToolSpec for KnowledgeStats {
    fn name(&self) -> &'static str {
        "knowledge_stats"
    }
    fn description(&self) -> &'static str {
        "Report aggregate object counts per knowledge store collection."
    }
    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::read_only()
    }
    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Value> + Send + '_>> {
        Box::pin(async move { envelope(knowledge_stats(&self.ctx, &input).await) })
    }
}

async fn knowledge_stats(ctx: &ToolContext, _input: &Value) -> Result<Value, ScoutError> {
    let client = require_client(ctx)?;
    let stats = client.stats().await?;
    Ok(json!({"collections": collection_names(), "stats": stats}))
}

/// `knowledge_fetch`: fetch a single object by collection and id.
pub struct KnowledgeFetch {
    pub ctx: Arc<ToolContext>,
}

impl ToolSpec for KnowledgeFetch {
    fn name(&self) -> &'static str {
        "knowledge_fetch"
    }
    fn description(&self) -> &'static str {
        "Fetch a single knowledge store object by collection and object id."
    }
    fn input_schema(&self) -> Value {
        json!({"type": "object", "required": ["collection", "object_id"], "properties": {"collection": {"type": "string"}, "object_id": {"type": "string"}}})
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::read_only()
    }
    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Value> + Send + '_>> {
        Box::pin(async move { envelope(knowledge_fetch(&self.ctx, &input).await) })
    }
}

async fn knowledge_fetch(ctx: &ToolContext, input: &Value) -> Result<Value, ScoutError> {
    let client = require_client(ctx)?;
    let collection = input["collection"].as_str().unwrap_or_default();
    let object_id = input["object_id"].as_str().unwrap_or_default();
    let object = client
        .get_object(collection, object_id)
        .await?
        .ok_or_else(|| ScoutError::ApiNotFound(format!("{collection}/{object_id}")))?;
    Ok(json!({"collection": collection, "object_id": object_id, "properties": object}))
}

/// `knowledge_ingest`: write an arbitrary object into one of the fixed collections.
pub struct KnowledgeIngest {
    pub ctx: Arc<ToolContext>,
}

impl ToolSpec for KnowledgeIngest {
    fn name(&self) -> &'static str {
        "knowledge_ingest"
    }
    fn description(&self) -> &'static str {
        "Write an object directly into a knowledge store collection, bypassing the generative write-through pipeline."
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["collection", "properties"],
            "properties": {"collection": {"type": "string"}, "object_id": {"type": "string"}, "properties": {"type": "object"}}
        })
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::idempotent_write()
    }
    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Value> + Send + '_>> {
        Box::pin(async move { envelope(knowledge_ingest(&self.ctx, &input).await) })
    }
}

async fn knowledge_ingest(ctx: &ToolContext, input: &Value) -> Result<Value, ScoutError> {
    let client = require_client(ctx)?;
    let collection = input["collection"].as_str().unwrap_or_default();
    if !collection_names().iter().any(|c| c == collection) {
        return Err(ScoutError::ApiInvalidArgument(format!("unknown collection: {collection}")));
    }
    let object_id = input.get("object_id").and_then(Value::as_str).map(String::from).unwrap_or_else(|| Uuid::new_v4().to_string());
    let properties = input.get("properties").cloned().unwrap_or_else(|| json!({}));

    client.put_object(collection, &object_id, properties).await?;
    Ok(json!({"collection": collection, "object_id": object_id}))
}

/// `knowledge_ask`: search then synthesize a direct answer from the hits.
pub struct KnowledgeAsk {
    pub ctx: Arc<ToolContext>,
}

impl ToolSpec for KnowledgeAsk {
    fn name(&self) -> &'static str {
        "knowledge_ask"
    }
    fn description(&self) -> &'static str {
        "Answer a question by searching the knowledge store and synthesizing a grounded response from the hits."
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["question"],
            "properties": {"question": {"type": "string", "minLength": 1}, "collections": {"type": "array", "items": {"type": "string"}}, "limit": {"type": "integer", "minimum": 1, "maximum": 50}}
        })
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::idempotent_write()
    }
    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Value> + Send + '_>> {
        Box::pin(async move { envelope(knowledge_ask(&self.ctx, &input).await) })
    }
}

fn ask_answer_schema() -> Value {
    json!({
        "type": "object",
        "required": ["answer"],
        "properties": {"answer": {"type": "string"}, "confidence": {"type": "number", "minimum": 0, "maximum": 1}}
    })
}

async fn knowledge_ask(ctx: &ToolContext, input: &Value) -> Result<Value, ScoutError> {
    let client = require_client(ctx)?;
    let config = ctx.config.get();
    let question = input["question"].as_str().unwrap_or_default();
    let collections = collections_from(input);
    let limit = input.get("limit").and_then(Value::as_u64).unwrap_or(8) as usize;
    let flash_model = ctx.flash_model();

    let result = run_search(
        &client,
        question,
        &collections,
        SearchType::Hybrid,
        limit,
        0.5,
        &SearchFilters::default(),
        config.reranker_enabled,
        config.flash_summarize,
        Some(&ctx.generative),
        &flash_model,
    )
    .await?;

    if result.hits.is_empty() {
        return Ok(json!({"answer": "No relevant knowledge store entries were found for this question.", "sources": []}));
    }

    let context: Vec<Value> = result
        .hits
        .iter()
        .map(|h| json!({"collection": h.collection, "object_id": h.object_id, "summary": h.summary, "properties": h.properties}))
        .collect();
    let prompt = format!(
        "Answer this question using only the supporting knowledge store entries below. If the entries do not \
         support a confident answer, say so.\n\nQuestion: {question}\n\nEntries: {}",
        serde_json::to_string(&context).unwrap_or_default()
    );
    let messages = vec![RequestMessage { role: "user".to_string(), content: RequestContent::Text(prompt) }];

    let (default_model, _, _) = ctx.model_defaults();
    let answer = ctx
        .generative
        .generate_structured(messages, &default_model, ThinkingLevel::Medium, 0.3, Some(&system_instruction("knowledge_ask")), &ask_answer_schema(), Vec::new())
        .await?;

    Ok(json!({"answer": answer["answer"], "confidence": answer.get("confidence"), "sources": hits_to_json(result.hits)}))
}

/// `knowledge_query`: raw, low-level search with explicit collection scope
/// and no forced reranking/summarization — for programmatic callers that
/// want full control over what they get back.
pub struct KnowledgeQuery {
    pub ctx: Arc<ToolContext>,
}

impl ToolSpec for KnowledgeQuery {
    fn name(&self) -> &'static str {
        "knowledge_query"
    }
    fn description(&self) -> &'static str {
        "Run a raw knowledge store query against explicit collections, bypassing reranking and Flash summarization by default."
    }
    fn input_schema(&self) -> Value {
        let mut properties = filters_schema_properties();
        properties["query"] = json!({"type": "string", "minLength": 1});
        properties["collections"] = json!({"type": "array", "items": {"type": "string"}, "minItems": 1});
        properties["search_type"] = json!({"type": "string", "enum": ["hybrid", "semantic", "keyword"]});
        properties["limit"] = json!({"type": "integer", "minimum": 1, "maximum": 100});
        properties["alpha"] = json!({"type": "number", "minimum": 0, "maximum": 1});
        json!({"type": "object", "required": ["query", "collections"], "properties": properties})
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::read_only()
    }
    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Value> + Send + '_>> {
        Box::pin(async move { envelope(knowledge_query(&self.ctx, &input).await) })
    }
}

async fn knowledge_query(ctx: &ToolContext, input: &Value) -> Result<Value, ScoutError> {
    let client = require_client(ctx)?;
    let query = input["query"].as_str().unwrap_or_default();
    let collections: Vec<String> =
        input["collections"].as_array().map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect()).unwrap_or_default();
    if collections.is_empty() {
        return Err(ScoutError::ApiInvalidArgument("collections must be a non-empty array".to_string()));
    }
    let search_type = search_type_from(input);
    let limit = input.get("limit").and_then(Value::as_u64).unwrap_or(10) as usize;
    let alpha = input.get("alpha").and_then(Value::as_f64).unwrap_or(0.5);
    let filters = filters_from(input);

    let result = run_search(&client, query, &collections, search_type, limit, alpha, &filters, false, false, None, "").await?;

    Ok(json!({"filters_applied": result.filters_applied, "hits": hits_to_json(result.hits)}))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_names_covers_the_fixed_seven() {
        let names = collection_names();
        assert_eq!(names.len(), 7);
        assert!(names.contains(&"VideoAnalyses".to_string()));
        assert!(names.contains(&"WebSearchResults".to_string()));
    }

    #[test]
    fn collections_from_defaults_to_all_when_absent() {
        let collections = collections_from(&json!({}));
        assert_eq!(collections.len(), 7);
    }

    #[test]
    fn collections_from_honors_explicit_subset() {
        let collections = collections_from(&json!({"collections": ["VideoAnalyses"]}));
        assert_eq!(collections, vec!["VideoAnalyses".to_string()]);
    }

    #[test]
    fn search_type_from_defaults_to_hybrid() {
        assert_eq!(search_type_from(&json!({})), SearchType::Hybrid);
    }
}
