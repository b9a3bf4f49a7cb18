//! Generic (non-video) content analysis and extraction tools: local files or
//! remote documents, routed through the upload coordinator like any other
//! multimodal reference.

use crate::context::ToolContext;
use crate::spec::{envelope, ToolAnnotations, ToolSpec};
use crate::util::{content_ref_block, file_content_id, guess_mime_type, system_instruction};
use futures::future::join_all;
use scout_errors::ScoutError;
use scout_generative::{RequestBlock, RequestContent, RequestMessage};
use scout_types::ThinkingLevel;
use serde_json::{json, Value};
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Semaphore;

const BATCH_CONCURRENCY: usize = 3;

struct ResolvedSource {
    label: String,
    content_id: String,
    bytes: Vec<u8>,
    mime_type: String,
}

async fn resolve_source(ctx: &ToolContext, input: &Value) -> Result<ResolvedSource, ScoutError> {
    if let Some(path_str) = input.get("path").and_then(Value::as_str) {
        let config = ctx.config.get();
        let resolved = scout_policy::enforce_local_access_root(&PathBuf::from(path_str), config.local_file_access_root.as_deref())?;
        let (content_id, bytes) = file_content_id(&resolved).await?;
        return Ok(ResolvedSource { label: path_str.to_string(), content_id, mime_type: guess_mime_type(path_str).to_string(), bytes });
    }
    if let Some(url) = input.get("url").and_then(Value::as_str) {
        scout_policy::validate_url_resolved(url, &ctx.url_policy).await?;
        let response = scout_policy::download_checked(&ctx.http, url, &ctx.url_policy).await?;
        let bytes = response.bytes().await.map_err(|e| ScoutError::NetworkError(e.to_string()))?.to_vec();
        let content_id = blake3::hash(&bytes).to_hex().to_string();
        return Ok(ResolvedSource { label: url.to_string(), content_id, mime_type: guess_mime_type(url).to_string(), bytes });
    }
    Err(ScoutError::ApiInvalidArgument("either \"path\" or \"url\" is required".to_string()))
}

fn analysis_schema() -> Value {
    json!({
        "type": "object",
        "required": ["summary", "key_points"],
        "properties": {
            "summary": {"type": "string"},
            "key_points": {"type": "array", "items": {"type": "string"}},
            "entities": {"type": "array", "items": {"type": "string"}}
        }
    })
}

async fn analyze_one(ctx: &ToolContext, input: &Value, instruction: &str, model: &str) -> Result<Value, ScoutError> {
    let source = resolve_source(ctx, input).await?;

    if let Some(entry) = ctx.cache.load(&source.content_id, "content_analyze", Some(instruction), model).await? {
        return Ok(json!({
            "content_id": source.content_id,
            "source": source.label,
            "cached": true,
            "analysis": entry.analysis,
        }));
    }

    let content_ref = ctx.upload.prepare(source.bytes, &source.mime_type).await?;
    let blocks = vec![RequestBlock::Text { text: instruction.to_string() }, content_ref_block(&content_ref)];
    let messages = vec![RequestMessage { role: "user".to_string(), content: RequestContent::Blocks(blocks) }];

    let analysis = ctx
        .generative
        .generate_structured(messages, model, ThinkingLevel::Medium, 0.4, Some(&system_instruction("content_analyze")), &analysis_schema(), Vec::new())
        .await?;

    ctx.cache.save(&source.content_id, "content_analyze", Some(instruction), model, analysis.clone()).await?;
    ctx.knowledge_sink.store_content_analysis(&source.content_id, analysis.clone(), "content_analyze").await;

    Ok(json!({"content_id": source.content_id, "source": source.label, "cached": false, "analysis": analysis}))
}

/// `content_analyze`: structured analysis of a single local file or URL.
pub struct ContentAnalyze {
    pub ctx: Arc<ToolContext>,
}

impl ToolSpec for ContentAnalyze {
    fn name(&self) -> &'static str {
        "content_analyze"
    }
    fn description(&self) -> &'static str {
        "Analyze a single document or file (local path or URL) and return a structured summary."
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string"},
                "url": {"type": "string"},
                "instruction": {"type": "string"},
                "model": {"type": "string"}
            }
        })
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::idempotent_write()
    }
    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Value> + Send + '_>> {
        Box::pin(async move {
            let (default_model, _, _) = self.ctx.model_defaults();
            let instruction = input.get("instruction").and_then(Value::as_str).unwrap_or("Summarize this document's content and key points.");
            let model = input.get("model").and_then(Value::as_str).unwrap_or(&default_model);
            envelope(analyze_one(&self.ctx, &input, instruction, model).await)
        })
    }
}

/// `content_batch_analyze`: per-source analysis over a bounded set of local
/// files/URLs, fanned out under a semaphore of [`BATCH_CONCURRENCY`].
pub struct ContentBatchAnalyze {
    pub ctx: Arc<ToolContext>,
}

impl ToolSpec for ContentBatchAnalyze {
    fn name(&self) -> &'static str {
        "content_batch_analyze"
    }
    fn description(&self) -> &'static str {
        "Analyze multiple documents/files concurrently, each independently cached and error-isolated."
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["sources"],
            "properties": {
                "sources": {
                    "type": "array",
                    "minItems": 1,
                    "maxItems": 50,
                    "items": {"type": "object", "properties": {"path": {"type": "string"}, "url": {"type": "string"}}}
                },
                "instruction": {"type": "string"},
                "model": {"type": "string"}
            }
        })
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::idempotent_write()
    }
    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Value> + Send + '_>> {
        Box::pin(async move {
            let (default_model, _, _) = self.ctx.model_defaults();
            let instruction =
                input.get("instruction").and_then(Value::as_str).unwrap_or("Summarize this document's content and key points.").to_string();
            let model = input.get("model").and_then(Value::as_str).unwrap_or(&default_model).to_string();
            let sources: Vec<Value> = input["sources"].as_array().cloned().unwrap_or_default();

            let semaphore = Arc::new(Semaphore::new(BATCH_CONCURRENCY));
            let futures = sources.into_iter().map(|source| {
                let ctx = self.ctx.clone();
                let semaphore = semaphore.clone();
                let instruction = instruction.clone();
                let model = model.clone();
                async move {
                    let _permit = semaphore.acquire().await.expect("semaphore not closed");
                    match analyze_one(&ctx, &source, &instruction, &model).await {
                        Ok(result) => result,
                        Err(err) => json!({"source": source, "error": envelope(Err(err))}),
                    }
                }
            });
            let results: Vec<Value> = join_all(futures).await;
            json!({"results": results})
        })
    }
}

fn extraction_schema() -> Value {
    json!({
        "type": "object",
        "required": ["extracted_text"],
        "properties": {
            "extracted_text": {"type": "string"},
            "sections": {"type": "array", "items": {"type": "string"}}
        }
    })
}

/// `content_extract`: raw structured text extraction, uncached (each call may
/// want a different slice of the document).
pub struct ContentExtract {
    pub ctx: Arc<ToolContext>,
}

impl ToolSpec for ContentExtract {
    fn name(&self) -> &'static str {
        "content_extract"
    }
    fn description(&self) -> &'static str {
        "Extract the raw text and section structure of a document or file."
    }
    fn input_schema(&self) -> Value {
        json!({"type": "object", "properties": {"path": {"type": "string"}, "url": {"type": "string"}}})
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::read_only()
    }
    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Value> + Send + '_>> {
        Box::pin(async move { envelope(content_extract(&self.ctx, &input).await) })
    }
}

async fn content_extract(ctx: &ToolContext, input: &Value) -> Result<Value, ScoutError> {
    let (default_model, _, _) = ctx.model_defaults();
    let source = resolve_source(ctx, input).await?;
    let content_ref = ctx.upload.prepare(source.bytes, &source.mime_type).await?;
    let blocks =
        vec![RequestBlock::Text { text: "Extract the full text content and list its section headings.".to_string() }, content_ref_block(&content_ref)];
    let messages = vec![RequestMessage { role: "user".to_string(), content: RequestContent::Blocks(blocks) }];

    let extraction = ctx
        .generative
        .generate_structured(messages, &default_model, ThinkingLevel::Low, 0.2, Some(&system_instruction("content_extract")), &extraction_schema(), Vec::new())
        .await?;

    Ok(json!({"content_id": source.content_id, "source": source.label, "extraction": extraction}))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_schema_requires_summary() {
        let schema = analysis_schema();
        let required: Vec<&str> = schema["required"].as_array().unwrap().iter().map(|v| v.as_str().unwrap()).collect();
        assert!(required.contains(&"summary"));
    }

    #[test]
    fn extraction_schema_requires_extracted_text() {
        let schema = extraction_schema();
        let required: Vec<&str> = schema["required"].as_array().unwrap().iter().map(|v| v.as_str().unwrap()).collect();
        assert_eq!(required, vec!["extracted_text"]);
    }
}
