//! Video analysis, session, and metadata tools.

use crate::context::ToolContext;
use crate::spec::{envelope, ToolAnnotations, ToolSpec};
use crate::util::{cached_structured_generate, system_instruction, video_content_id};
use futures::future::join_all;
use scout_errors::ScoutError;
use scout_generative::{RequestContent, RequestMessage};
use scout_types::{HistoryPart, HistoryTurn, SessionId, ThinkingLevel};
use serde_json::{json, Value};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Batch tools bound their own fan-out to this many concurrent per-item calls.
const BATCH_CONCURRENCY: usize = 3;

fn analysis_schema() -> Value {
    json!({
        "type": "object",
        "required": ["summary", "key_points", "topics"],
        "properties": {
            "summary": {"type": "string"},
            "key_points": {"type": "array", "items": {"type": "string"}},
            "topics": {"type": "array", "items": {"type": "string"}},
            "notable_moments": {"type": "array", "items": {"type": "string"}}
        }
    })
}

fn thinking_level_from(input: &Value) -> ThinkingLevel {
    match input.get("thinking_level").and_then(Value::as_str) {
        Some("minimal") => ThinkingLevel::Minimal,
        Some("low") => ThinkingLevel::Low,
        Some("high") => ThinkingLevel::High,
        _ => ThinkingLevel::Medium,
    }
}

async fn analyze_one(ctx: &ToolContext, video_url: &str, instruction: &str, model: &str, thinking_level: ThinkingLevel) -> Result<Value, ScoutError> {
    scout_policy::validate_url_resolved(video_url, &ctx.url_policy).await?;
    let content_id = video_content_id(video_url);
    let prompt = format!("Video: {video_url}\n\nTask: {instruction}");
    let (analysis, cached) =
        cached_structured_generate(ctx, &content_id, "video_analyze", instruction, model, thinking_level, prompt, &analysis_schema())
            .await?;
    ctx.knowledge_sink.store_video_analysis(&content_id, analysis.clone(), "video_analyze").await;
    Ok(json!({"content_id": content_id, "video_url": video_url, "cached": cached, "analysis": analysis}))
}

/// `video_analyze`: single-video structured analysis, cache-backed.
pub struct VideoAnalyze {
    pub ctx: Arc<ToolContext>,
}

impl ToolSpec for VideoAnalyze {
    fn name(&self) -> &'static str {
        "video_analyze"
    }
    fn description(&self) -> &'static str {
        "Analyze a single video and return a structured summary, key points, and topics."
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["video_url"],
            "properties": {
                "video_url": {"type": "string", "minLength": 1},
                "instruction": {"type": "string"},
                "model": {"type": "string"},
                "thinking_level": {"type": "string", "enum": ["minimal", "low", "medium", "high"]}
            }
        })
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::idempotent_write()
    }
    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Value> + Send + '_>> {
        Box::pin(async move {
            let (default_model, default_thinking, _) = self.ctx.model_defaults();
            let video_url = input["video_url"].as_str().unwrap_or_default();
            let instruction =
                input.get("instruction").and_then(Value::as_str).unwrap_or("Summarize the video's content, key topics, and notable moments.");
            let model = input.get("model").and_then(Value::as_str).unwrap_or(&default_model);
            let thinking_level = input.get("thinking_level").map(|_| thinking_level_from(&input)).unwrap_or(default_thinking);
            envelope(analyze_one(&self.ctx, video_url, instruction, model, thinking_level).await)
        })
    }
}

/// `video_batch_analyze`: per-video analysis over a bounded set of URLs, fanned
/// out under a semaphore of [`BATCH_CONCURRENCY`]. A single video's failure
/// never aborts the batch; it is reported inline alongside the other results.
pub struct VideoBatchAnalyze {
    pub ctx: Arc<ToolContext>,
}

impl ToolSpec for VideoBatchAnalyze {
    fn name(&self) -> &'static str {
        "video_batch_analyze"
    }
    fn description(&self) -> &'static str {
        "Analyze multiple videos concurrently, each independently cached and error-isolated."
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["video_urls"],
            "properties": {
                "video_urls": {"type": "array", "items": {"type": "string"}, "minItems": 1, "maxItems": 50},
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
            let (default_model, default_thinking, _) = self.ctx.model_defaults();
            let instruction =
                input.get("instruction").and_then(Value::as_str).unwrap_or("Summarize the video's content, key topics, and notable moments.").to_string();
            let model = input.get("model").and_then(Value::as_str).unwrap_or(&default_model).to_string();
            let urls: Vec<String> =
                input["video_urls"].as_array().map(|a| a.iter().filter_map(|v| v.as_str().map(String::from)).collect()).unwrap_or_default();

            let semaphore = Arc::new(Semaphore::new(BATCH_CONCURRENCY));
            let futures = urls.into_iter().map(|url| {
                let ctx = self.ctx.clone();
                let semaphore = semaphore.clone();
                let instruction = instruction.clone();
                let model = model.clone();
                async move {
                    let _permit = semaphore.acquire().await.expect("semaphore not closed");
                    match analyze_one(&ctx, &url, &instruction, &model, default_thinking).await {
                        Ok(result) => result,
                        Err(err) => json!({"video_url": url, "error": envelope(Err(err))}),
                    }
                }
            });
            let results: Vec<Value> = join_all(futures).await;
            json!({"results": results})
        })
    }
}

/// `video_create_session`: start a new multi-turn conversation grounded in a video.
pub struct VideoCreateSession {
    pub ctx: Arc<ToolContext>,
}

impl ToolSpec for VideoCreateSession {
    fn name(&self) -> &'static str {
        "video_create_session"
    }
    fn description(&self) -> &'static str {
        "Create a multi-turn conversation session grounded in a single video."
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["video_url"],
            "properties": {
                "video_url": {"type": "string", "minLength": 1},
                "title": {"type": "string"},
                "model": {"type": "string"}
            }
        })
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations { read_only: false, destructive: false, idempotent: false }
    }
    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Value> + Send + '_>> {
        Box::pin(async move {
            envelope(create_session(&self.ctx, &input).await)
        })
    }
}

async fn create_session(ctx: &ToolContext, input: &Value) -> Result<Value, ScoutError> {
    let (default_model, _, _) = ctx.model_defaults();
    let video_url = input["video_url"].as_str().unwrap_or_default();
    scout_policy::validate_url_resolved(video_url, &ctx.url_policy).await?;
    let content_id = video_content_id(video_url);
    let title = input.get("title").and_then(Value::as_str).unwrap_or(&content_id).to_string();
    let model = input.get("model").and_then(Value::as_str).unwrap_or(&default_model).to_string();

    let session = ctx.sessions.create(content_id, title, model).await;
    Ok(json!({
        "session_id": session.id.as_str(),
        "content_ref": session.content_ref,
        "title": session.title,
        "model_key": session.model_key,
        "created_at": session.created_at.to_rfc3339(),
    }))
}

/// `video_continue_session`: append a turn to an existing session.
pub struct VideoContinueSession {
    pub ctx: Arc<ToolContext>,
}

impl ToolSpec for VideoContinueSession {
    fn name(&self) -> &'static str {
        "video_continue_session"
    }
    fn description(&self) -> &'static str {
        "Send a follow-up message in an existing video session and get the model's reply."
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["session_id", "message"],
            "properties": {
                "session_id": {"type": "string", "minLength": 1},
                "message": {"type": "string", "minLength": 1}
            }
        })
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations { read_only: false, destructive: false, idempotent: false }
    }
    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Value> + Send + '_>> {
        Box::pin(async move { envelope(continue_session(&self.ctx, &input).await) })
    }
}

async fn continue_session(ctx: &ToolContext, input: &Value) -> Result<Value, ScoutError> {
    let session_id = SessionId::new(input["session_id"].as_str().unwrap_or_default());
    let message = input["message"].as_str().unwrap_or_default();

    let session = ctx
        .sessions
        .get(&session_id)
        .await
        .ok_or_else(|| ScoutError::ApiNotFound(format!("no such session: {session_id}")))?;

    let mut messages: Vec<RequestMessage> = session
        .history
        .iter()
        .map(|turn| {
            let text = turn
                .parts
                .iter()
                .map(|part| match part {
                    HistoryPart::Text { text } => text.clone(),
                    HistoryPart::FileRef { uri, .. } => uri.clone(),
                })
                .collect::<Vec<_>>()
                .join("");
            RequestMessage { role: turn.role.clone(), content: RequestContent::Text(text) }
        })
        .collect();
    messages.push(RequestMessage { role: "user".to_string(), content: RequestContent::Text(message.to_string()) });

    let instruction = system_instruction("video_continue_session");
    let response = ctx
        .generative
        .generate(messages, &session.model_key, ThinkingLevel::Medium, 0.7, Some(instruction.as_str()), None, Vec::new())
        .await?;

    let user_turn = HistoryTurn { role: "user".to_string(), parts: vec![HistoryPart::Text { text: message.to_string() }] };
    let model_turn = HistoryTurn { role: "model".to_string(), parts: vec![HistoryPart::Text { text: response.clone() }] };
    let updated = ctx.sessions.append_turn(&session_id, user_turn, model_turn).await?;

    ctx.knowledge_sink
        .store_session_transcript(session_id.as_str(), updated.turn_count, json!({"message": message, "response": response}))
        .await;

    Ok(json!({"session_id": session_id.as_str(), "response": response, "turn_count": updated.turn_count}))
}

fn metadata_schema() -> Value {
    json!({
        "type": "object",
        "required": ["title"],
        "properties": {
            "title": {"type": "string"},
            "channel": {"type": "string"},
            "duration_seconds": {"type": "number"},
            "published_at": {"type": "string"},
            "view_count": {"type": "number"},
            "description": {"type": "string"}
        }
    })
}

/// `video_metadata`: structured, cached video metadata lookup.
pub struct VideoMetadata {
    pub ctx: Arc<ToolContext>,
}

impl ToolSpec for VideoMetadata {
    fn name(&self) -> &'static str {
        "video_metadata"
    }
    fn description(&self) -> &'static str {
        "Fetch structured metadata (title, channel, duration, description) for a video."
    }
    fn input_schema(&self) -> Value {
        json!({"type": "object", "required": ["video_url"], "properties": {"video_url": {"type": "string", "minLength": 1}}})
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::idempotent_write()
    }
    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Value> + Send + '_>> {
        Box::pin(async move { envelope(video_metadata(&self.ctx, &input).await) })
    }
}

async fn video_metadata(ctx: &ToolContext, input: &Value) -> Result<Value, ScoutError> {
    let (default_model, _, _) = ctx.model_defaults();
    let video_url = input["video_url"].as_str().unwrap_or_default();
    scout_policy::validate_url_resolved(video_url, &ctx.url_policy).await?;
    let content_id = video_content_id(video_url);
    let prompt = format!("Video: {video_url}\n\nReturn structured metadata for this video.");

    let (metadata, cached) =
        cached_structured_generate(ctx, &content_id, "video_metadata", "metadata", &default_model, ThinkingLevel::Low, prompt, &metadata_schema())
            .await?;
    ctx.knowledge_sink.store_video_metadata(&content_id, metadata.clone()).await;
    Ok(json!({"content_id": content_id, "cached": cached, "metadata": metadata}))
}

fn comments_schema() -> Value {
    json!({
        "type": "object",
        "required": ["comments"],
        "properties": {
            "comments": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["author", "text"],
                    "properties": {"author": {"type": "string"}, "text": {"type": "string"}, "likes": {"type": "number"}}
                }
            }
        }
    })
}

/// `video_comments`: structured, cached top-comments lookup.
pub struct VideoComments {
    pub ctx: Arc<ToolContext>,
}

impl ToolSpec for VideoComments {
    fn name(&self) -> &'static str {
        "video_comments"
    }
    fn description(&self) -> &'static str {
        "Fetch a structured sample of top comments for a video."
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["video_url"],
            "properties": {"video_url": {"type": "string", "minLength": 1}, "limit": {"type": "integer", "minimum": 1, "maximum": 200}}
        })
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::read_only()
    }
    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Value> + Send + '_>> {
        Box::pin(async move { envelope(video_comments(&self.ctx, &input).await) })
    }
}

async fn video_comments(ctx: &ToolContext, input: &Value) -> Result<Value, ScoutError> {
    let (default_model, _, _) = ctx.model_defaults();
    let video_url = input["video_url"].as_str().unwrap_or_default();
    scout_policy::validate_url_resolved(video_url, &ctx.url_policy).await?;
    let content_id = video_content_id(video_url);
    let limit = input.get("limit").and_then(Value::as_u64).unwrap_or(20);
    let prompt = format!("Video: {video_url}\n\nReturn up to {limit} representative top-level comments.");

    let (result, cached) =
        cached_structured_generate(ctx, &content_id, "video_comments", "comments", &default_model, ThinkingLevel::Low, prompt, &comments_schema())
            .await?;
    Ok(json!({"content_id": content_id, "cached": cached, "comments": result["comments"]}))
}

fn playlist_schema() -> Value {
    json!({
        "type": "object",
        "required": ["title", "items"],
        "properties": {
            "title": {"type": "string"},
            "items": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["video_id", "title"],
                    "properties": {"video_id": {"type": "string"}, "title": {"type": "string"}}
                }
            }
        }
    })
}

/// `video_playlist`: structured, cached playlist listing.
pub struct VideoPlaylist {
    pub ctx: Arc<ToolContext>,
}

impl ToolSpec for VideoPlaylist {
    fn name(&self) -> &'static str {
        "video_playlist"
    }
    fn description(&self) -> &'static str {
        "List the videos in a playlist with structured titles and ids."
    }
    fn input_schema(&self) -> Value {
        json!({"type": "object", "required": ["playlist_url"], "properties": {"playlist_url": {"type": "string", "minLength": 1}}})
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::read_only()
    }
    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Value> + Send + '_>> {
        Box::pin(async move { envelope(video_playlist(&self.ctx, &input).await) })
    }
}

async fn video_playlist(ctx: &ToolContext, input: &Value) -> Result<Value, ScoutError> {
    let (default_model, _, _) = ctx.model_defaults();
    let playlist_url = input["playlist_url"].as_str().unwrap_or_default();
    scout_policy::validate_url_resolved(playlist_url, &ctx.url_policy).await?;
    let playlist_id = video_content_id(playlist_url);
    let prompt = format!("Playlist: {playlist_url}\n\nReturn the playlist's title and its videos in order.");

    let (playlist, cached) =
        cached_structured_generate(ctx, &playlist_id, "video_playlist", "playlist", &default_model, ThinkingLevel::Low, prompt, &playlist_schema())
            .await?;
    Ok(json!({"playlist_id": playlist_id, "cached": cached, "playlist": playlist}))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_schema_requires_summary_and_key_points() {
        let schema = analysis_schema();
        let required: Vec<&str> = schema["required"].as_array().unwrap().iter().map(|v| v.as_str().unwrap()).collect();
        assert!(required.contains(&"summary"));
        assert!(required.contains(&"key_points"));
    }

    #[test]
    fn thinking_level_defaults_to_medium_for_unknown_string() {
        let input = json!({"thinking_level": "extreme"});
        assert_eq!(thinking_level_from(&input), ThinkingLevel::Medium);
    }

    #[test]
    fn thinking_level_parses_high() {
        let input = json!({"thinking_level": "high"});
        assert_eq!(thinking_level_from(&input), ThinkingLevel::High);
    }
}
