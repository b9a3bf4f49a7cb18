//! Research tools: topic-driven deep research, planning, standalone evidence
//! assessment, and source-grounded document research.

use crate::context::ToolContext;
use crate::spec::{envelope, ToolAnnotations, ToolSpec};
use crate::util::system_instruction;
use scout_errors::ScoutError;
use scout_generative::{RequestContent, RequestMessage};
use scout_research::{run_deep_research, run_document_research, DeepResearchRequest, DocumentResearchRequest, DocumentSource};
use scout_types::{ResearchScope, ThinkingLevel};
use serde_json::{json, Value};
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use uuid::Uuid;

fn message(role: &str, text: impl Into<String>) -> RequestMessage {
    RequestMessage { role: role.to_string(), content: RequestContent::Text(text.into()) }
}

fn thinking_level_from(input: &Value) -> ThinkingLevel {
    match input.get("thinking_level").and_then(Value::as_str) {
        Some("minimal") => ThinkingLevel::Minimal,
        Some("low") => ThinkingLevel::Low,
        Some("high") => ThinkingLevel::High,
        _ => ThinkingLevel::Medium,
    }
}

fn research_scope_from(input: &Value) -> ResearchScope {
    match input.get("scope").and_then(Value::as_str) {
        Some("quick") => ResearchScope::Quick,
        Some("thorough") => ResearchScope::Thorough,
        _ => ResearchScope::Moderate,
    }
}

/// `research_deep`: the three-phase topic-driven research pipeline.
pub struct ResearchDeep {
    pub ctx: Arc<ToolContext>,
}

impl ToolSpec for ResearchDeep {
    fn name(&self) -> &'static str {
        "research_deep"
    }
    fn description(&self) -> &'static str {
        "Run a three-phase (scope, evidence, synthesis) research pass on a topic."
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["topic"],
            "properties": {
                "topic": {"type": "string", "minLength": 1},
                "model": {"type": "string"},
                "thinking_level": {"type": "string", "enum": ["minimal", "low", "medium", "high"]}
            }
        })
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::idempotent_write()
    }
    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Value> + Send + '_>> {
        Box::pin(async move { envelope(research_deep(&self.ctx, &input).await) })
    }
}

async fn research_deep(ctx: &ToolContext, input: &Value) -> Result<Value, ScoutError> {
    let (default_model, default_thinking, _) = ctx.model_defaults();
    let topic = input["topic"].as_str().unwrap_or_default().to_string();
    let model = input.get("model").and_then(Value::as_str).unwrap_or(&default_model).to_string();
    let thinking_level = input.get("thinking_level").map(|_| thinking_level_from(input)).unwrap_or(default_thinking);

    let request = DeepResearchRequest { topic, model, thinking_level };
    let report = run_deep_research(&ctx.generative, &request, &system_instruction("research_deep")).await?;

    for finding in &report.findings {
        let finding_id = format!("{}:{}", report.uuid, Uuid::new_v4());
        ctx.knowledge_sink
            .store_research_finding(&finding_id, serde_json::to_value(finding).unwrap_or(Value::Null), "research_deep")
            .await;
    }

    serde_json::to_value(&report).map_err(|e| ScoutError::Other(Box::new(e)))
}

fn plan_schema() -> Value {
    json!({
        "type": "object",
        "required": ["objectives", "approach"],
        "properties": {
            "objectives": {"type": "array", "items": {"type": "string"}},
            "approach": {"type": "string"},
            "phases": {"type": "array", "items": {"type": "string"}}
        }
    })
}

/// `research_plan`: a structured research plan for a topic, without running it.
pub struct ResearchPlan {
    pub ctx: Arc<ToolContext>,
}

impl ToolSpec for ResearchPlan {
    fn name(&self) -> &'static str {
        "research_plan"
    }
    fn description(&self) -> &'static str {
        "Produce a structured research plan (objectives, approach, phases) for a topic."
    }
    fn input_schema(&self) -> Value {
        json!({"type": "object", "required": ["topic"], "properties": {"topic": {"type": "string", "minLength": 1}, "model": {"type": "string"}}})
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::idempotent_write()
    }
    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Value> + Send + '_>> {
        Box::pin(async move { envelope(research_plan(&self.ctx, &input).await) })
    }
}

async fn research_plan(ctx: &ToolContext, input: &Value) -> Result<Value, ScoutError> {
    let (default_model, _, _) = ctx.model_defaults();
    let topic = input["topic"].as_str().unwrap_or_default();
    let model = input.get("model").and_then(Value::as_str).unwrap_or(&default_model);

    let prompt = format!("Produce a research plan — objectives, approach, and ordered phases — for: {topic}");
    let plan = ctx
        .generative
        .generate_structured(vec![message("user", prompt)], model, ThinkingLevel::Medium, 0.5, Some(&system_instruction("research_plan")), &plan_schema(), Vec::new())
        .await?;

    let plan_id = Uuid::new_v4().to_string();
    ctx.knowledge_sink.store_research_plan(&plan_id, plan.clone()).await;

    Ok(json!({"plan_id": plan_id, "plan": plan}))
}

fn evidence_schema() -> Value {
    json!({
        "type": "object",
        "required": ["claim", "evidence_tier", "reasoning", "confidence"],
        "properties": {
            "claim": {"type": "string"},
            "evidence_tier": {"type": "string", "enum": ["CONFIRMED", "STRONG_INDICATOR", "INFERENCE", "SPECULATION", "UNKNOWN"]},
            "reasoning": {"type": "string"},
            "supporting": {"type": "array", "items": {"type": "string"}},
            "contradicting": {"type": "array", "items": {"type": "string"}},
            "confidence": {"type": "number", "minimum": 0, "maximum": 1}
        }
    })
}

/// `research_assess_evidence`: standalone evidence-tier assessment for a claim.
pub struct ResearchAssessEvidence {
    pub ctx: Arc<ToolContext>,
}

impl ToolSpec for ResearchAssessEvidence {
    fn name(&self) -> &'static str {
        "research_assess_evidence"
    }
    fn description(&self) -> &'static str {
        "Assess the evidence tier and confidence for a standalone claim, optionally given supporting context."
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["claim"],
            "properties": {"claim": {"type": "string", "minLength": 1}, "context": {"type": "string"}, "model": {"type": "string"}}
        })
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::idempotent_write()
    }
    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Value> + Send + '_>> {
        Box::pin(async move { envelope(research_assess_evidence(&self.ctx, &input).await) })
    }
}

async fn research_assess_evidence(ctx: &ToolContext, input: &Value) -> Result<Value, ScoutError> {
    let (default_model, _, _) = ctx.model_defaults();
    let claim = input["claim"].as_str().unwrap_or_default();
    let context = input.get("context").and_then(Value::as_str).unwrap_or_default();
    let model = input.get("model").and_then(Value::as_str).unwrap_or(&default_model);

    let prompt = if context.is_empty() {
        format!("Assess the evidence tier, reasoning, and confidence for this claim: {claim}")
    } else {
        format!("Given this context:\n\n{context}\n\nAssess the evidence tier, reasoning, and confidence for this claim: {claim}")
    };

    let assessment = ctx
        .generative
        .generate_structured(
            vec![message("user", prompt)],
            model,
            ThinkingLevel::Medium,
            0.3,
            Some(&system_instruction("research_assess_evidence")),
            &evidence_schema(),
            Vec::new(),
        )
        .await?;

    let finding_id = Uuid::new_v4().to_string();
    ctx.knowledge_sink.store_research_finding(&finding_id, assessment.clone(), "research_assess_evidence").await;

    Ok(json!({"finding_id": finding_id, "assessment": assessment}))
}

/// `research_document`: source-grounded, four-phase document research.
pub struct ResearchDocument {
    pub ctx: Arc<ToolContext>,
}

impl ToolSpec for ResearchDocument {
    fn name(&self) -> &'static str {
        "research_document"
    }
    fn description(&self) -> &'static str {
        "Run source-grounded research over a set of local files and/or URLs, surfacing per-source preparation failures."
    }
    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["sources"],
            "properties": {
                "sources": {
                    "type": "array",
                    "minItems": 1,
                    "items": {"type": "object", "properties": {"path": {"type": "string"}, "url": {"type": "string"}}}
                },
                "scope": {"type": "string", "enum": ["quick", "moderate", "thorough"]},
                "model": {"type": "string"},
                "thinking_level": {"type": "string", "enum": ["minimal", "low", "medium", "high"]}
            }
        })
    }
    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::idempotent_write()
    }
    fn call(&self, input: Value) -> Pin<Box<dyn Future<Output = Value> + Send + '_>> {
        Box::pin(async move { envelope(research_document(&self.ctx, &input).await) })
    }
}

async fn research_document(ctx: &ToolContext, input: &Value) -> Result<Value, ScoutError> {
    let (default_model, default_thinking, _) = ctx.model_defaults();
    let config = ctx.config.get();
    let model = input.get("model").and_then(Value::as_str).unwrap_or(&default_model).to_string();
    let thinking_level = input.get("thinking_level").map(|_| thinking_level_from(input)).unwrap_or(default_thinking);
    let scope = research_scope_from(input);

    let sources: Vec<DocumentSource> = input["sources"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|item| {
                    if let Some(path) = item.get("path").and_then(Value::as_str) {
                        Some(DocumentSource::Path(PathBuf::from(path)))
                    } else {
                        item.get("url").and_then(Value::as_str).map(|url| DocumentSource::Url(url.to_string()))
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    let request = DocumentResearchRequest {
        sources,
        scope,
        phase_concurrency: config.research_document_phase_concurrency,
        max_sources: config.research_document_max_sources,
        model,
        thinking_level,
    };

    let report = run_document_research(&ctx.generative, request, &ctx.http, &ctx.url_policy, &ctx.upload, &system_instruction("research_document")).await?;

    let finding_id = Uuid::new_v4().to_string();
    ctx.knowledge_sink
        .store_research_finding(&finding_id, serde_json::to_value(&report).map_err(|e| ScoutError::Other(Box::new(e)))?, "research_document")
        .await;

    Ok(json!({
        "finding_id": finding_id,
        "preparation_issues": report.preparation_issues,
        "document_maps": report.document_maps,
        "document_evidence": report.document_evidence,
        "cross_reference": report.cross_reference,
        "executive_summary": report.executive_summary,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn research_scope_defaults_to_moderate() {
        assert_eq!(research_scope_from(&json!({})), ResearchScope::Moderate);
    }

    #[test]
    fn research_scope_parses_thorough() {
        assert_eq!(research_scope_from(&json!({"scope": "thorough"})), ResearchScope::Thorough);
    }

    #[test]
    fn thinking_level_defaults_to_medium() {
        assert_eq!(thinking_level_from(&json!({})), ThinkingLevel::Medium);
    }
}
