//! The knowledge search pipeline: filter building, per-collection dispatch,
//! rerank overfetch, merge, and best-effort Flash summarization.

use crate::client::KnowledgeClient;
use crate::schema::default_schema;
use scout_generative::{GenerativeClient, RequestContent, RequestMessage};
use scout_types::{KnowledgeHit, SearchType, ThinkingLevel};
use serde_json::json;
use std::collections::HashMap;
use tracing::warn;

/// Facet filters accepted by [`search`].
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    /// Restrict to findings at this evidence tier.
    pub evidence_tier: Option<String>,
    /// Restrict to objects written by this source tool.
    pub source_tool: Option<String>,
    /// Restrict to objects created on or after this RFC 3339 timestamp.
    pub date_from: Option<String>,
    /// Restrict to objects created on or before this RFC 3339 timestamp.
    pub date_to: Option<String>,
    /// Restrict to this category, where the collection carries one.
    pub category: Option<String>,
    /// Restrict to this video id, where the collection carries one.
    pub video_id: Option<String>,
}

/// The result of a full search pipeline run.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Hits, merged and sorted across every searched collection.
    pub hits: Vec<KnowledgeHit>,
    /// Whether a rerank pass ran.
    pub reranked: bool,
    /// Whether Flash summarization ran.
    pub flash_processed: bool,
    /// Whether any facet filter was actually applied.
    pub filters_applied: bool,
}

/// Build a filter for `collection`, including only facet conditions whose
/// property exists in that collection's schema, combined with logical AND.
/// Returns `None` when no condition applies.
pub fn build_collection_filter(collection: &str, filters: &SearchFilters) -> Option<serde_json::Value> {
    let schema = default_schema();
    let def = schema.iter().find(|c| c.name == collection)?;
    let has = |name: &str| def.properties.iter().any(|p| p.name == name);

    let mut conditions = Vec::new();
    if has("evidence_tier") {
        if let Some(v) = &filters.evidence_tier {
            conditions.push(json!({"path": "evidence_tier", "op": "Equal", "value": v}));
        }
    }
    if has("source_tool") {
        if let Some(v) = &filters.source_tool {
            conditions.push(json!({"path": "source_tool", "op": "Equal", "value": v}));
        }
    }
    if has("created_at") {
        if let Some(v) = &filters.date_from {
            conditions.push(json!({"path": "created_at", "op": "GreaterThanEqual", "value": v}));
        }
        if let Some(v) = &filters.date_to {
            conditions.push(json!({"path": "created_at", "op": "LessThanEqual", "value": v}));
        }
    }
    if has("category") {
        if let Some(v) = &filters.category {
            conditions.push(json!({"path": "category", "op": "Equal", "value": v}));
        }
    }
    if has("video_id") {
        if let Some(v) = &filters.video_id {
            conditions.push(json!({"path": "video_id", "op": "Equal", "value": v}));
        }
    }

    if conditions.is_empty() {
        None
    } else {
        Some(json!({"operator": "And", "operands": conditions}))
    }
}

fn search_type_str(search_type: SearchType) -> &'static str {
    match search_type {
        SearchType::Hybrid => "hybrid",
        SearchType::Semantic => "semantic",
        SearchType::Keyword => "keyword",
    }
}

/// Run the full pipeline: filter build, dispatch, rerank overfetch, merge,
/// and best-effort Flash summarization.
pub async fn search(
    client: &KnowledgeClient,
    query: &str,
    collections: &[String],
    search_type: SearchType,
    limit: usize,
    alpha: f64,
    filters: &SearchFilters,
    reranker_enabled: bool,
    flash_summarize: bool,
    flash_client: Option<&GenerativeClient>,
    flash_model: &str,
) -> Result<SearchResult, scout_errors::ScoutError> {
    let fetch_limit = if reranker_enabled { limit * 3 } else { limit };
    let mut filters_applied = false;
    let mut merged: Vec<KnowledgeHit> = Vec::new();

    for collection in collections {
        let filter = build_collection_filter(collection, filters);
        filters_applied = filters_applied || filter.is_some();

        let hits = client
            .search(collection, query, search_type_str(search_type), alpha, filter.as_ref(), fetch_limit)
            .await?;

        for (object_id, score, properties) in hits {
            merged.push(KnowledgeHit {
                collection: collection.clone(),
                object_id,
                score,
                rerank_score: if reranker_enabled { Some(score) } else { None },
                summary: None,
                properties,
            });
        }
    }

    merged.sort_by(|a, b| {
        let ar = a.rerank_score.unwrap_or(a.score);
        let br = b.rerank_score.unwrap_or(b.score);
        br.partial_cmp(&ar).unwrap_or(std::cmp::Ordering::Equal).then(
            b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal),
        )
    });
    merged.truncate(limit);

    let flash_processed = if flash_summarize {
        if let Some(flash_client) = flash_client {
            match flash_summarize_hits(flash_client, flash_model, &mut merged).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, "knowledge search: flash summarization failed, returning raw hits");
                    false
                }
            }
        } else {
            false
        }
    } else {
        false
    };

    Ok(SearchResult { hits: merged, reranked: reranker_enabled, flash_processed, filters_applied })
}

const MAX_SUMMARIZE_BATCH: usize = 20;
const MAX_PROPERTY_CHARS: usize = 500;

async fn flash_summarize_hits(
    client: &GenerativeClient,
    model: &str,
    hits: &mut [KnowledgeHit],
) -> Result<(), scout_errors::ScoutError> {
    let batch: Vec<&mut KnowledgeHit> = hits.iter_mut().take(MAX_SUMMARIZE_BATCH).collect();
    if batch.is_empty() {
        return Ok(());
    }

    let truncated: Vec<serde_json::Value> = batch
        .iter()
        .map(|hit| json!({"object_id": hit.object_id, "properties": truncate_properties(&hit.properties)}))
        .collect();

    let schema = json!({
        "type": "object",
        "properties": {
            "hits": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "object_id": {"type": "string"},
                        "relevance": {"type": "number", "minimum": 0, "maximum": 1},
                        "summary": {"type": "string"},
                        "useful_properties": {"type": "array", "items": {"type": "string"}}
                    },
                    "required": ["object_id", "relevance", "summary", "useful_properties"]
                }
            }
        },
        "required": ["hits"]
    });

    let prompt = format!(
        "Summarize each of these knowledge hits in one sentence and name the most useful properties: {}",
        serde_json::to_string(&truncated).unwrap_or_default()
    );
    let messages = vec![RequestMessage { role: "user".to_string(), content: RequestContent::Text(prompt) }];

    let response = client
        .generate_structured(messages, model, ThinkingLevel::Minimal, 0.0, None, &schema, vec![])
        .await?;

    let mut by_id: HashMap<String, serde_json::Value> = HashMap::new();
    if let Some(items) = response.get("hits").and_then(|v| v.as_array()) {
        for item in items {
            if let Some(id) = item.get("object_id").and_then(|v| v.as_str()) {
                by_id.insert(id.to_string(), item.clone());
            }
        }
    }

    for hit in batch {
        if let Some(item) = by_id.get(&hit.object_id) {
            if let Some(summary) = item.get("summary").and_then(|v| v.as_str()) {
                hit.summary = Some(summary.to_string());
            }
            if let Some(useful) = item.get("useful_properties").and_then(|v| v.as_array()) {
                if !useful.is_empty() {
                    if let serde_json::Value::Object(props) = &hit.properties {
                        let subset: serde_json::Map<String, serde_json::Value> = useful
                            .iter()
                            .filter_map(|k| k.as_str())
                            .filter_map(|k| props.get(k).map(|v| (k.to_string(), v.clone())))
                            .collect();
                        if !subset.is_empty() {
                            hit.properties = serde_json::Value::Object(subset);
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

fn truncate_properties(properties: &serde_json::Value) -> serde_json::Value {
    let serde_json::Value::Object(map) = properties else { return properties.clone() };
    let truncated: serde_json::Map<String, serde_json::Value> = map
        .iter()
        .map(|(k, v)| {
            let v = match v {
                serde_json::Value::String(s) if s.len() > MAX_PROPERTY_CHARS => {
                    serde_json::Value::String(s.chars().take(MAX_PROPERTY_CHARS).collect())
                }
                other => other.clone(),
            };
            (k.clone(), v)
        })
        .collect();
    serde_json::Value::Object(truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_filter_skips_properties_absent_from_collection() {
        let filters = SearchFilters { category: Some("news".into()), ..Default::default() };
        // ResearchPlans has no `category` property.
        assert!(build_collection_filter("ResearchPlans", &filters).is_none());
    }

    #[test]
    fn build_filter_combines_applicable_conditions_with_and() {
        let filters =
            SearchFilters { evidence_tier: Some("CONFIRMED".into()), source_tool: Some("research_deep".into()), ..Default::default() };
        let filter = build_collection_filter("ResearchFindings", &filters).unwrap();
        assert_eq!(filter["operator"], "And");
        assert_eq!(filter["operands"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn no_applicable_filters_returns_none() {
        let filters = SearchFilters::default();
        assert!(build_collection_filter("ResearchFindings", &filters).is_none());
    }

    #[test]
    fn truncate_properties_caps_long_strings() {
        let long = "x".repeat(1000);
        let props = json!({"summary": long});
        let truncated = truncate_properties(&props);
        assert_eq!(truncated["summary"].as_str().unwrap().len(), MAX_PROPERTY_CHARS);
    }
}
