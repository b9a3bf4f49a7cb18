//! Deep (topic-driven) research: Scope → Evidence → Synthesis, sharing one
//! system instruction across all three generative calls.

use scout_errors::ScoutError;
use scout_generative::{GenerativeClient, RequestContent, RequestMessage};
use scout_types::{EvidenceTier, ResearchFinding, ResearchReport, ThinkingLevel};
use serde::Deserialize;
use uuid::Uuid;

/// Parameters for a single deep-research pass.
#[derive(Debug, Clone)]
pub struct DeepResearchRequest {
    /// The topic to research.
    pub topic: String,
    /// Model to generate with.
    pub model: String,
    /// Reasoning depth applied to every phase.
    pub thinking_level: ThinkingLevel,
}

fn message(role: &str, text: impl Into<String>) -> RequestMessage {
    RequestMessage { role: role.to_string(), content: RequestContent::Text(text.into()) }
}

fn evidence_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "required": ["findings"],
        "properties": {
            "findings": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["topic", "scope", "claim", "evidence_tier", "reasoning", "confidence"],
                    "properties": {
                        "topic": { "type": "string" },
                        "scope": { "type": "string" },
                        "claim": { "type": "string" },
                        "evidence_tier": {
                            "type": "string",
                            "enum": ["CONFIRMED", "STRONG_INDICATOR", "INFERENCE", "SPECULATION", "UNKNOWN"]
                        },
                        "reasoning": { "type": "string" },
                        "supporting": { "type": "array", "items": { "type": "string" } },
                        "contradicting": { "type": "array", "items": { "type": "string" } },
                        "confidence": { "type": "number", "minimum": 0, "maximum": 1 },
                        "open_questions": { "type": "array", "items": { "type": "string" } }
                    }
                }
            }
        }
    })
}

fn synthesis_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "required": ["executive_summary"],
        "properties": {
            "executive_summary": { "type": "string" },
            "open_questions": { "type": "array", "items": { "type": "string" } },
            "methodology_critique": { "type": "string" }
        }
    })
}

#[derive(Debug, Deserialize)]
struct EvidenceFindings {
    findings: Vec<ResearchFinding>,
}

#[derive(Debug, Deserialize)]
struct SynthesisOutput {
    executive_summary: String,
    #[serde(default)]
    open_questions: Vec<String>,
    #[serde(default)]
    methodology_critique: Option<String>,
}

/// Run the three-phase deep research pipeline and return a fully linked
/// report (invariant 5: every finding's `report_uuid` matches the report).
pub async fn run_deep_research(
    client: &GenerativeClient,
    request: &DeepResearchRequest,
    system_instruction: &str,
) -> Result<ResearchReport, ScoutError> {
    let scope_prompt = format!(
        "Delineate the stakeholders, constraints, and open questions for researching: {}",
        request.topic
    );
    let scope_text = client
        .generate(
            vec![message("user", scope_prompt)],
            &request.model,
            request.thinking_level,
            0.7,
            Some(system_instruction),
            None,
            Vec::new(),
        )
        .await?;

    let evidence_prompt = format!(
        "Given this research scope:\n\n{scope_text}\n\nProduce a structured set of findings on: {}",
        request.topic
    );
    let evidence_value = client
        .generate_structured(
            vec![message("user", evidence_prompt)],
            &request.model,
            request.thinking_level,
            0.4,
            Some(system_instruction),
            &evidence_schema(),
            Vec::new(),
        )
        .await?;
    let evidence: EvidenceFindings = serde_json::from_value(evidence_value)
        .map_err(|e| ScoutError::ApiInvalidArgument(format!("malformed evidence findings: {e}")))?;

    let findings_json = serde_json::to_string_pretty(&evidence.findings)
        .map_err(|e| ScoutError::Other(Box::new(e)))?;
    let synthesis_prompt = format!(
        "Synthesize these findings into an executive summary, noting open questions and a critique of the \
         research methodology:\n\n{findings_json}"
    );
    let synthesis_value = client
        .generate_structured(
            vec![message("user", synthesis_prompt)],
            &request.model,
            request.thinking_level,
            0.5,
            Some(system_instruction),
            &synthesis_schema(),
            Vec::new(),
        )
        .await?;
    let synthesis: SynthesisOutput = serde_json::from_value(synthesis_value)
        .map_err(|e| ScoutError::ApiInvalidArgument(format!("malformed synthesis output: {e}")))?;

    let report = ResearchReport {
        uuid: Uuid::new_v4().to_string().into(),
        executive_summary: synthesis.executive_summary,
        open_questions: synthesis.open_questions,
        methodology_critique: synthesis.methodology_critique,
        findings: evidence.findings,
    };
    Ok(report.link_findings())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_types::ReportUuid;
    use serde_json::json;

    #[test]
    fn link_findings_stamps_report_uuid() {
        let report = ResearchReport {
            uuid: ReportUuid::new("r1"),
            executive_summary: "summary".into(),
            open_questions: vec![],
            methodology_critique: None,
            findings: vec![ResearchFinding {
                topic: "t".into(),
                scope: "s".into(),
                claim: "c".into(),
                evidence_tier: EvidenceTier::Inference,
                reasoning: "r".into(),
                supporting: vec![],
                contradicting: vec![],
                confidence: 0.5,
                open_questions: vec![],
                report_uuid: None,
            }],
        }
        .link_findings();
        assert_eq!(report.findings[0].report_uuid, Some(ReportUuid::new("r1")));
    }

    #[test]
    fn evidence_findings_parse_from_schema_shaped_json() {
        let value = json!({
            "findings": [{
                "topic": "t",
                "scope": "s",
                "claim": "c",
                "evidence_tier": "CONFIRMED",
                "reasoning": "r",
                "confidence": 0.9
            }]
        });
        let parsed: EvidenceFindings = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.findings.len(), 1);
        assert_eq!(parsed.findings[0].evidence_tier, EvidenceTier::Confirmed);
    }
}
