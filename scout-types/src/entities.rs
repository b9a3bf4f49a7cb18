//! Cross-cutting data entities from §3 of the specification.

use crate::enums::{EvidenceTier, PreparationPhase};
use crate::ids::ReportUuid;
use serde::{Deserialize, Serialize};

/// A single conversational turn stored in session history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryTurn {
    /// `"user"` or `"model"`.
    pub role: String,
    /// The parts making up this turn (text, file references, …).
    pub parts: Vec<HistoryPart>,
}

/// One part of a stored turn. Thinking parts are never persisted — they are
/// stripped before a turn is appended to history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryPart {
    /// Plain text.
    Text {
        /// The text content.
        text: String,
    },
    /// A reference to a previously uploaded file.
    FileRef {
        /// Backend-assigned URI for the uploaded content.
        uri: String,
        /// MIME type of the referenced content.
        mime_type: String,
    },
}

/// An atomic claim inside a research report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchFinding {
    /// The general subject area.
    pub topic: String,
    /// The specific bounded question this finding answers.
    pub scope: String,
    /// The claim itself.
    pub claim: String,
    /// How well-supported the claim is.
    pub evidence_tier: EvidenceTier,
    /// Why this tier was assigned.
    pub reasoning: String,
    /// Evidence fragments supporting the claim.
    #[serde(default)]
    pub supporting: Vec<String>,
    /// Evidence fragments contradicting the claim.
    #[serde(default)]
    pub contradicting: Vec<String>,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Open questions this finding did not resolve.
    #[serde(default)]
    pub open_questions: Vec<String>,
    /// Redundant copy of the owning report's uuid, for filtering.
    #[serde(default)]
    pub report_uuid: Option<ReportUuid>,
}

/// The root object of a completed research pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchReport {
    /// Identifier shared with every child finding's `report_uuid`.
    pub uuid: ReportUuid,
    /// High-level synthesis of the findings.
    pub executive_summary: String,
    /// Unresolved questions surfaced during synthesis.
    #[serde(default)]
    pub open_questions: Vec<String>,
    /// Self-critique of the research methodology.
    #[serde(default)]
    pub methodology_critique: Option<String>,
    /// The findings belonging to this report.
    pub findings: Vec<ResearchFinding>,
}

impl ResearchReport {
    /// Stamp `report_uuid` on every finding so invariant 5 in §3 holds.
    pub fn link_findings(mut self) -> Self {
        for finding in &mut self.findings {
            finding.report_uuid = Some(self.uuid.clone());
        }
        self
    }
}

/// A structured record of a per-source preparation failure in document research.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparationIssue {
    /// The source (path or URL) that failed.
    pub source: String,
    /// Which phase failed.
    pub phase: PreparationPhase,
    /// The closed error category, mirrored from `scout-errors`.
    pub error_type: String,
    /// A human-readable description.
    pub error: String,
}

/// A hit returned from the knowledge search pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeHit {
    /// The collection this hit came from.
    pub collection: String,
    /// The object's id within that collection.
    pub object_id: String,
    /// The base (BM25/vector) relevance score.
    pub score: f64,
    /// The reranked score, if a reranker pass ran.
    #[serde(default)]
    pub rerank_score: Option<f64>,
    /// A Flash-generated summary, if summarization ran.
    #[serde(default)]
    pub summary: Option<String>,
    /// The object's properties (possibly trimmed by Flash summarization).
    pub properties: serde_json::Value,
}
