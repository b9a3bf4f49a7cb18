#![deny(missing_docs)]
//! Shared entities, identifiers, and enums for the scout research MCP server.
//!
//! Every other crate in the workspace depends on this one for the data
//! shapes that cross component boundaries, so it has no dependency on any
//! sibling crate.

pub mod entities;
pub mod enums;
pub mod ids;

pub use entities::{HistoryPart, HistoryTurn, KnowledgeHit, PreparationIssue, ResearchFinding, ResearchReport};
pub use enums::{EvidenceTier, PreparationPhase, ResearchScope, SearchType, ThinkingLevel};
pub use ids::{ContentId, ReportUuid, SessionId};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_id_display_roundtrips() {
        let id = ContentId::new("abc123");
        assert_eq!(id.to_string(), "abc123");
        assert_eq!(id.as_str(), "abc123");
    }

    #[test]
    fn thinking_level_default_is_medium() {
        assert_eq!(ThinkingLevel::default(), ThinkingLevel::Medium);
    }

    #[test]
    fn research_report_link_findings_stamps_uuid() {
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
                reasoning: "because".into(),
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
    fn evidence_tier_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&EvidenceTier::StrongIndicator).unwrap();
        assert_eq!(json, "\"STRONG_INDICATOR\"");
    }
}
