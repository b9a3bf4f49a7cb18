//! Closed enums shared across crates.
//!
//! Polymorphism here is over variants, not inheritance: these are finite,
//! serializable tags, never trait objects.

use serde::{Deserialize, Serialize};

/// A discrete knob on the generative backend tuning internal reasoning depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThinkingLevel {
    /// Minimal reasoning. Used for Flash summarization passes.
    Minimal,
    /// Low reasoning effort.
    Low,
    /// Moderate reasoning effort. The usual default.
    Medium,
    /// Maximum reasoning effort.
    High,
}

impl Default for ThinkingLevel {
    fn default() -> Self {
        ThinkingLevel::Medium
    }
}

/// Confidence tier attached to a research finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvidenceTier {
    /// Directly verified against a primary source.
    Confirmed,
    /// Strongly implied by multiple corroborating sources.
    StrongIndicator,
    /// A reasoned inference, not directly observed.
    Inference,
    /// A plausible but unverified guess.
    Speculation,
    /// No usable evidence either way.
    Unknown,
}

/// Search mode for the knowledge pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    /// BM25 keyword search fused with vector similarity.
    Hybrid,
    /// Pure vector (near-text) search.
    Semantic,
    /// Pure BM25 keyword search.
    Keyword,
}

/// Depth setting for document research.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchScope {
    /// Mapping only; evidence and cross-reference phases are skipped.
    Quick,
    /// Mapping + evidence; cross-reference skipped for a single document.
    Moderate,
    /// All four phases run.
    Thorough,
}

/// The phase in which a document research source failed preparation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreparationPhase {
    /// The source (a URL) could not be downloaded.
    Download,
    /// The prepared bytes could not be uploaded to the generative backend.
    Upload,
}
