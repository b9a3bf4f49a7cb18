#![deny(missing_docs)]
//! Deep and document research pipelines.
//!
//! Deep research runs three phases (Scope, Evidence, Synthesis) sharing one
//! system instruction and produces a linked [`scout_types::ResearchReport`].
//! Document research runs four phases (Mapping, Evidence, Cross-reference,
//! Synthesis) over a caller-supplied set of local/remote sources, bounded by
//! a phase-level concurrency limit, surfacing per-source preparation
//! failures instead of aborting the whole run.

mod deep;
mod document;

pub use deep::{run_deep_research, DeepResearchRequest};
pub use document::{run_document_research, DocumentResearchReport, DocumentResearchRequest, DocumentSource};
