//! Document (source-grounded) research: Mapping → Evidence → Cross-reference
//! → Synthesis, bounded by a phase-level concurrency limit.

use scout_errors::ScoutError;
use scout_generative::{GenerativeClient, RequestContent, RequestMessage};
use scout_policy::{download_checked, UrlPolicyConfig};
use scout_types::{PreparationIssue, PreparationPhase, ResearchScope, ThinkingLevel};
use scout_upload::{ContentRef, UploadCoordinator};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// A document research input: a local path or a remote URL.
#[derive(Debug, Clone)]
pub enum DocumentSource {
    /// A file already present on disk.
    Path(PathBuf),
    /// A URL to download before use.
    Url(String),
}

impl DocumentSource {
    fn label(&self) -> String {
        match self {
            DocumentSource::Path(p) => p.display().to_string(),
            DocumentSource::Url(u) => u.clone(),
        }
    }
}

/// Parameters for a document research run.
pub struct DocumentResearchRequest {
    /// Sources to research over.
    pub sources: Vec<DocumentSource>,
    /// How deep to go: gates which phases run.
    pub scope: ResearchScope,
    /// Bound on concurrent generative calls within a phase.
    pub phase_concurrency: usize,
    /// Hard cap on the number of sources accepted.
    pub max_sources: usize,
    /// Model to generate with.
    pub model: String,
    /// Reasoning depth for every phase.
    pub thinking_level: ThinkingLevel,
}

/// Everything a document research pass produces.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DocumentResearchReport {
    /// Per-source failures that excluded that source from the later phases.
    pub preparation_issues: Vec<PreparationIssue>,
    /// Per-source document maps (phase 1), keyed by source label.
    pub document_maps: HashMap<String, String>,
    /// Per-source extracted evidence (phase 2), keyed by source label. Empty for `quick`.
    pub document_evidence: HashMap<String, String>,
    /// Cross-document synthesis (phase 3). `None` when skipped.
    pub cross_reference: Option<String>,
    /// Final synthesis report (phase 4).
    pub executive_summary: String,
}

fn message(role: &str, text: impl Into<String>) -> RequestMessage {
    RequestMessage { role: role.to_string(), content: RequestContent::Text(text.into()) }
}

/// Download (if remote) and upload every source, capturing per-source
/// preparation failures instead of aborting the whole run.
async fn prepare_sources(
    sources: &[DocumentSource],
    http: &reqwest::Client,
    url_policy: &UrlPolicyConfig,
    upload: &UploadCoordinator,
    tmp_dir: &tempfile::TempDir,
) -> (Vec<(String, ContentRef)>, Vec<PreparationIssue>) {
    let mut prepared = Vec::new();
    let mut issues = Vec::new();

    for source in sources {
        let label = source.label();
        let bytes = match source {
            DocumentSource::Path(path) => match tokio::fs::read(path).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    issues.push(PreparationIssue {
                        source: label,
                        phase: PreparationPhase::Upload,
                        error_type: "FILE_NOT_FOUND".into(),
                        error: err.to_string(),
                    });
                    continue;
                }
            },
            DocumentSource::Url(url) => match download_one(url, http, url_policy, tmp_dir).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    issues.push(PreparationIssue {
                        source: label,
                        phase: PreparationPhase::Download,
                        error_type: scout_errors::categorize(&err).code().to_string(),
                        error: err.to_string(),
                    });
                    continue;
                }
            },
        };

        match upload.prepare(bytes, "application/octet-stream").await {
            Ok(content_ref) => prepared.push((label, content_ref)),
            Err(err) => issues.push(PreparationIssue {
                source: label,
                phase: PreparationPhase::Upload,
                error_type: scout_errors::categorize(&err).code().to_string(),
                error: err.to_string(),
            }),
        }
    }

    (prepared, issues)
}

async fn download_one(
    url: &str,
    http: &reqwest::Client,
    url_policy: &UrlPolicyConfig,
    tmp_dir: &tempfile::TempDir,
) -> Result<Vec<u8>, ScoutError> {
    let response = download_checked(http, url, url_policy).await?;
    let bytes = response.bytes().await.map_err(|e| ScoutError::NetworkError(e.to_string()))?;

    // Land the download on disk before upload so the temp dir always holds
    // the actual prepared bytes, not just a cache key.
    let file_path = tmp_dir.path().join(blake3::hash(&bytes).to_hex().to_string());
    tokio::fs::write(&file_path, &bytes).await.map_err(|e| ScoutError::Other(Box::new(e)))?;
    tokio::fs::read(&file_path).await.map_err(|e| ScoutError::Other(Box::new(e)))
}

fn content_ref_label(content_ref: &ContentRef) -> &str {
    match content_ref {
        ContentRef::Inline { mime_type, .. } => mime_type,
        ContentRef::Uploaded(handle) => &handle.uri,
    }
}

/// Run the four-phase document research pipeline. Source preparation always
/// happens inside a temp directory that is guaranteed to be removed before
/// this function returns, success or failure.
pub async fn run_document_research(
    client: &GenerativeClient,
    request: DocumentResearchRequest,
    http: &reqwest::Client,
    url_policy: &UrlPolicyConfig,
    upload: &UploadCoordinator,
    system_instruction: &str,
) -> Result<DocumentResearchReport, ScoutError> {
    if request.sources.len() > request.max_sources {
        return Err(ScoutError::ApiInvalidArgument(format!(
            "{} sources exceeds the configured maximum of {}",
            request.sources.len(),
            request.max_sources
        )));
    }

    let tmp_dir = tempfile::tempdir().map_err(|e| ScoutError::Other(Box::new(e)))?;
    let result = run_phases(client, &request, http, url_policy, upload, system_instruction, &tmp_dir).await;
    // Guaranteed cleanup regardless of how `run_phases` returned.
    drop(tmp_dir);
    result
}

async fn run_phases(
    client: &GenerativeClient,
    request: &DocumentResearchRequest,
    http: &reqwest::Client,
    url_policy: &UrlPolicyConfig,
    upload: &UploadCoordinator,
    system_instruction: &str,
    tmp_dir: &tempfile::TempDir,
) -> Result<DocumentResearchReport, ScoutError> {
    let (prepared, preparation_issues) = prepare_sources(&request.sources, http, url_policy, upload, tmp_dir).await;
    if prepared.is_empty() {
        return Err(ScoutError::ApiInvalidArgument(
            "every source failed preparation; no documents available for research".into(),
        ));
    }

    let semaphore = Arc::new(Semaphore::new(request.phase_concurrency.max(1)));

    // Phase 1: Mapping, one call per document, bounded concurrency.
    let mapping_futures = prepared.iter().map(|(label, content_ref)| {
        let semaphore = semaphore.clone();
        let label = label.clone();
        let reference = content_ref_label(content_ref).to_string();
        async move {
            let _permit = semaphore.acquire().await.expect("semaphore not closed");
            let prompt = format!("Produce a document map (structure, sections, key topics) for: {reference}");
            let text = client
                .generate(
                    vec![message("user", prompt)],
                    &request.model,
                    request.thinking_level,
                    0.3,
                    Some(system_instruction),
                    None,
                    Vec::new(),
                )
                .await;
            (label, text)
        }
    });
    let mapping_results: Vec<(String, Result<String, ScoutError>)> = futures::future::join_all(mapping_futures).await;
    let mut document_maps = HashMap::new();
    for (label, result) in mapping_results {
        document_maps.insert(label, result?);
    }

    // Phase 2: Evidence, skipped for `quick`.
    let mut document_evidence = HashMap::new();
    if !matches!(request.scope, ResearchScope::Quick) {
        let evidence_futures = prepared.iter().map(|(label, _)| {
            let semaphore = semaphore.clone();
            let label = label.clone();
            let doc_map = document_maps.get(label.as_str()).cloned().unwrap_or_default();
            async move {
                let _permit = semaphore.acquire().await.expect("semaphore not closed");
                let prompt = format!("Extract supporting evidence from this document, given its map:\n\n{doc_map}");
                let text = client
                    .generate(
                        vec![message("user", prompt)],
                        &request.model,
                        request.thinking_level,
                        0.3,
                        Some(system_instruction),
                        None,
                        Vec::new(),
                    )
                    .await;
                (label, text)
            }
        });
        let evidence_results: Vec<(String, Result<String, ScoutError>)> = futures::future::join_all(evidence_futures).await;
        for (label, result) in evidence_results {
            document_evidence.insert(label, result?);
        }
    }

    // Phase 3: Cross-reference, a single call, skipped for single-doc `moderate`.
    let skip_cross_reference = matches!(request.scope, ResearchScope::Quick)
        || (matches!(request.scope, ResearchScope::Moderate) && prepared.len() <= 1);
    let cross_reference = if skip_cross_reference {
        None
    } else {
        let combined: String = document_evidence
            .iter()
            .map(|(label, evidence)| format!("### {label}\n{evidence}"))
            .collect::<Vec<_>>()
            .join("\n\n");
        let prompt = format!("Cross-reference the evidence from these documents, noting agreements and conflicts:\n\n{combined}");
        Some(
            client
                .generate(
                    vec![message("user", prompt)],
                    &request.model,
                    request.thinking_level,
                    0.4,
                    Some(system_instruction),
                    None,
                    Vec::new(),
                )
                .await?,
        )
    };

    // Phase 4: Synthesis, a single call producing the final report.
    let synthesis_prompt = format!(
        "Synthesize a final research report from these document maps:\n\n{}\n\nand this cross-reference:\n\n{}",
        document_maps.values().cloned().collect::<Vec<_>>().join("\n\n"),
        cross_reference.clone().unwrap_or_else(|| "(skipped)".into())
    );
    let executive_summary = client
        .generate(
            vec![message("user", synthesis_prompt)],
            &request.model,
            request.thinking_level,
            0.5,
            Some(system_instruction),
            None,
            Vec::new(),
        )
        .await?;

    Ok(DocumentResearchReport { preparation_issues, document_maps, document_evidence, cross_reference, executive_summary })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_source_label_uses_url_or_path() {
        assert_eq!(DocumentSource::Url("http://x/y".into()).label(), "http://x/y");
        assert_eq!(DocumentSource::Path(PathBuf::from("/tmp/a.pdf")).label(), "/tmp/a.pdf");
    }

    #[tokio::test]
    async fn too_many_sources_is_rejected_before_any_network_activity() {
        let client = GenerativeClient::new("key");
        let http = reqwest::Client::new();
        let url_policy = UrlPolicyConfig::default();
        let upload = UploadCoordinator::new(Arc::new(NoopBackend), 1024);
        let request = DocumentResearchRequest {
            sources: vec![DocumentSource::Path("/a".into()), DocumentSource::Path("/b".into())],
            scope: ResearchScope::Quick,
            phase_concurrency: 2,
            max_sources: 1,
            model: "scout-pro-2".into(),
            thinking_level: ThinkingLevel::Medium,
        };
        let result = run_document_research(&client, request, &http, &url_policy, &upload, "system").await;
        assert!(result.is_err());
    }

    struct NoopBackend;

    #[async_trait::async_trait]
    impl scout_upload::UploadBackend for NoopBackend {
        async fn upload(&self, _bytes: &[u8], _mime_type: &str) -> Result<scout_upload::UploadHandle, ScoutError> {
            unreachable!("not exercised by this test")
        }
        async fn poll_status(&self, _uri: &str) -> Result<scout_upload::UploadState, ScoutError> {
            unreachable!("not exercised by this test")
        }
    }
}
