#![deny(missing_docs)]
//! The closed error taxonomy every handler in `scout-tools` reports through.
//!
//! [`ScoutError`] is the typed enum components raise. [`categorize`] maps any
//! error — typed or not — onto one of the codes from the specification's
//! error taxonomy, first by variant, then (for errors crossing an FFI-ish
//! boundary such as a generative-backend HTTP response) by sniffing the
//! message text. [`make_tool_error`] is the single sink every tool handler
//! calls before returning a failed `CallToolResult`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of error codes from the specification's error taxonomy.
///
/// `#[non_exhaustive]` because new codes may be added without it being a
/// breaking change for callers who only match a subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// A caller-supplied URL failed structural validation (bad scheme, embedded credentials, …).
    UrlInvalid,
    /// A caller-supplied URL could not be parsed at all.
    UrlParseFailed,
    /// A structurally valid URL was denied by policy (private IP, disallowed host, …).
    UrlPolicyDenied,
    /// The generative backend rejected the request as unauthorized.
    ApiPermissionDenied,
    /// The generative backend reported the account/key is over quota.
    ApiQuotaExceeded,
    /// The generative backend rejected the request shape.
    ApiInvalidArgument,
    /// The generative backend has no record of the referenced resource.
    ApiNotFound,
    /// The video exists but is geo- or age-restricted.
    VideoRestricted,
    /// The video is private.
    VideoPrivate,
    /// The video is unavailable (deleted, not yet published, …).
    VideoUnavailable,
    /// A transport-level failure talking to any downstream service.
    NetworkError,
    /// A referenced local file does not exist.
    FileNotFound,
    /// A referenced local file has an unsupported type.
    FileUnsupported,
    /// A referenced local file exceeds the configured size limit.
    FileTooLarge,
    /// The knowledge store could not be reached.
    KnowledgeConnection,
    /// The knowledge store schema is missing or inconsistent.
    KnowledgeSchema,
    /// A knowledge store query failed.
    KnowledgeQuery,
    /// A knowledge store import/ingest failed.
    KnowledgeImport,
    /// The caller is not permitted to perform this operation.
    PermissionDenied,
    /// Nothing above matched.
    Unknown,
}

impl ErrorCategory {
    /// The wire code used in [`ToolErrorEnvelope::category`].
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCategory::UrlInvalid => "URL_INVALID",
            ErrorCategory::UrlParseFailed => "URL_PARSE_FAILED",
            ErrorCategory::UrlPolicyDenied => "URL_POLICY_DENIED",
            ErrorCategory::ApiPermissionDenied => "API_PERMISSION_DENIED",
            ErrorCategory::ApiQuotaExceeded => "API_QUOTA_EXCEEDED",
            ErrorCategory::ApiInvalidArgument => "API_INVALID_ARGUMENT",
            ErrorCategory::ApiNotFound => "API_NOT_FOUND",
            ErrorCategory::VideoRestricted => "VIDEO_RESTRICTED",
            ErrorCategory::VideoPrivate => "VIDEO_PRIVATE",
            ErrorCategory::VideoUnavailable => "VIDEO_UNAVAILABLE",
            ErrorCategory::NetworkError => "NETWORK_ERROR",
            ErrorCategory::FileNotFound => "FILE_NOT_FOUND",
            ErrorCategory::FileUnsupported => "FILE_UNSUPPORTED",
            ErrorCategory::FileTooLarge => "FILE_TOO_LARGE",
            ErrorCategory::KnowledgeConnection => "KNOWLEDGE_CONNECTION",
            ErrorCategory::KnowledgeSchema => "KNOWLEDGE_SCHEMA",
            ErrorCategory::KnowledgeQuery => "KNOWLEDGE_QUERY",
            ErrorCategory::KnowledgeImport => "KNOWLEDGE_IMPORT",
            ErrorCategory::PermissionDenied => "PERMISSION_DENIED",
            ErrorCategory::Unknown => "UNKNOWN",
        }
    }

    /// Whether a retry with backoff is ever worth attempting for this category.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCategory::ApiQuotaExceeded | ErrorCategory::NetworkError | ErrorCategory::KnowledgeConnection
        )
    }

    /// A short, user-facing suggestion for recovering from this category.
    pub fn hint(&self) -> &'static str {
        match self {
            ErrorCategory::UrlInvalid | ErrorCategory::UrlParseFailed => {
                "check the URL for typos or an unsupported scheme"
            }
            ErrorCategory::UrlPolicyDenied => "this host or address range is not reachable by policy",
            ErrorCategory::ApiPermissionDenied => "check the configured API key",
            ErrorCategory::ApiQuotaExceeded => "wait for quota to reset or reduce request volume",
            ErrorCategory::ApiInvalidArgument => "the request was malformed; check the tool arguments",
            ErrorCategory::ApiNotFound => "the referenced resource does not exist upstream",
            ErrorCategory::VideoRestricted => "this video is geo- or age-restricted and cannot be analyzed",
            ErrorCategory::VideoPrivate => "this video is private",
            ErrorCategory::VideoUnavailable => "this video is unavailable",
            ErrorCategory::NetworkError => "a transient network failure; retrying may help",
            ErrorCategory::FileNotFound => "check the local file path",
            ErrorCategory::FileUnsupported => "this file type is not supported",
            ErrorCategory::FileTooLarge => "this file exceeds the configured size limit",
            ErrorCategory::KnowledgeConnection => "the knowledge store is unreachable; retrying may help",
            ErrorCategory::KnowledgeSchema => "the knowledge store schema is missing or stale",
            ErrorCategory::KnowledgeQuery => "the knowledge store rejected the query",
            ErrorCategory::KnowledgeImport => "the knowledge store rejected the import",
            ErrorCategory::PermissionDenied => "this operation is not permitted",
            ErrorCategory::Unknown => "an unexpected error occurred",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// The typed error enum raised by components throughout the workspace.
///
/// Variants map one-to-one onto [`ErrorCategory`] except [`ScoutError::Other`],
/// which wraps anything a component could not classify at the point it was
/// raised (e.g. a bare `std::io::Error`); [`categorize`] sniffs those by message.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ScoutError {
    /// See [`ErrorCategory::UrlInvalid`].
    #[error("invalid URL: {0}")]
    UrlInvalid(String),
    /// See [`ErrorCategory::UrlParseFailed`].
    #[error("could not parse URL: {0}")]
    UrlParseFailed(String),
    /// See [`ErrorCategory::UrlPolicyDenied`].
    #[error("URL denied by policy: {0}")]
    UrlPolicyDenied(String),
    /// See [`ErrorCategory::ApiPermissionDenied`].
    #[error("generative backend denied permission: {0}")]
    ApiPermissionDenied(String),
    /// See [`ErrorCategory::ApiQuotaExceeded`].
    #[error("generative backend quota exceeded: {0}")]
    ApiQuotaExceeded(String),
    /// See [`ErrorCategory::ApiInvalidArgument`].
    #[error("generative backend rejected argument: {0}")]
    ApiInvalidArgument(String),
    /// See [`ErrorCategory::ApiNotFound`].
    #[error("generative backend resource not found: {0}")]
    ApiNotFound(String),
    /// See [`ErrorCategory::VideoRestricted`].
    #[error("video is restricted: {0}")]
    VideoRestricted(String),
    /// See [`ErrorCategory::VideoPrivate`].
    #[error("video is private: {0}")]
    VideoPrivate(String),
    /// See [`ErrorCategory::VideoUnavailable`].
    #[error("video is unavailable: {0}")]
    VideoUnavailable(String),
    /// See [`ErrorCategory::NetworkError`].
    #[error("network error: {0}")]
    NetworkError(String),
    /// See [`ErrorCategory::FileNotFound`].
    #[error("file not found: {0}")]
    FileNotFound(String),
    /// See [`ErrorCategory::FileUnsupported`].
    #[error("unsupported file type: {0}")]
    FileUnsupported(String),
    /// See [`ErrorCategory::FileTooLarge`].
    #[error("file too large: {0}")]
    FileTooLarge(String),
    /// See [`ErrorCategory::KnowledgeConnection`].
    #[error("knowledge store unreachable: {0}")]
    KnowledgeConnection(String),
    /// See [`ErrorCategory::KnowledgeSchema`].
    #[error("knowledge store schema error: {0}")]
    KnowledgeSchema(String),
    /// See [`ErrorCategory::KnowledgeQuery`].
    #[error("knowledge store query failed: {0}")]
    KnowledgeQuery(String),
    /// See [`ErrorCategory::KnowledgeImport`].
    #[error("knowledge store import failed: {0}")]
    KnowledgeImport(String),
    /// See [`ErrorCategory::PermissionDenied`].
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// Anything not classified at the point it was raised.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ScoutError {
    /// The category this variant belongs to, independent of [`categorize`]'s
    /// message-sniffing fallback for [`ScoutError::Other`].
    pub fn category(&self) -> ErrorCategory {
        match self {
            ScoutError::UrlInvalid(_) => ErrorCategory::UrlInvalid,
            ScoutError::UrlParseFailed(_) => ErrorCategory::UrlParseFailed,
            ScoutError::UrlPolicyDenied(_) => ErrorCategory::UrlPolicyDenied,
            ScoutError::ApiPermissionDenied(_) => ErrorCategory::ApiPermissionDenied,
            ScoutError::ApiQuotaExceeded(_) => ErrorCategory::ApiQuotaExceeded,
            ScoutError::ApiInvalidArgument(_) => ErrorCategory::ApiInvalidArgument,
            ScoutError::ApiNotFound(_) => ErrorCategory::ApiNotFound,
            ScoutError::VideoRestricted(_) => ErrorCategory::VideoRestricted,
            ScoutError::VideoPrivate(_) => ErrorCategory::VideoPrivate,
            ScoutError::VideoUnavailable(_) => ErrorCategory::VideoUnavailable,
            ScoutError::NetworkError(_) => ErrorCategory::NetworkError,
            ScoutError::FileNotFound(_) => ErrorCategory::FileNotFound,
            ScoutError::FileUnsupported(_) => ErrorCategory::FileUnsupported,
            ScoutError::FileTooLarge(_) => ErrorCategory::FileTooLarge,
            ScoutError::KnowledgeConnection(_) => ErrorCategory::KnowledgeConnection,
            ScoutError::KnowledgeSchema(_) => ErrorCategory::KnowledgeSchema,
            ScoutError::KnowledgeQuery(_) => ErrorCategory::KnowledgeQuery,
            ScoutError::KnowledgeImport(_) => ErrorCategory::KnowledgeImport,
            ScoutError::PermissionDenied(_) => ErrorCategory::PermissionDenied,
            ScoutError::Other(_) => sniff_message(&self.to_string()),
        }
    }
}

/// Classify any error, typed or not, by variant first and message second.
///
/// Components that already raise [`ScoutError`] get an exact category via
/// [`ScoutError::category`]. Errors crossing in from a dependency (reqwest,
/// an HTTP status body, …) are sniffed by substring against their `Display`
/// output, the same layered approach `map_http_status` in the anthropic
/// provider uses for typed-status-then-body matching.
pub fn categorize(err: &(dyn std::error::Error + 'static)) -> ErrorCategory {
    if let Some(scout_err) = err.downcast_ref::<ScoutError>() {
        return scout_err.category();
    }
    sniff_message(&err.to_string())
}

fn sniff_message(message: &str) -> ErrorCategory {
    let lower = message.to_lowercase();
    if lower.contains("permission") && lower.contains("denied") {
        ErrorCategory::ApiPermissionDenied
    } else if lower.contains("quota") || lower.contains("rate limit") || lower.contains("429") {
        ErrorCategory::ApiQuotaExceeded
    } else if lower.contains("private") {
        ErrorCategory::VideoPrivate
    } else if lower.contains("restrict") {
        ErrorCategory::VideoRestricted
    } else if lower.contains("unavailable") {
        ErrorCategory::VideoUnavailable
    } else if lower.contains("not found") || lower.contains("404") {
        ErrorCategory::ApiNotFound
    } else if lower.contains("connect") || lower.contains("timed out") || lower.contains("timeout") {
        ErrorCategory::NetworkError
    } else {
        ErrorCategory::Unknown
    }
}

/// The `{error, category, hint, retryable, retry_after_seconds}` shape every
/// failed tool call reports, per §3 of the specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolErrorEnvelope {
    /// A human-readable description of what failed.
    pub error: String,
    /// The wire code from [`ErrorCategory::code`].
    pub category: String,
    /// A short suggestion for recovering.
    pub hint: String,
    /// Whether the caller should retry.
    pub retryable: bool,
    /// Suggested backoff before retrying, if `retryable`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,
}

/// Build the tool-facing error envelope for any error. The sole sink every
/// handler in `scout-tools` calls before returning a failed `CallToolResult`.
pub fn make_tool_error(err: &(dyn std::error::Error + 'static)) -> ToolErrorEnvelope {
    let category = categorize(err);
    ToolErrorEnvelope {
        error: err.to_string(),
        category: category.code().to_string(),
        hint: category.hint().to_string(),
        retryable: category.is_retryable(),
        retry_after_seconds: if category.is_retryable() { Some(2) } else { None },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scout_error_category_matches_variant() {
        let err = ScoutError::UrlPolicyDenied("10.0.0.1".into());
        assert_eq!(err.category(), ErrorCategory::UrlPolicyDenied);
        assert_eq!(err.category().code(), "URL_POLICY_DENIED");
    }

    #[test]
    fn categorize_downcasts_scout_error() {
        let err: Box<dyn std::error::Error> = Box::new(ScoutError::FileTooLarge("12MB".into()));
        assert_eq!(categorize(err.as_ref()), ErrorCategory::FileTooLarge);
    }

    #[test]
    fn categorize_sniffs_plain_error_message() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "request failed: 429 rate limit exceeded");
        assert_eq!(categorize(&err), ErrorCategory::ApiQuotaExceeded);
    }

    #[test]
    fn categorize_falls_back_to_unknown() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "something went sideways");
        assert_eq!(categorize(&err), ErrorCategory::Unknown);
    }

    #[test]
    fn make_tool_error_marks_network_errors_retryable() {
        let err = ScoutError::NetworkError("connection reset".into());
        let envelope = make_tool_error(&err);
        assert_eq!(envelope.category, "NETWORK_ERROR");
        assert!(envelope.retryable);
        assert_eq!(envelope.retry_after_seconds, Some(2));
    }

    #[test]
    fn make_tool_error_marks_permission_denied_not_retryable() {
        let err = ScoutError::PermissionDenied("no access".into());
        let envelope = make_tool_error(&err);
        assert!(!envelope.retryable);
        assert!(envelope.retry_after_seconds.is_none());
    }

    #[test]
    fn envelope_serializes_without_retry_after_when_absent() {
        let envelope = make_tool_error(&ScoutError::FileNotFound("x".into()));
        let json = serde_json::to_value(&envelope).unwrap();
        assert!(json.get("retry_after_seconds").is_none());
    }
}
