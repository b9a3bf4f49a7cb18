//! Upload handles and the backend trait file references are produced from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A backend-assigned reference to previously uploaded content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadHandle {
    /// Backend URI identifying the uploaded file.
    pub uri: String,
    /// MIME type the backend recorded for the upload.
    pub mime_type: String,
    /// When the backend will expire this handle.
    pub expires_at: DateTime<Utc>,
}

impl UploadHandle {
    /// Whether this handle is still usable as of `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// How a piece of content should be referenced in a generative request: small
/// files are inlined, larger ones go through the upload coordinator.
#[derive(Debug, Clone)]
pub enum ContentRef {
    /// Bytes small enough to inline directly into the request.
    Inline {
        /// Raw file bytes.
        bytes: Vec<u8>,
        /// MIME type of the inlined content.
        mime_type: String,
    },
    /// A reference to content already uploaded to the backend.
    Uploaded(UploadHandle),
}

/// The backend's reported processing state for an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadState {
    /// Still being processed upstream.
    Processing,
    /// Ready to be referenced in generation requests.
    Active,
    /// Upstream gave up processing this upload.
    Failed(String),
}

/// The file-upload API a [`crate::coordinator::UploadCoordinator`] drives.
#[async_trait::async_trait]
pub trait UploadBackend: Send + Sync {
    /// Upload raw bytes, returning a handle (not yet necessarily `Active`).
    async fn upload(&self, bytes: &[u8], mime_type: &str) -> Result<UploadHandle, scout_errors::ScoutError>;
    /// Poll the current processing state of a previously uploaded file.
    async fn poll_status(&self, uri: &str) -> Result<UploadState, scout_errors::ScoutError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_expiry_is_inclusive() {
        let now = Utc::now();
        let handle = UploadHandle { uri: "u".into(), mime_type: "video/mp4".into(), expires_at: now };
        assert!(handle.is_expired(now));
        assert!(!handle.is_expired(now - chrono::Duration::seconds(1)));
    }
}
