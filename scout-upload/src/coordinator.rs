//! Inline-vs-upload decision, content-hash deduplication, and ACTIVE polling.

use crate::handle::{ContentRef, UploadBackend, UploadHandle, UploadState};
use scout_errors::ScoutError;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// How long to wait, and how many times to poll, before giving up on a
/// backend reaching `Active`.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    /// Maximum number of status polls before giving up.
    pub max_polls: u32,
    /// Delay between polls.
    pub poll_interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { max_polls: 30, poll_interval: Duration::from_secs(2) }
    }
}

/// Coordinates file uploads: files at or under `inline_threshold` bytes are
/// inlined directly; larger files are uploaded once per content hash and
/// shared across concurrent callers.
pub struct UploadCoordinator {
    backend: Arc<dyn UploadBackend>,
    inline_threshold: u64,
    poll_config: PollConfig,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    cache: Mutex<HashMap<String, UploadHandle>>,
}

impl UploadCoordinator {
    /// Build a coordinator around a backend, with the §4.11 inline threshold
    /// (bytes at or under this size are never uploaded).
    pub fn new(backend: Arc<dyn UploadBackend>, inline_threshold: u64) -> Self {
        Self {
            backend,
            inline_threshold,
            poll_config: PollConfig::default(),
            locks: Mutex::new(HashMap::new()),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Override the default poll cadence (mainly for tests).
    pub fn poll_config(mut self, poll_config: PollConfig) -> Self {
        self.poll_config = poll_config;
        self
    }

    /// Resolve bytes into a [`ContentRef`], inlining small files and
    /// deduplicating uploads of larger ones by content hash.
    pub async fn prepare(&self, bytes: Vec<u8>, mime_type: &str) -> Result<ContentRef, ScoutError> {
        if bytes.len() as u64 <= self.inline_threshold {
            return Ok(ContentRef::Inline { bytes, mime_type: mime_type.to_string() });
        }

        let hash = blake3::hash(&bytes).to_hex().to_string();
        let lock = self.lock_for(&hash).await;
        let _guard = lock.lock().await;

        if let Some(handle) = self.cache.lock().await.get(&hash).cloned() {
            if !handle.is_expired(chrono::Utc::now()) {
                return Ok(ContentRef::Uploaded(handle));
            }
        }

        let handle = self.backend.upload(&bytes, mime_type).await?;
        let handle = self.await_active(handle).await?;
        self.cache.lock().await.insert(hash, handle.clone());
        Ok(ContentRef::Uploaded(handle))
    }

    async fn lock_for(&self, hash: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(hash.to_string()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    async fn await_active(&self, handle: UploadHandle) -> Result<UploadHandle, ScoutError> {
        for attempt in 0..self.poll_config.max_polls {
            match self.backend.poll_status(&handle.uri).await? {
                UploadState::Active => return Ok(handle),
                UploadState::Failed(reason) => {
                    return Err(ScoutError::ApiInvalidArgument(format!("upload {} failed: {reason}", handle.uri)))
                }
                UploadState::Processing => {
                    tracing::debug!(uri = %handle.uri, attempt, "upload still processing");
                    tokio::time::sleep(self.poll_config.poll_interval).await;
                }
            }
        }
        Err(ScoutError::NetworkError(format!("upload {} did not become active in time", handle.uri)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeBackend {
        uploads: AtomicUsize,
        polls: AtomicUsize,
        polls_until_active: u32,
    }

    #[async_trait::async_trait]
    impl UploadBackend for FakeBackend {
        async fn upload(&self, bytes: &[u8], mime_type: &str) -> Result<UploadHandle, ScoutError> {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            Ok(UploadHandle {
                uri: format!("upload://{}", blake3::hash(bytes).to_hex()),
                mime_type: mime_type.to_string(),
                expires_at: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        }

        async fn poll_status(&self, _uri: &str) -> Result<UploadState, ScoutError> {
            let n = self.polls.fetch_add(1, Ordering::SeqCst);
            if n as u32 >= self.polls_until_active {
                Ok(UploadState::Active)
            } else {
                Ok(UploadState::Processing)
            }
        }
    }

    fn coordinator(threshold: u64, polls_until_active: u32) -> UploadCoordinator {
        let backend = Arc::new(FakeBackend { uploads: AtomicUsize::new(0), polls: AtomicUsize::new(0), polls_until_active });
        UploadCoordinator::new(backend, threshold).poll_config(PollConfig { max_polls: 10, poll_interval: Duration::from_millis(1) })
    }

    #[tokio::test]
    async fn small_files_are_inlined() {
        let coord = coordinator(1024, 0);
        let result = coord.prepare(vec![0u8; 10], "video/mp4").await.unwrap();
        assert!(matches!(result, ContentRef::Inline { .. }));
    }

    #[tokio::test]
    async fn large_files_are_uploaded_and_polled_active() {
        let coord = coordinator(1, 0);
        let result = coord.prepare(vec![1u8; 64], "video/mp4").await.unwrap();
        assert!(matches!(result, ContentRef::Uploaded(_)));
    }

    #[tokio::test]
    async fn concurrent_uploads_of_same_bytes_dedupe() {
        let backend = Arc::new(FakeBackend { uploads: AtomicUsize::new(0), polls: AtomicUsize::new(0), polls_until_active: 0 });
        let coord = Arc::new(
            UploadCoordinator::new(backend.clone(), 1)
                .poll_config(PollConfig { max_polls: 10, poll_interval: Duration::from_millis(1) }),
        );
        let bytes = vec![7u8; 64];
        let (a, b) = tokio::join!(coord.prepare(bytes.clone(), "video/mp4"), coord.prepare(bytes.clone(), "video/mp4"));
        a.unwrap();
        b.unwrap();
        assert_eq!(backend.uploads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn polling_times_out_as_network_error() {
        let coord = coordinator(1, 1000);
        let result = coord.prepare(vec![2u8; 64], "video/mp4").await;
        assert!(result.is_err());
    }
}
