//! The file-backed analysis cache. Writes are atomic: serialize to a unique
//! sibling temp file, then rename over the target — a reader never observes
//! a partially-written entry.

use crate::entry::CacheEntry;
use crate::key::cache_key;
use chrono::Utc;
use scout_errors::ScoutError;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Aggregate counters returned by [`AnalysisCache::stats`].
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct CacheStats {
    /// Number of entry files currently on disk (including expired ones).
    pub entry_count: usize,
    /// Total size, in bytes, of all entry files.
    pub total_bytes: u64,
}

/// A file-keyed JSON cache of tool outputs under `cache_dir`.
#[derive(Debug, Clone)]
pub struct AnalysisCache {
    dir: PathBuf,
    ttl_days: u32,
}

impl AnalysisCache {
    /// Open a cache rooted at `dir`. The directory is created if absent.
    pub async fn new(dir: impl Into<PathBuf>, ttl_days: u32) -> Result<Self, ScoutError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| ScoutError::Other(Box::new(e)))?;
        Ok(AnalysisCache { dir, ttl_days })
    }

    fn path_for(&self, content_id: &str, tool: &str, instruction: Option<&str>, model: &str) -> PathBuf {
        self.dir.join(cache_key(content_id, tool, instruction, model))
    }

    /// Write an entry atomically: a unique temp file in the same directory,
    /// then an in-place rename.
    pub async fn save(
        &self,
        content_id: &str,
        tool: &str,
        instruction: Option<&str>,
        model: &str,
        analysis: serde_json::Value,
    ) -> Result<(), ScoutError> {
        let entry = CacheEntry {
            cached_at: Utc::now(),
            content_id: content_id.to_string(),
            tool: tool.to_string(),
            model: model.to_string(),
            analysis,
        };
        let target = self.path_for(content_id, tool, instruction, model);
        let dir = self.dir.clone();

        tokio::task::spawn_blocking(move || write_atomic(&dir, &target, &entry))
            .await
            .map_err(|e| ScoutError::Other(Box::new(e)))??;
        Ok(())
    }

    /// Load an entry, treating one older than `cache_ttl_days` as absent.
    pub async fn load(
        &self,
        content_id: &str,
        tool: &str,
        instruction: Option<&str>,
        model: &str,
    ) -> Result<Option<CacheEntry>, ScoutError> {
        let path = self.path_for(content_id, tool, instruction, model);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let entry: CacheEntry = serde_json::from_slice(&bytes).map_err(|e| ScoutError::Other(Box::new(e)))?;
                if entry.is_expired(self.ttl_days, Utc::now()) {
                    Ok(None)
                } else {
                    Ok(Some(entry))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ScoutError::Other(Box::new(e))),
        }
    }

    /// List every non-expired entry currently on disk.
    pub async fn list_entries(&self) -> Result<Vec<CacheEntry>, ScoutError> {
        let mut out = Vec::new();
        let mut read_dir = tokio::fs::read_dir(&self.dir).await.map_err(|e| ScoutError::Other(Box::new(e)))?;
        while let Some(file) = read_dir.next_entry().await.map_err(|e| ScoutError::Other(Box::new(e)))? {
            let path = file.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match tokio::fs::read(&path).await {
                Ok(bytes) => match serde_json::from_slice::<CacheEntry>(&bytes) {
                    Ok(entry) if !entry.is_expired(self.ttl_days, Utc::now()) => out.push(entry),
                    Ok(_) => {}
                    Err(e) => warn!(path = %path.display(), error = %e, "list_entries: skipping unreadable cache file"),
                },
                Err(e) => warn!(path = %path.display(), error = %e, "list_entries: skipping unreadable cache file"),
            }
        }
        Ok(out)
    }

    /// Delete entries. If `content_id` is given, only entries for that
    /// content are removed; otherwise the entire cache is cleared. Returns
    /// the number of files removed.
    pub async fn clear(&self, content_id: Option<&str>) -> Result<usize, ScoutError> {
        let mut removed = 0;
        let mut read_dir = tokio::fs::read_dir(&self.dir).await.map_err(|e| ScoutError::Other(Box::new(e)))?;
        while let Some(file) = read_dir.next_entry().await.map_err(|e| ScoutError::Other(Box::new(e)))? {
            let path = file.path();
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            let matches = match content_id {
                Some(id) => name.starts_with(&format!("{id}_")),
                None => true,
            };
            if matches && tokio::fs::remove_file(&path).await.is_ok() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Aggregate size/count statistics over every file on disk (expired or not).
    pub async fn stats(&self) -> Result<CacheStats, ScoutError> {
        let mut stats = CacheStats::default();
        let mut read_dir = tokio::fs::read_dir(&self.dir).await.map_err(|e| ScoutError::Other(Box::new(e)))?;
        while let Some(file) = read_dir.next_entry().await.map_err(|e| ScoutError::Other(Box::new(e)))? {
            if let Ok(metadata) = file.metadata().await {
                if metadata.is_file() {
                    stats.entry_count += 1;
                    stats.total_bytes += metadata.len();
                }
            }
        }
        Ok(stats)
    }
}

fn write_atomic(dir: &Path, target: &Path, entry: &CacheEntry) -> Result<(), ScoutError> {
    let bytes = serde_json::to_vec_pretty(entry).map_err(|e| ScoutError::Other(Box::new(e)))?;
    let mut temp = tempfile::Builder::new()
        .prefix(".scout-cache-")
        .tempfile_in(dir)
        .map_err(|e| ScoutError::Other(Box::new(e)))?;
    std::io::Write::write_all(&mut temp, &bytes).map_err(|e| ScoutError::Other(Box::new(e)))?;
    temp.persist(target).map_err(|e| ScoutError::Other(Box::new(e.error)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AnalysisCache::new(dir.path(), 30).await.unwrap();
        cache
            .save("vid1", "video_analyze", Some("summarize"), "scout-pro-2", serde_json::json!({"a": 1}))
            .await
            .unwrap();

        let entry = cache.load("vid1", "video_analyze", Some("summarize"), "scout-pro-2").await.unwrap().unwrap();
        assert_eq!(entry.content_id, "vid1");
        assert_eq!(entry.analysis, serde_json::json!({"a": 1}));
    }

    #[tokio::test]
    async fn load_returns_none_for_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AnalysisCache::new(dir.path(), 30).await.unwrap();
        assert!(cache.load("nope", "video_analyze", None, "scout-pro-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_entry_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AnalysisCache::new(dir.path(), 0).await.unwrap();
        cache.save("vid1", "video_analyze", None, "scout-pro-2", serde_json::json!({})).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert!(cache.load("vid1", "video_analyze", None, "scout-pro-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_with_content_id_only_removes_matching_entries() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AnalysisCache::new(dir.path(), 30).await.unwrap();
        cache.save("vid1", "video_analyze", None, "scout-pro-2", serde_json::json!({})).await.unwrap();
        cache.save("vid2", "video_analyze", None, "scout-pro-2", serde_json::json!({})).await.unwrap();

        let removed = cache.clear(Some("vid1")).await.unwrap();
        assert_eq!(removed, 1);
        assert!(cache.load("vid1", "video_analyze", None, "scout-pro-2").await.unwrap().is_none());
        assert!(cache.load("vid2", "video_analyze", None, "scout-pro-2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn stats_counts_files_and_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AnalysisCache::new(dir.path(), 30).await.unwrap();
        cache.save("vid1", "video_analyze", None, "scout-pro-2", serde_json::json!({"k": "v"})).await.unwrap();

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.entry_count, 1);
        assert!(stats.total_bytes > 0);
    }

    #[tokio::test]
    async fn list_entries_skips_expired() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AnalysisCache::new(dir.path(), 0).await.unwrap();
        cache.save("vid1", "video_analyze", None, "scout-pro-2", serde_json::json!({})).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert!(cache.list_entries().await.unwrap().is_empty());
    }
}
