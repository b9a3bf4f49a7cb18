//! In-memory registry of backend-side context caches, persisted to a single
//! JSON file so a restart does not forget which `(content_id, model)` pairs
//! already have a live backend cache.

use scout_errors::ScoutError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tracing::warn;

type Key = (String, String);

/// The state of one `(content_id, model)` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheState {
    /// A prewarm is currently running for this key.
    Prewarming,
    /// A live backend cache exists under this name.
    Registered {
        /// The backend-assigned cache name.
        name: String,
    },
    /// A prior attempt failed (e.g. too small to cache); recorded so
    /// subsequent calls don't retry uselessly within the same process run.
    Suppressed {
        /// Why prewarming was skipped or failed.
        reason: String,
    },
    /// A TTL refresh failed; the entry may no longer be valid backend-side.
    Stale {
        /// The backend-assigned cache name, kept for diagnostics.
        name: String,
    },
}

/// The result of [`ContextCacheRegistry::lookup_or_await`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// A live backend cache name is available.
    Registered(String),
    /// No cache is registered, and none is in flight.
    Uncached,
    /// A prior attempt was suppressed.
    Suppressed(String),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct DiskState(HashMap<String, HashMap<String, String>>);

/// Registry of backend-side reusable generative context caches.
pub struct ContextCacheRegistry {
    path: PathBuf,
    state: Mutex<HashMap<Key, CacheState>>,
    waiters: Mutex<HashMap<Key, Arc<Notify>>>,
}

impl ContextCacheRegistry {
    /// Load the registry from `path`, ignoring any entry that fails the
    /// nested-string shape check rather than failing the whole load.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, ScoutError> {
        let path = path.into();
        let mut state = HashMap::new();

        match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<serde_json::Value>(&bytes) {
                Ok(serde_json::Value::Object(top)) => {
                    for (content_id, models) in top {
                        let serde_json::Value::Object(models) = models else {
                            warn!(content_id, "context-cache: skipping malformed entry");
                            continue;
                        };
                        for (model, name) in models {
                            if let serde_json::Value::String(name) = name {
                                state.insert((content_id.clone(), model), CacheState::Registered { name });
                            } else {
                                warn!(content_id, model, "context-cache: skipping non-string cache name");
                            }
                        }
                    }
                }
                Ok(_) => warn!("context-cache: disk state root was not an object, starting empty"),
                Err(e) => warn!(error = %e, "context-cache: disk state unreadable, starting empty"),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(ScoutError::Other(Box::new(e))),
        }

        Ok(ContextCacheRegistry { path, state: Mutex::new(state), waiters: Mutex::new(HashMap::new()) })
    }

    /// Schedule background creation of a backend cache. Idempotent: a
    /// second concurrent call for the same key observes the first call's
    /// prewarm in flight instead of starting a duplicate.
    ///
    /// `create` is the backend-specific cache-creation call, supplied by the
    /// caller (the generative client) to avoid a dependency cycle.
    pub async fn start_prewarm<F, Fut>(self: &Arc<Self>, content_id: &str, model: &str, create: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<String, ScoutError>> + Send + 'static,
    {
        let key = (content_id.to_string(), model.to_string());
        {
            let mut state = self.state.lock().await;
            if matches!(state.get(&key), Some(CacheState::Registered { .. }) | Some(CacheState::Prewarming)) {
                return;
            }
            state.insert(key.clone(), CacheState::Prewarming);
        }
        let notify = {
            let mut waiters = self.waiters.lock().await;
            waiters.entry(key.clone()).or_insert_with(|| Arc::new(Notify::new())).clone()
        };

        let this = self.clone();
        tokio::spawn(async move {
            let result = create().await;
            let mut state = this.state.lock().await;
            match result {
                Ok(name) => {
                    state.insert(key.clone(), CacheState::Registered { name });
                }
                Err(e) => {
                    warn!(error = %e, "context-cache: prewarm failed");
                    state.insert(key.clone(), CacheState::Suppressed { reason: e.to_string() });
                }
            }
            drop(state);
            if let Err(e) = this.persist().await {
                warn!(error = %e, "context-cache: failed to persist after prewarm");
            }
            notify.notify_waiters();
        });
    }

    /// Return the cache name if registered; if a prewarm is in flight, wait
    /// up to `timeout` for it to resolve; otherwise report `Uncached`.
    pub async fn lookup_or_await(&self, content_id: &str, model: &str, timeout: Duration) -> CacheLookup {
        let key = (content_id.to_string(), model.to_string());
        if let Some(result) = self.snapshot(&key).await {
            return result;
        }

        let notify = {
            let waiters = self.waiters.lock().await;
            waiters.get(&key).cloned()
        };
        if let Some(notify) = notify {
            let _ = tokio::time::timeout(timeout, notify.notified()).await;
        }

        self.snapshot(&key).await.unwrap_or(CacheLookup::Uncached)
    }

    async fn snapshot(&self, key: &Key) -> Option<CacheLookup> {
        match self.state.lock().await.get(key) {
            Some(CacheState::Registered { name }) => Some(CacheLookup::Registered(name.clone())),
            Some(CacheState::Suppressed { reason }) => Some(CacheLookup::Suppressed(reason.clone())),
            Some(CacheState::Stale { .. }) | Some(CacheState::Prewarming) | None => None,
        }
    }

    /// Bump a backend cache's expiration via `refresh`. On failure, the
    /// entry for `cache_name` is marked stale rather than removed.
    pub async fn refresh_ttl<F, Fut>(&self, content_id: &str, model: &str, refresh: F) -> Result<(), ScoutError>
    where
        F: FnOnce(&str) -> Fut,
        Fut: Future<Output = Result<(), ScoutError>>,
    {
        let key = (content_id.to_string(), model.to_string());
        let name = {
            let state = self.state.lock().await;
            match state.get(&key) {
                Some(CacheState::Registered { name }) | Some(CacheState::Stale { name }) => name.clone(),
                _ => return Ok(()),
            }
        };

        match refresh(&name).await {
            Ok(()) => Ok(()),
            Err(e) => {
                let mut state = self.state.lock().await;
                state.insert(key, CacheState::Stale { name });
                Err(e)
            }
        }
    }

    /// Delete every remote cache (best-effort, via `delete_remote`) and clear
    /// both in-memory maps and the on-disk registry.
    pub async fn clear<F, Fut>(&self, delete_remote: F) -> Result<(), ScoutError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = ()>,
    {
        let names: Vec<String> = {
            let state = self.state.lock().await;
            state
                .values()
                .filter_map(|s| match s {
                    CacheState::Registered { name } | CacheState::Stale { name } => Some(name.clone()),
                    _ => None,
                })
                .collect()
        };
        for name in names {
            delete_remote(name).await;
        }

        self.state.lock().await.clear();
        self.waiters.lock().await.clear();
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ScoutError::Other(Box::new(e))),
        }
    }

    async fn persist(&self) -> Result<(), ScoutError> {
        let mut disk = DiskState::default();
        for ((content_id, model), state) in self.state.lock().await.iter() {
            if let CacheState::Registered { name } | CacheState::Stale { name } = state {
                disk.0.entry(content_id.clone()).or_default().insert(model.clone(), name.clone());
            }
        }

        let bytes = serde_json::to_vec_pretty(&disk).map_err(|e| ScoutError::Other(Box::new(e)))?;
        let dir = self.path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&dir, &path, &bytes))
            .await
            .map_err(|e| ScoutError::Other(Box::new(e)))??;
        Ok(())
    }
}

fn write_atomic(dir: &Path, target: &Path, bytes: &[u8]) -> Result<(), ScoutError> {
    std::fs::create_dir_all(dir).map_err(|e| ScoutError::Other(Box::new(e)))?;
    let mut temp = tempfile::Builder::new()
        .prefix(".scout-context-cache-")
        .tempfile_in(dir)
        .map_err(|e| ScoutError::Other(Box::new(e)))?;
    std::io::Write::write_all(&mut temp, bytes).map_err(|e| ScoutError::Other(Box::new(e)))?;
    temp.persist(target).map_err(|e| ScoutError::Other(Box::new(e.error)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn prewarm_then_lookup_returns_registered_name() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(ContextCacheRegistry::load(dir.path().join("registry.json")).await.unwrap());

        registry
            .start_prewarm("vid1", "scout-pro-2", || async { Ok("backend-cache-1".to_string()) })
            .await;
        let result = registry.lookup_or_await("vid1", "scout-pro-2", Duration::from_secs(1)).await;
        assert_eq!(result, CacheLookup::Registered("backend-cache-1".to_string()));
    }

    #[tokio::test]
    async fn concurrent_prewarm_calls_share_one_create() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(ContextCacheRegistry::load(dir.path().join("registry.json")).await.unwrap());
        let calls = Arc::new(std::sync::atomic::AtomicU32::new(0));

        for _ in 0..3 {
            let calls = calls.clone();
            registry
                .start_prewarm("vid1", "scout-pro-2", move || async move {
                    calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    Ok("name".to_string())
                })
                .await;
        }
        registry.lookup_or_await("vid1", "scout-pro-2", Duration::from_secs(1)).await;
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn uncached_key_returns_uncached() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ContextCacheRegistry::load(dir.path().join("registry.json")).await.unwrap();
        let result = registry.lookup_or_await("nope", "scout-pro-2", Duration::from_millis(10)).await;
        assert_eq!(result, CacheLookup::Uncached);
    }

    #[tokio::test]
    async fn failed_prewarm_is_suppressed() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(ContextCacheRegistry::load(dir.path().join("registry.json")).await.unwrap());
        registry
            .start_prewarm("vid1", "scout-pro-2", || async {
                Err(ScoutError::ApiInvalidArgument("too small to cache".into()))
            })
            .await;
        let result = registry.lookup_or_await("vid1", "scout-pro-2", Duration::from_secs(1)).await;
        assert!(matches!(result, CacheLookup::Suppressed(_)));
    }

    #[tokio::test]
    async fn registry_persists_and_reloads_registered_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        let registry = Arc::new(ContextCacheRegistry::load(&path).await.unwrap());
        registry.start_prewarm("vid1", "scout-pro-2", || async { Ok("name-1".to_string()) }).await;
        registry.lookup_or_await("vid1", "scout-pro-2", Duration::from_secs(1)).await;

        let reloaded = ContextCacheRegistry::load(&path).await.unwrap();
        let result = reloaded.lookup_or_await("vid1", "scout-pro-2", Duration::from_millis(10)).await;
        assert_eq!(result, CacheLookup::Registered("name-1".to_string()));
    }

    #[tokio::test]
    async fn clear_removes_disk_state_and_in_memory_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        let registry = Arc::new(ContextCacheRegistry::load(&path).await.unwrap());
        registry.start_prewarm("vid1", "scout-pro-2", || async { Ok("name-1".to_string()) }).await;
        registry.lookup_or_await("vid1", "scout-pro-2", Duration::from_secs(1)).await;

        let deleted = Arc::new(std::sync::atomic::AtomicU32::new(0));
        let deleted2 = deleted.clone();
        registry
            .clear(move |_name| {
                let deleted = deleted2.clone();
                async move {
                    deleted.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                }
            })
            .await
            .unwrap();

        assert_eq!(deleted.load(std::sync::atomic::Ordering::SeqCst), 1);
        let result = registry.lookup_or_await("vid1", "scout-pro-2", Duration::from_millis(10)).await;
        assert_eq!(result, CacheLookup::Uncached);
    }
}
