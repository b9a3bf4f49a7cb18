//! Atomic runtime snapshot swapping, mirroring the read-mostly / atomic
//! pointer-swap pattern the specification calls for in §4.1.

use crate::config::Config;
use arc_swap::ArcSwap;
use scout_errors::ScoutError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A partial set of overrides for [`ConfigHandle::update`].
///
/// Every field is optional; unset fields leave the current snapshot's value
/// untouched. The merged snapshot is validated before it is published.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ConfigOverrides {
    /// See [`Config::default_model`].
    pub default_model: Option<String>,
    /// See [`Config::flash_model`].
    pub flash_model: Option<String>,
    /// See [`Config::default_temperature`].
    pub default_temperature: Option<f64>,
    /// See [`Config::cache_ttl_days`].
    pub cache_ttl_days: Option<u32>,
    /// See [`Config::max_sessions`].
    pub max_sessions: Option<usize>,
    /// See [`Config::session_timeout_hours`].
    pub session_timeout_hours: Option<u32>,
    /// See [`Config::retry_max_attempts`].
    pub retry_max_attempts: Option<u32>,
    /// See [`Config::reranker_enabled`].
    pub reranker_enabled: Option<bool>,
    /// See [`Config::flash_summarize`].
    pub flash_summarize: Option<bool>,
    /// See [`Config::tracing_enabled`].
    pub tracing_enabled: Option<bool>,
    /// See [`Config::clear_cache_on_shutdown`].
    pub clear_cache_on_shutdown: Option<bool>,
}

impl ConfigOverrides {
    fn apply(&self, base: &Config) -> Config {
        let mut next = base.clone();
        if let Some(v) = &self.default_model {
            next.default_model = v.clone();
        }
        if let Some(v) = &self.flash_model {
            next.flash_model = v.clone();
        }
        if let Some(v) = self.default_temperature {
            next.default_temperature = v;
        }
        if let Some(v) = self.cache_ttl_days {
            next.cache_ttl_days = v;
        }
        if let Some(v) = self.max_sessions {
            next.max_sessions = v;
        }
        if let Some(v) = self.session_timeout_hours {
            next.session_timeout_hours = v;
        }
        if let Some(v) = self.retry_max_attempts {
            next.retry_max_attempts = v;
        }
        if let Some(v) = self.reranker_enabled {
            next.reranker_enabled = v;
        }
        if let Some(v) = self.flash_summarize {
            next.flash_summarize = v;
        }
        if let Some(v) = self.tracing_enabled {
            next.tracing_enabled = v;
        }
        if let Some(v) = self.clear_cache_on_shutdown {
            next.clear_cache_on_shutdown = v;
        }
        next
    }
}

/// A shared, atomically-swappable [`Config`] snapshot.
///
/// Reads never block a concurrent write and vice versa: `get()` is an
/// `Arc` clone off the current pointer, `update()` publishes a brand-new
/// `Arc` after validating the merged snapshot.
#[derive(Debug)]
pub struct ConfigHandle {
    inner: ArcSwap<Config>,
}

impl ConfigHandle {
    /// Wrap an initial snapshot.
    pub fn new(config: Config) -> Self {
        Self { inner: ArcSwap::from_pointee(config) }
    }

    /// The current snapshot. Cheap: an `Arc` clone, no lock.
    pub fn get(&self) -> Arc<Config> {
        self.inner.load_full()
    }

    /// Merge `overrides` onto the current snapshot, validate, and publish it.
    ///
    /// Fails with [`ScoutError::PermissionDenied`] unless `infra_mutations_enabled`
    /// is set on the *current* snapshot, and — if the current snapshot carries
    /// an admin token — unless `admin_token` matches it.
    pub fn update(&self, overrides: ConfigOverrides, admin_token: Option<&str>) -> Result<Arc<Config>, ScoutError> {
        let current = self.get();
        if !current.infra_mutations_enabled {
            return Err(ScoutError::PermissionDenied(
                "infra_mutations_enabled is false; runtime config patching is disabled".to_string(),
            ));
        }
        if let Some(expected) = &current.infra_admin_token {
            if admin_token != Some(expected.expose()) {
                return Err(ScoutError::PermissionDenied("admin token mismatch".to_string()));
            }
        }

        let merged = overrides.apply(&current);
        merged.validate()?;
        let next = Arc::new(merged);
        self.inner.store(next.clone());
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled_config() -> Config {
        let mut config = Config::default();
        config.infra_mutations_enabled = true;
        config
    }

    #[test]
    fn update_rejects_when_mutations_disabled() {
        let handle = ConfigHandle::new(Config::default());
        let err = handle.update(ConfigOverrides::default(), None).unwrap_err();
        assert!(matches!(err, ScoutError::PermissionDenied(_)));
    }

    #[test]
    fn update_rejects_admin_token_mismatch() {
        let mut config = enabled_config();
        config.infra_admin_token = Some(crate::redacted::Redacted::new("correct-token"));
        let handle = ConfigHandle::new(config);
        let err = handle.update(ConfigOverrides::default(), Some("wrong-token")).unwrap_err();
        assert!(matches!(err, ScoutError::PermissionDenied(_)));
    }

    #[test]
    fn update_publishes_validated_merge() {
        let handle = ConfigHandle::new(enabled_config());
        let overrides = ConfigOverrides { max_sessions: Some(10), ..Default::default() };
        let published = handle.update(overrides, None).unwrap();
        assert_eq!(published.max_sessions, 10);
        assert_eq!(handle.get().max_sessions, 10);
    }

    #[test]
    fn update_rejects_invalid_merge_without_publishing() {
        let handle = ConfigHandle::new(enabled_config());
        let before = handle.get().max_sessions;
        let overrides = ConfigOverrides { max_sessions: Some(0), ..Default::default() };
        assert!(handle.update(overrides, None).is_err());
        assert_eq!(handle.get().max_sessions, before);
    }
}
