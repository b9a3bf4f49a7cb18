//! A process-wide singleton pool of [`GenerativeClient`]s, keyed by API key.
//!
//! Most deployments only ever populate one entry (the configured
//! `api_key`), but the pool shape lets `infra_configure` rotate keys at
//! runtime without leaking the old client's connection pool.

use crate::client::GenerativeClient;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Lazily-constructed, API-key-keyed pool of generative clients.
#[derive(Default)]
pub struct GenerativeClientPool {
    clients: RwLock<HashMap<String, Arc<GenerativeClient>>>,
}

impl GenerativeClientPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        GenerativeClientPool::default()
    }

    /// Return the client for `api_key`, constructing and caching one via
    /// `build` if it doesn't exist yet.
    pub fn get_or_create(&self, api_key: &str, build: impl FnOnce() -> GenerativeClient) -> Arc<GenerativeClient> {
        if let Some(client) = self.clients.read().unwrap().get(api_key) {
            return client.clone();
        }
        let mut clients = self.clients.write().unwrap();
        clients.entry(api_key.to_string()).or_insert_with(|| Arc::new(build())).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn get_or_create_builds_once_per_key() {
        let pool = GenerativeClientPool::new();
        let builds = AtomicU32::new(0);

        let a = pool.get_or_create("key-1", || {
            builds.fetch_add(1, Ordering::SeqCst);
            GenerativeClient::new("key-1")
        });
        let b = pool.get_or_create("key-1", || {
            builds.fetch_add(1, Ordering::SeqCst);
            GenerativeClient::new("key-1")
        });

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn distinct_keys_get_distinct_clients() {
        let pool = GenerativeClientPool::new();
        let a = pool.get_or_create("key-1", || GenerativeClient::new("key-1"));
        let b = pool.get_or_create("key-2", || GenerativeClient::new("key-2"));
        assert!(!Arc::ptr_eq(&a, &b));
    }
}
