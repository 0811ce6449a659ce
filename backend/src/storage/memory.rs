//! In-memory storage backends for tests and headless runs.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::traits::{KeyValueStorage, RemoteProfileStorage, RemoteStoreError};

/// Key/value store held in a map. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryKeyValueStore {
    values: Arc<Mutex<BTreeMap<String, String>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following write fail, to simulate a full or broken disk
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn values(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))
    }
}

#[async_trait]
impl KeyValueStorage for MemoryKeyValueStore {
    async fn get_value(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values()?.get(key).cloned())
    }

    async fn put_value(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("write to {} rejected", key);
        }
        self.values()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete_value(&self, key: &str) -> Result<bool> {
        Ok(self.values()?.remove(key).is_some())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.values()?.keys().cloned().collect())
    }
}

/// Remote profile store held in memory. Counts uploads and can be told to
/// fail reads or writes.
#[derive(Clone, Default)]
pub struct InMemoryProfileStore {
    profiles: Arc<Mutex<HashMap<String, Value>>>,
    upserts: Arc<AtomicUsize>,
    fail_fetch: Arc<AtomicBool>,
    fail_upsert: Arc<AtomicBool>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(profile_id: &str, document: Value) -> Self {
        let store = Self::new();
        if let Ok(mut profiles) = store.profiles.lock() {
            profiles.insert(profile_id.to_string(), document);
        }
        store
    }

    /// Document currently stored for a profile
    pub fn profile(&self, profile_id: &str) -> Option<Value> {
        self.profiles
            .lock()
            .ok()
            .and_then(|profiles| profiles.get(profile_id).cloned())
    }

    /// Number of successful upserts so far
    pub fn upsert_count(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn fail_upsert(&self, fail: bool) {
        self.fail_upsert.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl RemoteProfileStorage for InMemoryProfileStore {
    async fn fetch_profile(&self, profile_id: &str) -> Result<Option<Value>, RemoteStoreError> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(RemoteStoreError::Transport("simulated network failure".to_string()));
        }
        Ok(self.profile(profile_id))
    }

    async fn upsert_profile(
        &self,
        profile_id: &str,
        document: &Value,
    ) -> Result<(), RemoteStoreError> {
        if self.fail_upsert.load(Ordering::SeqCst) {
            return Err(RemoteStoreError::Status {
                status: 503,
                body: "simulated outage".to_string(),
            });
        }
        self.profiles
            .lock()
            .map_err(|_| RemoteStoreError::Transport("profile store lock poisoned".to_string()))?
            .insert(profile_id.to_string(), document.clone());
        self.upserts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
